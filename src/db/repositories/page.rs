//! Legal page repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Page, PageStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn create(&self, page: &Page) -> Result<Page>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Page>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>>;
    async fn list(&self) -> Result<Vec<Page>>;
    async fn list_published(&self) -> Result<Vec<Page>>;
    async fn update(&self, page: &Page) -> Result<Page>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxPageRepository {
    pool: DynDatabasePool,
}

impl SqlxPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn create(&self, page: &Page) -> Result<Page> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), page).await,
            DatabaseDriver::Postgres => create_postgres(self.pool.as_postgres().unwrap(), page).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Postgres => {
                get_by_slug_postgres(self.pool.as_postgres().unwrap(), slug).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), false).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), false).await,
        }
    }

    async fn list_published(&self) -> Result<Vec<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), true).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), true).await,
        }
    }

    async fn update(&self, page: &Page) -> Result<Page> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), page).await,
            DatabaseDriver::Postgres => update_postgres(self.pool.as_postgres().unwrap(), page).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => delete_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Postgres => {
                exists_by_slug_postgres(self.pool.as_postgres().unwrap(), slug).await
            }
        }
    }
}

const COLUMNS: &str = "id, slug, title, content, content_html, status, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, page: &Page) -> Result<Page> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO pages (slug, title, content, content_html, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&page.slug)
    .bind(&page.title)
    .bind(&page.content)
    .bind(&page.content_html)
    .bind(page.status.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create page")?;

    Ok(Page {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..page.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get page")?;
    Ok(row.map(|r| row_to_page_sqlite(&r)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get page")?;
    Ok(row.map(|r| row_to_page_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool, published_only: bool) -> Result<Vec<Page>> {
    let sql = if published_only {
        format!(
            "SELECT {} FROM pages WHERE status = 'published' ORDER BY created_at DESC",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM pages ORDER BY created_at DESC", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list pages")?;
    Ok(rows.iter().map(row_to_page_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, page: &Page) -> Result<Page> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE pages SET slug = ?, title = ?, content = ?, content_html = ?, status = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&page.slug)
    .bind(&page.title)
    .bind(&page.content)
    .bind(&page.content_html)
    .bind(page.status.to_string())
    .bind(now)
    .bind(page.id)
    .execute(pool)
    .await
    .context("Failed to update page")?;
    get_by_id_sqlite(pool, page.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Page not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM pages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete page")?;
    Ok(())
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_page_sqlite(row: &sqlx::sqlite::SqliteRow) -> Page {
    let status_str: String = row.get("status");
    Page {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        status: status_str.parse().unwrap_or(PageStatus::Draft),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, page: &Page) -> Result<Page> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO pages (slug, title, content, content_html, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(&page.slug)
    .bind(&page.title)
    .bind(&page.content)
    .bind(&page.content_html)
    .bind(page.status.to_string())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create page")?;

    Ok(Page {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..page.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get page")?;
    Ok(row.map(|r| row_to_page_postgres(&r)))
}

async fn get_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE slug = $1", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get page")?;
    Ok(row.map(|r| row_to_page_postgres(&r)))
}

async fn list_postgres(pool: &PgPool, published_only: bool) -> Result<Vec<Page>> {
    let sql = if published_only {
        format!(
            "SELECT {} FROM pages WHERE status = 'published' ORDER BY created_at DESC",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM pages ORDER BY created_at DESC", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list pages")?;
    Ok(rows.iter().map(row_to_page_postgres).collect())
}

async fn update_postgres(pool: &PgPool, page: &Page) -> Result<Page> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE pages SET slug = $1, title = $2, content = $3, content_html = $4, status = $5, updated_at = $6 WHERE id = $7",
    )
    .bind(&page.slug)
    .bind(&page.title)
    .bind(&page.content)
    .bind(&page.content_html)
    .bind(page.status.to_string())
    .bind(now)
    .bind(page.id)
    .execute(pool)
    .await
    .context("Failed to update page")?;
    get_by_id_postgres(pool, page.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Page not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM pages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete page")?;
    Ok(())
}

async fn exists_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_page_postgres(row: &sqlx::postgres::PgRow) -> Page {
    let status_str: String = row.get("status");
    Page {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        status: status_str.parse().unwrap_or(PageStatus::Draft),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
