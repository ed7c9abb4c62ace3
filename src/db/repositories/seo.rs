//! SEO metadata repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::SeoEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait SeoRepository: Send + Sync {
    async fn create(&self, entry: &SeoEntry) -> Result<SeoEntry>;
    async fn get_by_id(&self, id: i64) -> Result<Option<SeoEntry>>;
    async fn get_by_route(&self, route: &str) -> Result<Option<SeoEntry>>;
    async fn list(&self) -> Result<Vec<SeoEntry>>;
    async fn update(&self, entry: &SeoEntry) -> Result<SeoEntry>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_route(&self, route: &str) -> Result<bool>;
}

pub struct SqlxSeoRepository {
    pool: DynDatabasePool,
}

impl SqlxSeoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SeoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SeoRepository for SqlxSeoRepository {
    async fn create(&self, entry: &SeoEntry) -> Result<SeoEntry> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), entry).await,
            DatabaseDriver::Postgres => create_postgres(self.pool.as_postgres().unwrap(), entry).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SeoEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn get_by_route(&self, route: &str) -> Result<Option<SeoEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_route_sqlite(self.pool.as_sqlite().unwrap(), route).await,
            DatabaseDriver::Postgres => {
                get_by_route_postgres(self.pool.as_postgres().unwrap(), route).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<SeoEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap()).await,
        }
    }

    async fn update(&self, entry: &SeoEntry) -> Result<SeoEntry> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), entry).await,
            DatabaseDriver::Postgres => update_postgres(self.pool.as_postgres().unwrap(), entry).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => delete_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn exists_by_route(&self, route: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_route_sqlite(self.pool.as_sqlite().unwrap(), route).await
            }
            DatabaseDriver::Postgres => {
                exists_by_route_postgres(self.pool.as_postgres().unwrap(), route).await
            }
        }
    }
}

const COLUMNS: &str =
    "id, route, title, description, og_image_url, no_index, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, entry: &SeoEntry) -> Result<SeoEntry> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO seo_entries (route, title, description, og_image_url, no_index, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.route)
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(&entry.og_image_url)
    .bind(entry.no_index)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create SEO entry")?;

    Ok(SeoEntry {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..entry.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<SeoEntry>> {
    let row = sqlx::query(&format!("SELECT {} FROM seo_entries WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO entry")?;
    Ok(row.map(|r| row_to_entry_sqlite(&r)))
}

async fn get_by_route_sqlite(pool: &SqlitePool, route: &str) -> Result<Option<SeoEntry>> {
    let row = sqlx::query(&format!("SELECT {} FROM seo_entries WHERE route = ?", COLUMNS))
        .bind(route)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO entry by route")?;
    Ok(row.map(|r| row_to_entry_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<SeoEntry>> {
    let rows = sqlx::query(&format!("SELECT {} FROM seo_entries ORDER BY route", COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list SEO entries")?;
    Ok(rows.iter().map(row_to_entry_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, entry: &SeoEntry) -> Result<SeoEntry> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE seo_entries SET route = ?, title = ?, description = ?, og_image_url = ?, no_index = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&entry.route)
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(&entry.og_image_url)
    .bind(entry.no_index)
    .bind(now)
    .bind(entry.id)
    .execute(pool)
    .await
    .context("Failed to update SEO entry")?;
    get_by_id_sqlite(pool, entry.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("SEO entry not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM seo_entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete SEO entry")?;
    Ok(())
}

async fn exists_by_route_sqlite(pool: &SqlitePool, route: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM seo_entries WHERE route = ?")
        .bind(route)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_entry_sqlite(row: &sqlx::sqlite::SqliteRow) -> SeoEntry {
    SeoEntry {
        id: row.get("id"),
        route: row.get("route"),
        title: row.get("title"),
        description: row.get("description"),
        og_image_url: row.get("og_image_url"),
        no_index: row.get("no_index"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, entry: &SeoEntry) -> Result<SeoEntry> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO seo_entries (route, title, description, og_image_url, no_index, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(&entry.route)
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(&entry.og_image_url)
    .bind(entry.no_index)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create SEO entry")?;

    Ok(SeoEntry {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..entry.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<SeoEntry>> {
    let row = sqlx::query(&format!("SELECT {} FROM seo_entries WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO entry")?;
    Ok(row.map(|r| row_to_entry_postgres(&r)))
}

async fn get_by_route_postgres(pool: &PgPool, route: &str) -> Result<Option<SeoEntry>> {
    let row = sqlx::query(&format!("SELECT {} FROM seo_entries WHERE route = $1", COLUMNS))
        .bind(route)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO entry by route")?;
    Ok(row.map(|r| row_to_entry_postgres(&r)))
}

async fn list_postgres(pool: &PgPool) -> Result<Vec<SeoEntry>> {
    let rows = sqlx::query(&format!("SELECT {} FROM seo_entries ORDER BY route", COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list SEO entries")?;
    Ok(rows.iter().map(row_to_entry_postgres).collect())
}

async fn update_postgres(pool: &PgPool, entry: &SeoEntry) -> Result<SeoEntry> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE seo_entries SET route = $1, title = $2, description = $3, og_image_url = $4, no_index = $5, updated_at = $6 WHERE id = $7",
    )
    .bind(&entry.route)
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(&entry.og_image_url)
    .bind(entry.no_index)
    .bind(now)
    .bind(entry.id)
    .execute(pool)
    .await
    .context("Failed to update SEO entry")?;
    get_by_id_postgres(pool, entry.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("SEO entry not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM seo_entries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete SEO entry")?;
    Ok(())
}

async fn exists_by_route_postgres(pool: &PgPool, route: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM seo_entries WHERE route = $1")
        .bind(route)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_entry_postgres(row: &sqlx::postgres::PgRow) -> SeoEntry {
    SeoEntry {
        id: row.get("id"),
        route: row.get("route"),
        title: row.get("title"),
        description: row.get("description"),
        og_image_url: row.get("og_image_url"),
        no_index: row.get("no_index"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxSeoRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxSeoRepository::new(pool)
    }

    #[tokio::test]
    async fn test_route_lookup() {
        let repo = setup().await;
        repo.create(&SeoEntry::new("/models/ava".to_string(), "Ava".to_string()))
            .await
            .unwrap();

        let entry = repo.get_by_route("/models/ava").await.unwrap().unwrap();
        assert_eq!(entry.title, "Ava");
        assert!(repo.exists_by_route("/models/ava").await.unwrap());
        assert!(repo.get_by_route("/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_route_rejected() {
        let repo = setup().await;
        repo.create(&SeoEntry::new("/".to_string(), "Home".to_string()))
            .await
            .unwrap();

        let result = repo
            .create(&SeoEntry::new("/".to_string(), "Other".to_string()))
            .await;
        assert!(result.is_err());
    }
}
