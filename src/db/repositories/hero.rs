//! Hero slide repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::HeroSlide;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait HeroSlideRepository: Send + Sync {
    async fn create(&self, slide: &HeroSlide) -> Result<HeroSlide>;
    async fn get_by_id(&self, id: i64) -> Result<Option<HeroSlide>>;
    async fn list(&self) -> Result<Vec<HeroSlide>>;
    /// Active slides in carousel order
    async fn list_active(&self) -> Result<Vec<HeroSlide>>;
    async fn update(&self, slide: &HeroSlide) -> Result<HeroSlide>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxHeroSlideRepository {
    pool: DynDatabasePool,
}

impl SqlxHeroSlideRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HeroSlideRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl HeroSlideRepository for SqlxHeroSlideRepository {
    async fn create(&self, slide: &HeroSlide) -> Result<HeroSlide> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), slide).await,
            DatabaseDriver::Postgres => create_postgres(self.pool.as_postgres().unwrap(), slide).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<HeroSlide>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<HeroSlide>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), false).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), false).await,
        }
    }

    async fn list_active(&self) -> Result<Vec<HeroSlide>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), true).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), true).await,
        }
    }

    async fn update(&self, slide: &HeroSlide) -> Result<HeroSlide> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), slide).await,
            DatabaseDriver::Postgres => update_postgres(self.pool.as_postgres().unwrap(), slide).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => delete_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }
}

const COLUMNS: &str =
    "id, title, subtitle, image_url, link_url, sort_order, active, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, slide: &HeroSlide) -> Result<HeroSlide> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO hero_slides (title, subtitle, image_url, link_url, sort_order, active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&slide.title)
    .bind(&slide.subtitle)
    .bind(&slide.image_url)
    .bind(&slide.link_url)
    .bind(slide.sort_order)
    .bind(slide.active)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create hero slide")?;

    Ok(HeroSlide {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..slide.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<HeroSlide>> {
    let row = sqlx::query(&format!("SELECT {} FROM hero_slides WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get hero slide")?;
    Ok(row.map(|r| row_to_slide_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool, active_only: bool) -> Result<Vec<HeroSlide>> {
    let sql = if active_only {
        format!(
            "SELECT {} FROM hero_slides WHERE active = 1 ORDER BY sort_order, id",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM hero_slides ORDER BY sort_order, id", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list hero slides")?;
    Ok(rows.iter().map(row_to_slide_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, slide: &HeroSlide) -> Result<HeroSlide> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE hero_slides SET title = ?, subtitle = ?, image_url = ?, link_url = ?, sort_order = ?, active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&slide.title)
    .bind(&slide.subtitle)
    .bind(&slide.image_url)
    .bind(&slide.link_url)
    .bind(slide.sort_order)
    .bind(slide.active)
    .bind(now)
    .bind(slide.id)
    .execute(pool)
    .await
    .context("Failed to update hero slide")?;
    get_by_id_sqlite(pool, slide.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Hero slide not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM hero_slides WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete hero slide")?;
    Ok(())
}

fn row_to_slide_sqlite(row: &sqlx::sqlite::SqliteRow) -> HeroSlide {
    HeroSlide {
        id: row.get("id"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        image_url: row.get("image_url"),
        link_url: row.get("link_url"),
        sort_order: row.get("sort_order"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, slide: &HeroSlide) -> Result<HeroSlide> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO hero_slides (title, subtitle, image_url, link_url, sort_order, active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(&slide.title)
    .bind(&slide.subtitle)
    .bind(&slide.image_url)
    .bind(&slide.link_url)
    .bind(slide.sort_order)
    .bind(slide.active)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create hero slide")?;

    Ok(HeroSlide {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..slide.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<HeroSlide>> {
    let row = sqlx::query(&format!("SELECT {} FROM hero_slides WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get hero slide")?;
    Ok(row.map(|r| row_to_slide_postgres(&r)))
}

async fn list_postgres(pool: &PgPool, active_only: bool) -> Result<Vec<HeroSlide>> {
    let sql = if active_only {
        format!(
            "SELECT {} FROM hero_slides WHERE active = TRUE ORDER BY sort_order, id",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM hero_slides ORDER BY sort_order, id", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list hero slides")?;
    Ok(rows.iter().map(row_to_slide_postgres).collect())
}

async fn update_postgres(pool: &PgPool, slide: &HeroSlide) -> Result<HeroSlide> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE hero_slides SET title = $1, subtitle = $2, image_url = $3, link_url = $4, sort_order = $5, active = $6, updated_at = $7 WHERE id = $8",
    )
    .bind(&slide.title)
    .bind(&slide.subtitle)
    .bind(&slide.image_url)
    .bind(&slide.link_url)
    .bind(slide.sort_order)
    .bind(slide.active)
    .bind(now)
    .bind(slide.id)
    .execute(pool)
    .await
    .context("Failed to update hero slide")?;
    get_by_id_postgres(pool, slide.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Hero slide not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM hero_slides WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete hero slide")?;
    Ok(())
}

fn row_to_slide_postgres(row: &sqlx::postgres::PgRow) -> HeroSlide {
    HeroSlide {
        id: row.get("id"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        image_url: row.get("image_url"),
        link_url: row.get("link_url"),
        sort_order: row.get("sort_order"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxHeroSlideRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxHeroSlideRepository::new(pool)
    }

    #[tokio::test]
    async fn test_active_slides_ordered() {
        let repo = setup().await;

        repo.create(&HeroSlide::new("Second".to_string(), "2.jpg".to_string(), 2))
            .await
            .unwrap();
        repo.create(&HeroSlide::new("First".to_string(), "1.jpg".to_string(), 1))
            .await
            .unwrap();

        let mut hidden = HeroSlide::new("Hidden".to_string(), "3.jpg".to_string(), 0);
        hidden.active = false;
        repo.create(&hidden).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].title, "First");
        assert_eq!(active[1].title, "Second");

        assert_eq!(repo.list().await.unwrap().len(), 3);
    }
}
