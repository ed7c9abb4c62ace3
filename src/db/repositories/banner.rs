//! Banner repository
//!
//! The live-window check (`is_live_at`) stays in the model so the SQL only
//! filters on the `active` flag; scheduling is evaluated in one place.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Banner, BannerPlacement};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait BannerRepository: Send + Sync {
    async fn create(&self, banner: &Banner) -> Result<Banner>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Banner>>;
    async fn list(&self) -> Result<Vec<Banner>>;
    /// Banners with the active flag set, newest first
    async fn list_enabled(&self) -> Result<Vec<Banner>>;
    async fn update(&self, banner: &Banner) -> Result<Banner>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxBannerRepository {
    pool: DynDatabasePool,
}

impl SqlxBannerRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BannerRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BannerRepository for SqlxBannerRepository {
    async fn create(&self, banner: &Banner) -> Result<Banner> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), banner).await,
            DatabaseDriver::Postgres => {
                create_postgres(self.pool.as_postgres().unwrap(), banner).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Banner>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Banner>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), false).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), false).await,
        }
    }

    async fn list_enabled(&self) -> Result<Vec<Banner>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), true).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), true).await,
        }
    }

    async fn update(&self, banner: &Banner) -> Result<Banner> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), banner).await,
            DatabaseDriver::Postgres => {
                update_postgres(self.pool.as_postgres().unwrap(), banner).await
            }
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
    "id, placement, message, link_url, active, starts_at, ends_at, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, banner: &Banner) -> Result<Banner> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO banners (placement, message, link_url, active, starts_at, ends_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(banner.placement.to_string())
    .bind(&banner.message)
    .bind(&banner.link_url)
    .bind(banner.active)
    .bind(banner.starts_at)
    .bind(banner.ends_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create banner")?;

    Ok(Banner {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..banner.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Banner>> {
    let row = sqlx::query(&format!("SELECT {} FROM banners WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get banner")?;
    Ok(row.map(|r| row_to_banner_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool, enabled_only: bool) -> Result<Vec<Banner>> {
    let sql = if enabled_only {
        format!(
            "SELECT {} FROM banners WHERE active = 1 ORDER BY created_at DESC",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM banners ORDER BY created_at DESC", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list banners")?;
    Ok(rows.iter().map(row_to_banner_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, banner: &Banner) -> Result<Banner> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE banners SET placement = ?, message = ?, link_url = ?, active = ?, starts_at = ?, ends_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(banner.placement.to_string())
    .bind(&banner.message)
    .bind(&banner.link_url)
    .bind(banner.active)
    .bind(banner.starts_at)
    .bind(banner.ends_at)
    .bind(now)
    .bind(banner.id)
    .execute(pool)
    .await
    .context("Failed to update banner")?;
    get_by_id_sqlite(pool, banner.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Banner not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM banners WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete banner")?;
    Ok(())
}

fn row_to_banner_sqlite(row: &sqlx::sqlite::SqliteRow) -> Banner {
    let placement_str: String = row.get("placement");
    Banner {
        id: row.get("id"),
        placement: BannerPlacement::from_str(&placement_str).unwrap_or_default(),
        message: row.get("message"),
        link_url: row.get("link_url"),
        active: row.get("active"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, banner: &Banner) -> Result<Banner> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO banners (placement, message, link_url, active, starts_at, ends_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(banner.placement.to_string())
    .bind(&banner.message)
    .bind(&banner.link_url)
    .bind(banner.active)
    .bind(banner.starts_at)
    .bind(banner.ends_at)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create banner")?;

    Ok(Banner {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..banner.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Banner>> {
    let row = sqlx::query(&format!("SELECT {} FROM banners WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get banner")?;
    Ok(row.map(|r| row_to_banner_postgres(&r)))
}

async fn list_postgres(pool: &PgPool, enabled_only: bool) -> Result<Vec<Banner>> {
    let sql = if enabled_only {
        format!(
            "SELECT {} FROM banners WHERE active = TRUE ORDER BY created_at DESC",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM banners ORDER BY created_at DESC", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list banners")?;
    Ok(rows.iter().map(row_to_banner_postgres).collect())
}

async fn update_postgres(pool: &PgPool, banner: &Banner) -> Result<Banner> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE banners SET placement = $1, message = $2, link_url = $3, active = $4, starts_at = $5, ends_at = $6, updated_at = $7 WHERE id = $8",
    )
    .bind(banner.placement.to_string())
    .bind(&banner.message)
    .bind(&banner.link_url)
    .bind(banner.active)
    .bind(banner.starts_at)
    .bind(banner.ends_at)
    .bind(now)
    .bind(banner.id)
    .execute(pool)
    .await
    .context("Failed to update banner")?;
    get_by_id_postgres(pool, banner.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Banner not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM banners WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete banner")?;
    Ok(())
}

fn row_to_banner_postgres(row: &sqlx::postgres::PgRow) -> Banner {
    let placement_str: String = row.get("placement");
    Banner {
        id: row.get("id"),
        placement: BannerPlacement::from_str(&placement_str).unwrap_or_default(),
        message: row.get("message"),
        link_url: row.get("link_url"),
        active: row.get("active"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxBannerRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxBannerRepository::new(pool)
    }

    #[tokio::test]
    async fn test_enabled_filter() {
        let repo = setup().await;

        repo.create(&Banner::new(BannerPlacement::Top, "On".to_string()))
            .await
            .unwrap();

        let mut off = Banner::new(BannerPlacement::Footer, "Off".to_string());
        off.active = false;
        repo.create(&off).await.unwrap();

        let enabled = repo.list_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].message, "On");
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_window_round_trip() {
        let repo = setup().await;

        let mut banner = Banner::new(BannerPlacement::Top, "Sale".to_string());
        banner.starts_at = Some(Utc::now() - chrono::Duration::hours(1));
        banner.ends_at = Some(Utc::now() + chrono::Duration::hours(1));

        let created = repo.create(&banner).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(fetched.starts_at.is_some());
        assert!(fetched.is_live());
    }
}
