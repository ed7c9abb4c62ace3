//! Theme color repository
//!
//! Theme colors are keyed by token name; `upsert` replaces the value of an
//! existing token in place so the admin panel can save the whole palette
//! without tracking row ids.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::ThemeColor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ThemeRepository: Send + Sync {
    async fn get_by_name(&self, name: &str) -> Result<Option<ThemeColor>>;
    async fn list(&self) -> Result<Vec<ThemeColor>>;
    /// Insert the token or replace its value if it already exists
    async fn upsert(&self, name: &str, value: &str) -> Result<ThemeColor>;
    async fn delete_by_name(&self, name: &str) -> Result<bool>;
}

pub struct SqlxThemeRepository {
    pool: DynDatabasePool,
}

impl SqlxThemeRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ThemeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ThemeRepository for SqlxThemeRepository {
    async fn get_by_name(&self, name: &str) -> Result<Option<ThemeColor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Postgres => {
                get_by_name_postgres(self.pool.as_postgres().unwrap(), name).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<ThemeColor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap()).await,
        }
    }

    async fn upsert(&self, name: &str, value: &str) -> Result<ThemeColor> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => upsert_sqlite(self.pool.as_sqlite().unwrap(), name, value).await,
            DatabaseDriver::Postgres => {
                upsert_postgres(self.pool.as_postgres().unwrap(), name, value).await
            }
        }
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Postgres => {
                delete_by_name_postgres(self.pool.as_postgres().unwrap(), name).await
            }
        }
    }
}

const COLUMNS: &str = "id, name, value, created_at, updated_at";

// SQLite implementations

async fn get_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<ThemeColor>> {
    let row = sqlx::query(&format!("SELECT {} FROM theme_colors WHERE name = ?", COLUMNS))
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get theme color")?;
    Ok(row.map(|r| row_to_color_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<ThemeColor>> {
    let rows = sqlx::query(&format!("SELECT {} FROM theme_colors ORDER BY name", COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list theme colors")?;
    Ok(rows.iter().map(row_to_color_sqlite).collect())
}

async fn upsert_sqlite(pool: &SqlitePool, name: &str, value: &str) -> Result<ThemeColor> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO theme_colors (name, value, created_at, updated_at) VALUES (?, ?, ?, ?) ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(name)
    .bind(value)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert theme color")?;

    get_by_name_sqlite(pool, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Theme color not found after upsert"))
}

async fn delete_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM theme_colors WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to delete theme color")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_color_sqlite(row: &sqlx::sqlite::SqliteRow) -> ThemeColor {
    ThemeColor {
        id: row.get("id"),
        name: row.get("name"),
        value: row.get("value"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn get_by_name_postgres(pool: &PgPool, name: &str) -> Result<Option<ThemeColor>> {
    let row = sqlx::query(&format!("SELECT {} FROM theme_colors WHERE name = $1", COLUMNS))
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get theme color")?;
    Ok(row.map(|r| row_to_color_postgres(&r)))
}

async fn list_postgres(pool: &PgPool) -> Result<Vec<ThemeColor>> {
    let rows = sqlx::query(&format!("SELECT {} FROM theme_colors ORDER BY name", COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list theme colors")?;
    Ok(rows.iter().map(row_to_color_postgres).collect())
}

async fn upsert_postgres(pool: &PgPool, name: &str, value: &str) -> Result<ThemeColor> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO theme_colors (name, value, created_at, updated_at) VALUES ($1, $2, $3, $4) ON CONFLICT(name) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
    )
    .bind(name)
    .bind(value)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert theme color")?;

    get_by_name_postgres(pool, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Theme color not found after upsert"))
}

async fn delete_by_name_postgres(pool: &PgPool, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM theme_colors WHERE name = $1")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to delete theme color")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_color_postgres(row: &sqlx::postgres::PgRow) -> ThemeColor {
    ThemeColor {
        id: row.get("id"),
        name: row.get("name"),
        value: row.get("value"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxThemeRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxThemeRepository::new(pool)
    }

    #[tokio::test]
    async fn test_default_palette_present() {
        let repo = setup().await;
        let colors = repo.list().await.unwrap();
        assert!(colors.iter().any(|c| c.name == "primary"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let repo = setup().await;

        repo.upsert("primary", "#ffffff").await.unwrap();
        let color = repo.get_by_name("primary").await.unwrap().unwrap();
        assert_eq!(color.value, "#ffffff");

        let count_before = repo.list().await.unwrap().len();
        repo.upsert("primary", "#000000").await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), count_before);
    }

    #[tokio::test]
    async fn test_delete_by_name() {
        let repo = setup().await;
        repo.upsert("custom", "#123456").await.unwrap();

        assert!(repo.delete_by_name("custom").await.unwrap());
        assert!(!repo.delete_by_name("custom").await.unwrap());
    }
}
