//! Model profile repository
//!
//! Database operations for model profiles. The gallery resolver reads the
//! visibility flags through `get_by_id`/`get_by_slug`; it never writes.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Model;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Model profile repository trait
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Create a new model profile
    async fn create(&self, model: &Model) -> Result<Model>;

    /// Get a model by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Model>>;

    /// Get a model by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>>;

    /// List all models, admin view
    async fn list(&self) -> Result<Vec<Model>>;

    /// List published models for the public site
    async fn list_published(&self) -> Result<Vec<Model>>;

    /// Update a model
    async fn update(&self, model: &Model) -> Result<Model>;

    /// Delete a model (cascades to its gallery photos)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check whether a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Count all models
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based model repository implementation
pub struct SqlxModelRepository {
    pool: DynDatabasePool,
}

impl SqlxModelRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ModelRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ModelRepository for SqlxModelRepository {
    async fn create(&self, model: &Model) -> Result<Model> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), model).await,
            DatabaseDriver::Postgres => {
                create_postgres(self.pool.as_postgres().unwrap(), model).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Postgres => {
                get_by_slug_postgres(self.pool.as_postgres().unwrap(), slug).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), false).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), false).await,
        }
    }

    async fn list_published(&self) -> Result<Vec<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), true).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap(), true).await,
        }
    }

    async fn update(&self, model: &Model) -> Result<Model> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), model).await,
            DatabaseDriver::Postgres => {
                update_postgres(self.pool.as_postgres().unwrap(), model).await
            }
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

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Postgres => count_postgres(self.pool.as_postgres().unwrap()).await,
        }
    }
}

const COLUMNS: &str = "id, slug, name, tagline, bio, profile_image_url, members_only, all_photos_public, published, sort_order, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, model: &Model) -> Result<Model> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO models (slug, name, tagline, bio, profile_image_url, members_only, all_photos_public, published, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&model.slug)
    .bind(&model.name)
    .bind(&model.tagline)
    .bind(&model.bio)
    .bind(&model.profile_image_url)
    .bind(model.members_only)
    .bind(model.all_photos_public)
    .bind(model.published)
    .bind(model.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create model")?;

    Ok(Model {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..model.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Model>> {
    let row = sqlx::query(&format!("SELECT {} FROM models WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get model")?;
    Ok(row.map(|r| row_to_model_sqlite(&r)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Model>> {
    let row = sqlx::query(&format!("SELECT {} FROM models WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get model by slug")?;
    Ok(row.map(|r| row_to_model_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool, published_only: bool) -> Result<Vec<Model>> {
    let sql = if published_only {
        format!(
            "SELECT {} FROM models WHERE published = 1 ORDER BY sort_order, id",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM models ORDER BY sort_order, id", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list models")?;
    Ok(rows.iter().map(row_to_model_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, model: &Model) -> Result<Model> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE models SET slug = ?, name = ?, tagline = ?, bio = ?, profile_image_url = ?, members_only = ?, all_photos_public = ?, published = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&model.slug)
    .bind(&model.name)
    .bind(&model.tagline)
    .bind(&model.bio)
    .bind(&model.profile_image_url)
    .bind(model.members_only)
    .bind(model.all_photos_public)
    .bind(model.published)
    .bind(model.sort_order)
    .bind(now)
    .bind(model.id)
    .execute(pool)
    .await
    .context("Failed to update model")?;

    get_by_id_sqlite(pool, model.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Model not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM models WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete model")?;
    Ok(())
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM models WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

async fn count_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM models")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

fn row_to_model_sqlite(row: &sqlx::sqlite::SqliteRow) -> Model {
    Model {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        tagline: row.get("tagline"),
        bio: row.get("bio"),
        profile_image_url: row.get("profile_image_url"),
        members_only: row.get("members_only"),
        all_photos_public: row.get("all_photos_public"),
        published: row.get("published"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, model: &Model) -> Result<Model> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO models (slug, name, tagline, bio, profile_image_url, members_only, all_photos_public, published, sort_order, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
    )
    .bind(&model.slug)
    .bind(&model.name)
    .bind(&model.tagline)
    .bind(&model.bio)
    .bind(&model.profile_image_url)
    .bind(model.members_only)
    .bind(model.all_photos_public)
    .bind(model.published)
    .bind(model.sort_order)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create model")?;

    Ok(Model {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..model.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Model>> {
    let row = sqlx::query(&format!("SELECT {} FROM models WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get model")?;
    Ok(row.map(|r| row_to_model_postgres(&r)))
}

async fn get_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<Option<Model>> {
    let row = sqlx::query(&format!("SELECT {} FROM models WHERE slug = $1", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get model by slug")?;
    Ok(row.map(|r| row_to_model_postgres(&r)))
}

async fn list_postgres(pool: &PgPool, published_only: bool) -> Result<Vec<Model>> {
    let sql = if published_only {
        format!(
            "SELECT {} FROM models WHERE published = TRUE ORDER BY sort_order, id",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM models ORDER BY sort_order, id", COLUMNS)
    };
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list models")?;
    Ok(rows.iter().map(row_to_model_postgres).collect())
}

async fn update_postgres(pool: &PgPool, model: &Model) -> Result<Model> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE models SET slug = $1, name = $2, tagline = $3, bio = $4, profile_image_url = $5, members_only = $6, all_photos_public = $7, published = $8, sort_order = $9, updated_at = $10 WHERE id = $11",
    )
    .bind(&model.slug)
    .bind(&model.name)
    .bind(&model.tagline)
    .bind(&model.bio)
    .bind(&model.profile_image_url)
    .bind(model.members_only)
    .bind(model.all_photos_public)
    .bind(model.published)
    .bind(model.sort_order)
    .bind(now)
    .bind(model.id)
    .execute(pool)
    .await
    .context("Failed to update model")?;

    get_by_id_postgres(pool, model.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Model not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM models WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete model")?;
    Ok(())
}

async fn exists_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM models WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

async fn count_postgres(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM models")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

fn row_to_model_postgres(row: &sqlx::postgres::PgRow) -> Model {
    Model {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        tagline: row.get("tagline"),
        bio: row.get("bio"),
        profile_image_url: row.get("profile_image_url"),
        members_only: row.get("members_only"),
        all_photos_public: row.get("all_photos_public"),
        published: row.get("published"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxModelRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxModelRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_fetch_by_slug() {
        let repo = setup().await;
        let mut model = Model::new("ava".to_string(), "Ava".to_string());
        model.members_only = true;

        let created = repo.create(&model).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get_by_slug("ava").await.unwrap().unwrap();
        assert!(fetched.members_only);
        assert!(!fetched.all_photos_public);
    }

    #[tokio::test]
    async fn test_list_published_filters_and_orders() {
        let repo = setup().await;

        let mut a = Model::new("a".to_string(), "A".to_string());
        a.published = true;
        a.sort_order = 2;
        repo.create(&a).await.unwrap();

        let mut b = Model::new("b".to_string(), "B".to_string());
        b.published = true;
        b.sort_order = 1;
        repo.create(&b).await.unwrap();

        let c = Model::new("c".to_string(), "C".to_string());
        repo.create(&c).await.unwrap();

        let published = repo.list_published().await.unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].slug, "b");
        assert_eq!(published[1].slug, "a");

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_update_flags() {
        let repo = setup().await;
        let created = repo
            .create(&Model::new("ava".to_string(), "Ava".to_string()))
            .await
            .unwrap();

        let mut model = created.clone();
        model.all_photos_public = true;
        let updated = repo.update(&model).await.unwrap();
        assert!(updated.all_photos_public);
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let repo = setup().await;
        repo.create(&Model::new("ava".to_string(), "Ava".to_string()))
            .await
            .unwrap();

        assert!(repo.exists_by_slug("ava").await.unwrap());
        assert!(!repo.exists_by_slug("zoe").await.unwrap());
    }
}
