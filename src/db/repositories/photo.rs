//! Gallery photo repository
//!
//! Database operations for gallery photos. `list_by_model` pushes the
//! visibility filter down into SQL; the resolver's fallback re-query uses a
//! different filter value. Rows always come back ordered by
//! `(order_index, id)` so the stable-sort tie-break holds.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{GalleryPhoto, PhotoVisibility};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Gallery photo repository trait
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Add a photo to a gallery
    async fn create(&self, photo: &GalleryPhoto) -> Result<GalleryPhoto>;

    /// Get a photo by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryPhoto>>;

    /// List a model's photos, optionally filtered by visibility tag,
    /// ordered by (order_index, id)
    async fn list_by_model(
        &self,
        model_id: i64,
        visibility: Option<PhotoVisibility>,
    ) -> Result<Vec<GalleryPhoto>>;

    /// Update a photo
    async fn update(&self, photo: &GalleryPhoto) -> Result<GalleryPhoto>;

    /// Delete a photo
    async fn delete(&self, id: i64) -> Result<()>;

    /// Highest order_index currently in a model's gallery
    async fn max_order_index(&self, model_id: i64) -> Result<Option<i32>>;

    /// Count all photos
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based photo repository implementation
pub struct SqlxPhotoRepository {
    pool: DynDatabasePool,
}

impl SqlxPhotoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PhotoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PhotoRepository for SqlxPhotoRepository {
    async fn create(&self, photo: &GalleryPhoto) -> Result<GalleryPhoto> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), photo).await,
            DatabaseDriver::Postgres => {
                create_postgres(self.pool.as_postgres().unwrap(), photo).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryPhoto>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn list_by_model(
        &self,
        model_id: i64,
        visibility: Option<PhotoVisibility>,
    ) -> Result<Vec<GalleryPhoto>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_model_sqlite(self.pool.as_sqlite().unwrap(), model_id, visibility).await
            }
            DatabaseDriver::Postgres => {
                list_by_model_postgres(self.pool.as_postgres().unwrap(), model_id, visibility).await
            }
        }
    }

    async fn update(&self, photo: &GalleryPhoto) -> Result<GalleryPhoto> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), photo).await,
            DatabaseDriver::Postgres => {
                update_postgres(self.pool.as_postgres().unwrap(), photo).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => delete_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn max_order_index(&self, model_id: i64) -> Result<Option<i32>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                max_order_index_sqlite(self.pool.as_sqlite().unwrap(), model_id).await
            }
            DatabaseDriver::Postgres => {
                max_order_index_postgres(self.pool.as_postgres().unwrap(), model_id).await
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

const COLUMNS: &str = "id, model_id, image_url, caption, order_index, visibility, created_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, photo: &GalleryPhoto) -> Result<GalleryPhoto> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO gallery_photos (model_id, image_url, caption, order_index, visibility, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(photo.model_id)
    .bind(&photo.image_url)
    .bind(&photo.caption)
    .bind(photo.order_index)
    .bind(photo.visibility.to_string())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create gallery photo")?;

    Ok(GalleryPhoto {
        id: result.last_insert_rowid(),
        created_at: now,
        ..photo.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<GalleryPhoto>> {
    let row = sqlx::query(&format!("SELECT {} FROM gallery_photos WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get gallery photo")?;
    row.map(|r| row_to_photo_sqlite(&r)).transpose()
}

async fn list_by_model_sqlite(
    pool: &SqlitePool,
    model_id: i64,
    visibility: Option<PhotoVisibility>,
) -> Result<Vec<GalleryPhoto>> {
    let rows = match visibility {
        Some(vis) => {
            sqlx::query(&format!(
                "SELECT {} FROM gallery_photos WHERE model_id = ? AND visibility = ? ORDER BY order_index, id",
                COLUMNS
            ))
            .bind(model_id)
            .bind(vis.to_string())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM gallery_photos WHERE model_id = ? ORDER BY order_index, id",
                COLUMNS
            ))
            .bind(model_id)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list gallery photos")?;

    rows.iter().map(row_to_photo_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, photo: &GalleryPhoto) -> Result<GalleryPhoto> {
    sqlx::query(
        "UPDATE gallery_photos SET image_url = ?, caption = ?, order_index = ?, visibility = ? WHERE id = ?",
    )
    .bind(&photo.image_url)
    .bind(&photo.caption)
    .bind(photo.order_index)
    .bind(photo.visibility.to_string())
    .bind(photo.id)
    .execute(pool)
    .await
    .context("Failed to update gallery photo")?;

    get_by_id_sqlite(pool, photo.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Gallery photo not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM gallery_photos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete gallery photo")?;
    Ok(())
}

async fn max_order_index_sqlite(pool: &SqlitePool, model_id: i64) -> Result<Option<i32>> {
    let row = sqlx::query("SELECT MAX(order_index) as max_order FROM gallery_photos WHERE model_id = ?")
        .bind(model_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<Option<i32>, _>("max_order"))
}

async fn count_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM gallery_photos")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

fn row_to_photo_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<GalleryPhoto> {
    let visibility_str: String = row.get("visibility");
    Ok(GalleryPhoto {
        id: row.get("id"),
        model_id: row.get("model_id"),
        image_url: row.get("image_url"),
        caption: row.get("caption"),
        order_index: row.get("order_index"),
        visibility: PhotoVisibility::from_str(&visibility_str).unwrap_or_default(),
        created_at: row.get("created_at"),
    })
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, photo: &GalleryPhoto) -> Result<GalleryPhoto> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO gallery_photos (model_id, image_url, caption, order_index, visibility, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(photo.model_id)
    .bind(&photo.image_url)
    .bind(&photo.caption)
    .bind(photo.order_index)
    .bind(photo.visibility.to_string())
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create gallery photo")?;

    Ok(GalleryPhoto {
        id: row.get("id"),
        created_at: now,
        ..photo.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<GalleryPhoto>> {
    let row = sqlx::query(&format!("SELECT {} FROM gallery_photos WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get gallery photo")?;
    row.map(|r| row_to_photo_postgres(&r)).transpose()
}

async fn list_by_model_postgres(
    pool: &PgPool,
    model_id: i64,
    visibility: Option<PhotoVisibility>,
) -> Result<Vec<GalleryPhoto>> {
    let rows = match visibility {
        Some(vis) => {
            sqlx::query(&format!(
                "SELECT {} FROM gallery_photos WHERE model_id = $1 AND visibility = $2 ORDER BY order_index, id",
                COLUMNS
            ))
            .bind(model_id)
            .bind(vis.to_string())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM gallery_photos WHERE model_id = $1 ORDER BY order_index, id",
                COLUMNS
            ))
            .bind(model_id)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list gallery photos")?;

    rows.iter().map(row_to_photo_postgres).collect()
}

async fn update_postgres(pool: &PgPool, photo: &GalleryPhoto) -> Result<GalleryPhoto> {
    sqlx::query(
        "UPDATE gallery_photos SET image_url = $1, caption = $2, order_index = $3, visibility = $4 WHERE id = $5",
    )
    .bind(&photo.image_url)
    .bind(&photo.caption)
    .bind(photo.order_index)
    .bind(photo.visibility.to_string())
    .bind(photo.id)
    .execute(pool)
    .await
    .context("Failed to update gallery photo")?;

    get_by_id_postgres(pool, photo.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Gallery photo not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM gallery_photos WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete gallery photo")?;
    Ok(())
}

async fn max_order_index_postgres(pool: &PgPool, model_id: i64) -> Result<Option<i32>> {
    let row = sqlx::query("SELECT MAX(order_index) as max_order FROM gallery_photos WHERE model_id = $1")
        .bind(model_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<Option<i32>, _>("max_order"))
}

async fn count_postgres(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM gallery_photos")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

fn row_to_photo_postgres(row: &sqlx::postgres::PgRow) -> Result<GalleryPhoto> {
    let visibility_str: String = row.get("visibility");
    Ok(GalleryPhoto {
        id: row.get("id"),
        model_id: row.get("model_id"),
        image_url: row.get("image_url"),
        caption: row.get("caption"),
        order_index: row.get("order_index"),
        visibility: PhotoVisibility::from_str(&visibility_str).unwrap_or_default(),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{ModelRepository, SqlxModelRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Model;

    async fn setup() -> (SqlxPhotoRepository, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let models = SqlxModelRepository::new(pool.clone());
        let model = models
            .create(&Model::new("ava".to_string(), "Ava".to_string()))
            .await
            .unwrap();

        (SqlxPhotoRepository::new(pool), model.id)
    }

    #[tokio::test]
    async fn test_create_and_list_ordered() {
        let (repo, model_id) = setup().await;

        repo.create(&GalleryPhoto::new(model_id, "b.jpg".to_string(), 1, PhotoVisibility::Public))
            .await
            .unwrap();
        repo.create(&GalleryPhoto::new(model_id, "a.jpg".to_string(), 0, PhotoVisibility::Public))
            .await
            .unwrap();

        let photos = repo.list_by_model(model_id, None).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].image_url, "a.jpg");
        assert_eq!(photos[1].image_url, "b.jpg");
    }

    #[tokio::test]
    async fn test_visibility_filter_pushdown() {
        let (repo, model_id) = setup().await;

        repo.create(&GalleryPhoto::new(model_id, "pub.jpg".to_string(), 0, PhotoVisibility::Public))
            .await
            .unwrap();
        repo.create(&GalleryPhoto::new(
            model_id,
            "excl.jpg".to_string(),
            1,
            PhotoVisibility::MembersOnly,
        ))
        .await
        .unwrap();

        let exclusive = repo
            .list_by_model(model_id, Some(PhotoVisibility::MembersOnly))
            .await
            .unwrap();
        assert_eq!(exclusive.len(), 1);
        assert_eq!(exclusive[0].image_url, "excl.jpg");

        let public = repo
            .list_by_model(model_id, Some(PhotoVisibility::Public))
            .await
            .unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].image_url, "pub.jpg");
    }

    #[tokio::test]
    async fn test_equal_order_index_ties_break_by_insertion() {
        let (repo, model_id) = setup().await;

        repo.create(&GalleryPhoto::new(model_id, "first.jpg".to_string(), 5, PhotoVisibility::Public))
            .await
            .unwrap();
        repo.create(&GalleryPhoto::new(model_id, "second.jpg".to_string(), 5, PhotoVisibility::Public))
            .await
            .unwrap();

        let photos = repo.list_by_model(model_id, None).await.unwrap();
        assert_eq!(photos[0].image_url, "first.jpg");
        assert_eq!(photos[1].image_url, "second.jpg");
    }

    #[tokio::test]
    async fn test_max_order_index() {
        let (repo, model_id) = setup().await;
        assert_eq!(repo.max_order_index(model_id).await.unwrap(), None);

        repo.create(&GalleryPhoto::new(model_id, "a.jpg".to_string(), 3, PhotoVisibility::Public))
            .await
            .unwrap();
        assert_eq!(repo.max_order_index(model_id).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_update_visibility() {
        let (repo, model_id) = setup().await;

        let created = repo
            .create(&GalleryPhoto::new(model_id, "a.jpg".to_string(), 0, PhotoVisibility::Public))
            .await
            .unwrap();

        let mut photo = created.clone();
        photo.visibility = PhotoVisibility::MembersOnly;
        let updated = repo.update(&photo).await.unwrap();
        assert_eq!(updated.visibility, PhotoVisibility::MembersOnly);
    }
}
