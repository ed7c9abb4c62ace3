//! Blog post repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Post, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Blog post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    /// List posts page by page, optionally restricted to one status,
    /// newest first. Returns the page plus the total row count.
    async fn list(&self, params: &ListParams, status: Option<PostStatus>) -> Result<(Vec<Post>, i64)>;
    async fn update(&self, post: &Post) -> Result<Post>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Postgres => create_postgres(self.pool.as_postgres().unwrap(), post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Postgres => {
                get_by_slug_postgres(self.pool.as_postgres().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, params: &ListParams, status: Option<PostStatus>) -> Result<(Vec<Post>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), params, status).await
            }
            DatabaseDriver::Postgres => {
                list_postgres(self.pool.as_postgres().unwrap(), params, status).await
            }
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Postgres => update_postgres(self.pool.as_postgres().unwrap(), post).await,
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

const COLUMNS: &str =
    "id, slug, title, content, content_html, status, cover_image_url, published_at, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO posts (slug, title, content, content_html, status, cover_image_url, published_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(post.status.to_string())
    .bind(&post.cover_image_url)
    .bind(post.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post")?;
    row.map(|r| row_to_post_sqlite(&r)).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;
    row.map(|r| row_to_post_sqlite(&r)).transpose()
}

async fn list_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
    status: Option<PostStatus>,
) -> Result<(Vec<Post>, i64)> {
    let (rows, total_row) = match status {
        Some(s) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM posts WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(s.to_string())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list posts")?;

            let total = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE status = ?")
                .bind(s.to_string())
                .fetch_one(pool)
                .await?;
            (rows, total)
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM posts ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list posts")?;

            let total = sqlx::query("SELECT COUNT(*) as count FROM posts")
                .fetch_one(pool)
                .await?;
            (rows, total)
        }
    };

    let posts: Result<Vec<Post>> = rows.iter().map(row_to_post_sqlite).collect();
    Ok((posts?, total_row.get::<i64, _>("count")))
}

async fn update_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE posts SET slug = ?, title = ?, content = ?, content_html = ?, status = ?, cover_image_url = ?, published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(post.status.to_string())
    .bind(&post.cover_image_url)
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_by_id_sqlite(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        status: PostStatus::from_str(&status_str).unwrap_or_default(),
        cover_image_url: row.get("cover_image_url"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO posts (slug, title, content, content_html, status, cover_image_url, published_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(post.status.to_string())
    .bind(&post.cover_image_url)
    .bind(post.published_at)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post")?;
    row.map(|r| row_to_post_postgres(&r)).transpose()
}

async fn get_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = $1", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;
    row.map(|r| row_to_post_postgres(&r)).transpose()
}

async fn list_postgres(
    pool: &PgPool,
    params: &ListParams,
    status: Option<PostStatus>,
) -> Result<(Vec<Post>, i64)> {
    let (rows, total_row) = match status {
        Some(s) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM posts WHERE status = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
                COLUMNS
            ))
            .bind(s.to_string())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list posts")?;

            let total = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE status = $1")
                .bind(s.to_string())
                .fetch_one(pool)
                .await?;
            (rows, total)
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list posts")?;

            let total = sqlx::query("SELECT COUNT(*) as count FROM posts")
                .fetch_one(pool)
                .await?;
            (rows, total)
        }
    };

    let posts: Result<Vec<Post>> = rows.iter().map(row_to_post_postgres).collect();
    Ok((posts?, total_row.get::<i64, _>("count")))
}

async fn update_postgres(pool: &PgPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE posts SET slug = $1, title = $2, content = $3, content_html = $4, status = $5, cover_image_url = $6, published_at = $7, updated_at = $8 WHERE id = $9",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(post.status.to_string())
    .bind(&post.cover_image_url)
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_by_id_postgres(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

async fn exists_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_post_postgres(row: &sqlx::postgres::PgRow) -> Result<Post> {
    let status_str: String = row.get("status");
    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        status: PostStatus::from_str(&status_str).unwrap_or_default(),
        cover_image_url: row.get("cover_image_url"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxPostRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxPostRepository::new(pool)
    }

    fn post(slug: &str, status: PostStatus) -> Post {
        Post::new(
            slug.to_string(),
            slug.to_uppercase(),
            "content".to_string(),
            "<p>content</p>".to_string(),
            status,
        )
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = setup().await;
        repo.create(&post("a", PostStatus::Published)).await.unwrap();
        repo.create(&post("b", PostStatus::Draft)).await.unwrap();

        let (published, total) = repo
            .list(&ListParams::default(), Some(PostStatus::Published))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(published[0].slug, "a");

        let (all, total) = repo.list(&ListParams::default(), None).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination() {
        let repo = setup().await;
        for i in 0..15 {
            repo.create(&post(&format!("p{}", i), PostStatus::Published))
                .await
                .unwrap();
        }

        let (page1, total) = repo
            .list(&ListParams::new(1, 10), None)
            .await
            .unwrap();
        assert_eq!(total, 15);
        assert_eq!(page1.len(), 10);

        let (page2, _) = repo.list(&ListParams::new(2, 10), None).await.unwrap();
        assert_eq!(page2.len(), 5);
    }

    #[tokio::test]
    async fn test_slug_lookup_and_exists() {
        let repo = setup().await;
        repo.create(&post("hello", PostStatus::Draft)).await.unwrap();

        assert!(repo.get_by_slug("hello").await.unwrap().is_some());
        assert!(repo.exists_by_slug("hello").await.unwrap());
        assert!(!repo.exists_by_slug("nope").await.unwrap());
    }
}
