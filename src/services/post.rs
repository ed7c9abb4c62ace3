//! Blog post service
//!
//! Business logic for the marketing blog: markdown rendering, slug
//! uniqueness, publish transitions, and cached public reads.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::PostRepository;
use crate::models::{CreatePostInput, ListParams, PagedResult, Post, PostStatus, UpdatePostInput};
use crate::services::markdown::MarkdownRenderer;
use crate::services::model::generate_slug;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for individual posts (1 hour)
const POST_CACHE_TTL_SECS: u64 = 3600;

/// Cache TTL for post listings (10 minutes)
const POST_LIST_CACHE_TTL_SECS: u64 = 600;

const CACHE_KEY_POST_BY_SLUG: &str = "posts:slug:";
const CACHE_KEY_POST_LIST: &str = "posts:list";

/// Error types for post operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found")]
    NotFound,

    #[error("Post with slug '{0}' already exists")]
    SlugExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Blog post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    cache: Arc<Cache>,
    markdown: MarkdownRenderer,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            markdown: MarkdownRenderer::new(),
        }
    }

    /// Create a new post. An empty slug is derived from the title.
    pub async fn create(&self, input: CreatePostInput) -> Result<Post, PostServiceError> {
        if input.title.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Title must not be empty".to_string(),
            ));
        }

        let slug = if input.slug.trim().is_empty() {
            generate_slug(&input.title)
        } else {
            input.slug.trim().to_string()
        };
        if slug.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Slug must not be empty".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&slug)
            .await
            .context("Failed to check slug")?
        {
            return Err(PostServiceError::SlugExists(slug));
        }

        let content_html = self.markdown.render(&input.content);
        let status = input.status.unwrap_or_default();
        let mut post = Post::new(slug, input.title.trim().to_string(), input.content, content_html, status);
        post.cover_image_url = input.cover_image_url;

        let created = self
            .repo
            .create(&post)
            .await
            .context("Failed to create post")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        self.repo.get_by_id(id).await
    }

    /// Get a published post for the public site, cached.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let cache_key = format!("{}{}", CACHE_KEY_POST_BY_SLUG, slug);
        if let Some(post) = self.cache.get::<Post>(&cache_key).await.ok().flatten() {
            return Ok(Some(post));
        }

        let post = self
            .repo
            .get_by_slug(slug)
            .await?
            .filter(|p| p.status == PostStatus::Published);

        if let Some(ref p) = post {
            let _ = self
                .cache
                .set(&cache_key, p, Duration::from_secs(POST_CACHE_TTL_SECS))
                .await;
        }

        Ok(post)
    }

    /// List published posts for the public site, cached per page.
    pub async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Post>> {
        let cache_key = format!(
            "{}:published:{}:{}",
            CACHE_KEY_POST_LIST, params.page, params.per_page
        );
        if let Ok(Some(cached)) = self.cache.get::<PagedResult<Post>>(&cache_key).await {
            return Ok(cached);
        }

        let (items, total) = self.repo.list(params, Some(PostStatus::Published)).await?;
        let result = PagedResult::new(items, total, params);

        let _ = self
            .cache
            .set(
                &cache_key,
                &result,
                Duration::from_secs(POST_LIST_CACHE_TTL_SECS),
            )
            .await;

        Ok(result)
    }

    /// List every post for the admin screen, uncached.
    pub async fn list_all(&self, params: &ListParams) -> Result<PagedResult<Post>> {
        let (items, total) = self.repo.list(params, None).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        let mut post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load post")?
            .ok_or(PostServiceError::NotFound)?;

        if let Some(new_slug) = input.slug {
            let new_slug = new_slug.trim().to_string();
            if new_slug != post.slug
                && self
                    .repo
                    .exists_by_slug(&new_slug)
                    .await
                    .context("Failed to check slug")?
            {
                return Err(PostServiceError::SlugExists(new_slug));
            }
            post.slug = new_slug;
        }

        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(content) = input.content {
            post.content_html = self.markdown.render(&content);
            post.content = content;
        }
        if let Some(cover_image_url) = input.cover_image_url {
            post.cover_image_url = Some(cover_image_url);
        }
        if let Some(status) = input.status {
            // First transition to published stamps the publication time
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }

        let updated = self
            .repo
            .update(&post)
            .await
            .context("Failed to update post")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load post")?
            .is_none()
        {
            return Err(PostServiceError::NotFound);
        }
        self.repo.delete(id).await.context("Failed to delete post")?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("posts:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxPostRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> PostService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        PostService::new(
            Arc::new(SqlxPostRepository::new(pool)),
            Arc::new(Cache::Memory(MemoryCache::new())),
        )
    }

    fn input(title: &str, status: PostStatus) -> CreatePostInput {
        CreatePostInput {
            slug: String::new(),
            title: title.to_string(),
            content: "# Hello\n\nBody text.".to_string(),
            cover_image_url: None,
            status: Some(status),
        }
    }

    #[tokio::test]
    async fn test_create_renders_markdown_and_derives_slug() {
        let service = setup().await;
        let post = service
            .create(input("A Night To Remember", PostStatus::Draft))
            .await
            .unwrap();

        assert_eq!(post.slug, "a-night-to-remember");
        assert!(post.content_html.contains("<h1>"));
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn test_publish_transition_sets_timestamp() {
        let service = setup().await;
        let post = service.create(input("Draft", PostStatus::Draft)).await.unwrap();

        let updated = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.published_at.is_some());

        // A second update does not move the publication time
        let stamp = updated.published_at;
        let again = service
            .update(
                post.id,
                UpdatePostInput {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(again.published_at, stamp);
    }

    #[tokio::test]
    async fn test_public_lookup_hides_drafts() {
        let service = setup().await;
        service.create(input("Draft Post", PostStatus::Draft)).await.unwrap();
        service
            .create(input("Live Post", PostStatus::Published))
            .await
            .unwrap();

        assert!(service
            .get_published_by_slug("draft-post")
            .await
            .unwrap()
            .is_none());
        assert!(service
            .get_published_by_slug("live-post")
            .await
            .unwrap()
            .is_some());

        let listed = service.list_published(&ListParams::default()).await.unwrap();
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    async fn test_cache_invalidated_on_update() {
        let service = setup().await;
        let post = service
            .create(input("Live Post", PostStatus::Published))
            .await
            .unwrap();

        // Warm the cache
        service.get_published_by_slug("live-post").await.unwrap();

        service
            .update(
                post.id,
                UpdatePostInput {
                    content: Some("Updated body".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fresh = service
            .get_published_by_slug("live-post")
            .await
            .unwrap()
            .unwrap();
        assert!(fresh.content.contains("Updated body"));
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let service = setup().await;
        service.create(input("Same", PostStatus::Draft)).await.unwrap();
        let result = service.create(input("Same", PostStatus::Draft)).await;
        assert!(matches!(result, Err(PostServiceError::SlugExists(_))));
    }
}
