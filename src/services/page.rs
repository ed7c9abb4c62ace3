//! Legal page service
//!
//! Terms, privacy, imprint and similar static pages, with cached public
//! reads.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::PageRepository;
use crate::models::{CreatePageInput, Page, PageStatus, UpdatePageInput};
use crate::services::markdown::MarkdownRenderer;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for pages (1 hour)
const PAGE_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_PAGE_BY_SLUG: &str = "pages:slug:";

/// Error types for page operations
#[derive(Debug, thiserror::Error)]
pub enum PageServiceError {
    #[error("Page not found")]
    NotFound,

    #[error("Page with slug '{0}' already exists")]
    SlugExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Legal page service
pub struct PageService {
    repo: Arc<dyn PageRepository>,
    cache: Arc<Cache>,
    markdown: MarkdownRenderer,
}

impl PageService {
    pub fn new(repo: Arc<dyn PageRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            markdown: MarkdownRenderer::new(),
        }
    }

    pub async fn create(&self, input: CreatePageInput) -> Result<Page, PageServiceError> {
        let slug = input.slug.trim().to_string();
        if slug.is_empty() || input.title.trim().is_empty() {
            return Err(PageServiceError::ValidationError(
                "Slug and title must not be empty".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&slug)
            .await
            .context("Failed to check slug")?
        {
            return Err(PageServiceError::SlugExists(slug));
        }

        let content_html = self.markdown.render(&input.content);
        let mut page = Page::new(slug, input.title.trim().to_string(), input.content, content_html);
        if let Some(status) = input.status {
            page.status = status;
        }

        let created = self
            .repo
            .create(&page)
            .await
            .context("Failed to create page")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        self.repo.get_by_id(id).await
    }

    /// Get a published page for the public site, cached.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let cache_key = format!("{}{}", CACHE_KEY_PAGE_BY_SLUG, slug);
        if let Some(page) = self.cache.get::<Page>(&cache_key).await.ok().flatten() {
            return Ok(Some(page));
        }

        let page = self
            .repo
            .get_by_slug(slug)
            .await?
            .filter(|p| p.status == PageStatus::Published);

        if let Some(ref p) = page {
            let _ = self
                .cache
                .set(&cache_key, p, Duration::from_secs(PAGE_CACHE_TTL_SECS))
                .await;
        }

        Ok(page)
    }

    pub async fn list(&self) -> Result<Vec<Page>> {
        self.repo.list().await
    }

    pub async fn list_published(&self) -> Result<Vec<Page>> {
        self.repo.list_published().await
    }

    pub async fn update(&self, id: i64, input: UpdatePageInput) -> Result<Page, PageServiceError> {
        let mut page = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load page")?
            .ok_or(PageServiceError::NotFound)?;

        if let Some(new_slug) = input.slug {
            let new_slug = new_slug.trim().to_string();
            if new_slug != page.slug
                && self
                    .repo
                    .exists_by_slug(&new_slug)
                    .await
                    .context("Failed to check slug")?
            {
                return Err(PageServiceError::SlugExists(new_slug));
            }
            page.slug = new_slug;
        }

        if let Some(title) = input.title {
            page.title = title;
        }
        if let Some(content) = input.content {
            page.content_html = self.markdown.render(&content);
            page.content = content;
        }
        if let Some(status) = input.status {
            page.status = status;
        }

        let updated = self
            .repo
            .update(&page)
            .await
            .context("Failed to update page")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), PageServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load page")?
            .is_none()
        {
            return Err(PageServiceError::NotFound);
        }
        self.repo.delete(id).await.context("Failed to delete page")?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("pages:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxPageRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> PageService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        PageService::new(
            Arc::new(SqlxPageRepository::new(pool)),
            Arc::new(Cache::Memory(MemoryCache::new())),
        )
    }

    #[tokio::test]
    async fn test_create_and_publish() {
        let service = setup().await;
        let page = service
            .create(CreatePageInput {
                slug: "terms".to_string(),
                title: "Terms of Service".to_string(),
                content: "# Terms\n\nBe nice.".to_string(),
                status: None,
            })
            .await
            .unwrap();

        assert!(page.content_html.contains("<h1>"));
        assert!(service.get_published_by_slug("terms").await.unwrap().is_none());

        service
            .update(
                page.id,
                UpdatePageInput {
                    status: Some(PageStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(service.get_published_by_slug("terms").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_slug_rejected() {
        let service = setup().await;
        let result = service
            .create(CreatePageInput {
                slug: "  ".to_string(),
                title: "Privacy".to_string(),
                content: "p".to_string(),
                status: None,
            })
            .await;
        assert!(matches!(result, Err(PageServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_cache_invalidated_on_delete() {
        let service = setup().await;
        let page = service
            .create(CreatePageInput {
                slug: "imprint".to_string(),
                title: "Imprint".to_string(),
                content: "i".to_string(),
                status: Some(PageStatus::Published),
            })
            .await
            .unwrap();

        service.get_published_by_slug("imprint").await.unwrap();
        service.delete(page.id).await.unwrap();

        assert!(service
            .get_published_by_slug("imprint")
            .await
            .unwrap()
            .is_none());
    }
}
