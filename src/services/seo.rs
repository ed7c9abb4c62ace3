//! SEO metadata service
//!
//! Per-route meta tags. Routes are unique and normalized to a leading
//! slash; the public lookup is cached.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::SeoRepository;
use crate::models::{CreateSeoEntryInput, SeoEntry, UpdateSeoEntryInput};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for SEO entries (1 hour)
const SEO_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_SEO_BY_ROUTE: &str = "seo:route:";

/// Error types for SEO operations
#[derive(Debug, thiserror::Error)]
pub enum SeoServiceError {
    #[error("SEO entry not found")]
    NotFound,

    #[error("SEO entry for route '{0}' already exists")]
    RouteExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn normalize_route(route: &str) -> String {
    let trimmed = route.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// SEO metadata service
pub struct SeoService {
    repo: Arc<dyn SeoRepository>,
    cache: Arc<Cache>,
}

impl SeoService {
    pub fn new(repo: Arc<dyn SeoRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(&self, input: CreateSeoEntryInput) -> Result<SeoEntry, SeoServiceError> {
        if input.title.trim().is_empty() {
            return Err(SeoServiceError::ValidationError(
                "Title must not be empty".to_string(),
            ));
        }
        let route = normalize_route(&input.route);
        if route == "/" && input.route.trim().is_empty() {
            return Err(SeoServiceError::ValidationError(
                "Route must not be empty".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_route(&route)
            .await
            .context("Failed to check route")?
        {
            return Err(SeoServiceError::RouteExists(route));
        }

        let mut entry = SeoEntry::new(route, input.title.trim().to_string());
        entry.description = input.description;
        entry.og_image_url = input.og_image_url;
        entry.no_index = input.no_index;

        let created = self
            .repo
            .create(&entry)
            .await
            .context("Failed to create SEO entry")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Look up the metadata for a public route, cached.
    pub async fn get_by_route(&self, route: &str) -> Result<Option<SeoEntry>> {
        let route = normalize_route(route);
        let cache_key = format!("{}{}", CACHE_KEY_SEO_BY_ROUTE, route);
        if let Some(entry) = self.cache.get::<SeoEntry>(&cache_key).await.ok().flatten() {
            return Ok(Some(entry));
        }

        let entry = self.repo.get_by_route(&route).await?;
        if let Some(ref e) = entry {
            let _ = self
                .cache
                .set(&cache_key, e, Duration::from_secs(SEO_CACHE_TTL_SECS))
                .await;
        }

        Ok(entry)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<SeoEntry>> {
        self.repo.get_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<SeoEntry>> {
        self.repo.list().await
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateSeoEntryInput,
    ) -> Result<SeoEntry, SeoServiceError> {
        let mut entry = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load SEO entry")?
            .ok_or(SeoServiceError::NotFound)?;

        if let Some(route) = input.route {
            let route = normalize_route(&route);
            if route != entry.route
                && self
                    .repo
                    .exists_by_route(&route)
                    .await
                    .context("Failed to check route")?
            {
                return Err(SeoServiceError::RouteExists(route));
            }
            entry.route = route;
        }
        if let Some(title) = input.title {
            entry.title = title;
        }
        if let Some(description) = input.description {
            entry.description = Some(description);
        }
        if let Some(og_image_url) = input.og_image_url {
            entry.og_image_url = Some(og_image_url);
        }
        if let Some(no_index) = input.no_index {
            entry.no_index = no_index;
        }

        let updated = self
            .repo
            .update(&entry)
            .await
            .context("Failed to update SEO entry")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SeoServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load SEO entry")?
            .is_none()
        {
            return Err(SeoServiceError::NotFound);
        }
        self.repo
            .delete(id)
            .await
            .context("Failed to delete SEO entry")?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("seo:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxSeoRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SeoService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SeoService::new(
            Arc::new(SqlxSeoRepository::new(pool)),
            Arc::new(Cache::Memory(MemoryCache::new())),
        )
    }

    #[tokio::test]
    async fn test_route_normalization() {
        let service = setup().await;
        service
            .create(CreateSeoEntryInput {
                route: "models/ava".to_string(),
                title: "Ava".to_string(),
                description: None,
                og_image_url: None,
                no_index: false,
            })
            .await
            .unwrap();

        assert!(service.get_by_route("/models/ava").await.unwrap().is_some());
        assert!(service.get_by_route("models/ava").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_route_rejected() {
        let service = setup().await;
        let input = CreateSeoEntryInput {
            route: "/".to_string(),
            title: "Home".to_string(),
            description: None,
            og_image_url: None,
            no_index: false,
        };
        service.create(input.clone()).await.unwrap();

        let result = service.create(input).await;
        assert!(matches!(result, Err(SeoServiceError::RouteExists(_))));
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let service = setup().await;
        let entry = service
            .create(CreateSeoEntryInput {
                route: "/".to_string(),
                title: "Home".to_string(),
                description: None,
                og_image_url: None,
                no_index: false,
            })
            .await
            .unwrap();

        service.get_by_route("/").await.unwrap();
        service
            .update(
                entry.id,
                UpdateSeoEntryInput {
                    title: Some("New Home".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fresh = service.get_by_route("/").await.unwrap().unwrap();
        assert_eq!(fresh.title, "New Home");
    }
}
