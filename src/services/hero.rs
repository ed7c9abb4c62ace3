//! Hero carousel service

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::HeroSlideRepository;
use crate::models::{CreateHeroSlideInput, HeroSlide, UpdateHeroSlideInput};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for the active carousel (10 minutes)
const HERO_CACHE_TTL_SECS: u64 = 600;

const CACHE_KEY_ACTIVE: &str = "heroes:active";

/// Error types for hero slide operations
#[derive(Debug, thiserror::Error)]
pub enum HeroServiceError {
    #[error("Hero slide not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Hero carousel service
pub struct HeroService {
    repo: Arc<dyn HeroSlideRepository>,
    cache: Arc<Cache>,
}

impl HeroService {
    pub fn new(repo: Arc<dyn HeroSlideRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(&self, input: CreateHeroSlideInput) -> Result<HeroSlide, HeroServiceError> {
        if input.title.trim().is_empty() || input.image_url.trim().is_empty() {
            return Err(HeroServiceError::ValidationError(
                "Title and image URL must not be empty".to_string(),
            ));
        }

        let mut slide = HeroSlide::new(
            input.title.trim().to_string(),
            input.image_url,
            input.sort_order,
        );
        slide.subtitle = input.subtitle;
        slide.link_url = input.link_url;
        slide.active = input.active;

        let created = self
            .repo
            .create(&slide)
            .await
            .context("Failed to create hero slide")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<HeroSlide>> {
        self.repo.get_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<HeroSlide>> {
        self.repo.list().await
    }

    /// Active slides in carousel order, cached.
    pub async fn list_active(&self) -> Result<Vec<HeroSlide>> {
        if let Ok(Some(cached)) = self.cache.get::<Vec<HeroSlide>>(CACHE_KEY_ACTIVE).await {
            return Ok(cached);
        }

        let slides = self.repo.list_active().await?;
        let _ = self
            .cache
            .set(
                CACHE_KEY_ACTIVE,
                &slides,
                Duration::from_secs(HERO_CACHE_TTL_SECS),
            )
            .await;
        Ok(slides)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateHeroSlideInput,
    ) -> Result<HeroSlide, HeroServiceError> {
        let mut slide = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load hero slide")?
            .ok_or(HeroServiceError::NotFound)?;

        if let Some(title) = input.title {
            slide.title = title;
        }
        if let Some(subtitle) = input.subtitle {
            slide.subtitle = Some(subtitle);
        }
        if let Some(image_url) = input.image_url {
            slide.image_url = image_url;
        }
        if let Some(link_url) = input.link_url {
            slide.link_url = Some(link_url);
        }
        if let Some(sort_order) = input.sort_order {
            slide.sort_order = sort_order;
        }
        if let Some(active) = input.active {
            slide.active = active;
        }

        let updated = self
            .repo
            .update(&slide)
            .await
            .context("Failed to update hero slide")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), HeroServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load hero slide")?
            .is_none()
        {
            return Err(HeroServiceError::NotFound);
        }
        self.repo
            .delete(id)
            .await
            .context("Failed to delete hero slide")?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("heroes:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxHeroSlideRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> HeroService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        HeroService::new(
            Arc::new(SqlxHeroSlideRepository::new(pool)),
            Arc::new(Cache::Memory(MemoryCache::new())),
        )
    }

    fn input(title: &str, sort_order: i32) -> CreateHeroSlideInput {
        CreateHeroSlideInput {
            title: title.to_string(),
            subtitle: None,
            image_url: format!("{}.jpg", title),
            link_url: None,
            sort_order,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_active_carousel_order_and_cache_invalidation() {
        let service = setup().await;
        service.create(input("second", 2)).await.unwrap();
        service.create(input("first", 1)).await.unwrap();

        let active = service.list_active().await.unwrap();
        assert_eq!(active[0].title, "first");

        // Deactivating a slide must be visible despite the cache
        let second_id = active[1].id;
        service
            .update(
                second_id,
                UpdateHeroSlideInput {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let active = service.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let service = setup().await;
        let result = service.create(input("", 0)).await;
        assert!(matches!(result, Err(HeroServiceError::ValidationError(_))));
    }
}
