//! Banner service
//!
//! Announcement strips with optional scheduling windows. The public lookup
//! returns only banners that are live right now.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::BannerRepository;
use crate::models::{Banner, BannerPlacement, CreateBannerInput, UpdateBannerInput};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for enabled banners (1 minute, windows must take effect quickly)
const BANNER_CACHE_TTL_SECS: u64 = 60;

const CACHE_KEY_ENABLED: &str = "banners:enabled";

/// Error types for banner operations
#[derive(Debug, thiserror::Error)]
pub enum BannerServiceError {
    #[error("Banner not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Banner service
pub struct BannerService {
    repo: Arc<dyn BannerRepository>,
    cache: Arc<Cache>,
}

impl BannerService {
    pub fn new(repo: Arc<dyn BannerRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(&self, input: CreateBannerInput) -> Result<Banner, BannerServiceError> {
        if input.message.trim().is_empty() {
            return Err(BannerServiceError::ValidationError(
                "Message must not be empty".to_string(),
            ));
        }
        if let (Some(starts), Some(ends)) = (input.starts_at, input.ends_at) {
            if ends <= starts {
                return Err(BannerServiceError::ValidationError(
                    "Window end must lie after its start".to_string(),
                ));
            }
        }

        let mut banner = Banner::new(input.placement, input.message.trim().to_string());
        banner.link_url = input.link_url;
        banner.active = input.active;
        banner.starts_at = input.starts_at;
        banner.ends_at = input.ends_at;

        let created = self
            .repo
            .create(&banner)
            .await
            .context("Failed to create banner")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Banner>> {
        self.repo.get_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<Banner>> {
        self.repo.list().await
    }

    /// Banners currently live for a placement: active flag set and the
    /// scheduling window containing now.
    pub async fn list_live(&self, placement: Option<BannerPlacement>) -> Result<Vec<Banner>> {
        let enabled = match self.cache.get::<Vec<Banner>>(CACHE_KEY_ENABLED).await {
            Ok(Some(cached)) => cached,
            _ => {
                let fresh = self.repo.list_enabled().await?;
                let _ = self
                    .cache
                    .set(
                        CACHE_KEY_ENABLED,
                        &fresh,
                        Duration::from_secs(BANNER_CACHE_TTL_SECS),
                    )
                    .await;
                fresh
            }
        };

        Ok(enabled
            .into_iter()
            .filter(|b| b.is_live())
            .filter(|b| placement.map_or(true, |p| b.placement == p))
            .collect())
    }

    pub async fn update(&self, id: i64, input: UpdateBannerInput) -> Result<Banner, BannerServiceError> {
        let mut banner = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load banner")?
            .ok_or(BannerServiceError::NotFound)?;

        if let Some(placement) = input.placement {
            banner.placement = placement;
        }
        if let Some(message) = input.message {
            if message.trim().is_empty() {
                return Err(BannerServiceError::ValidationError(
                    "Message must not be empty".to_string(),
                ));
            }
            banner.message = message.trim().to_string();
        }
        if let Some(link_url) = input.link_url {
            banner.link_url = Some(link_url);
        }
        if let Some(active) = input.active {
            banner.active = active;
        }
        if let Some(starts_at) = input.starts_at {
            banner.starts_at = Some(starts_at);
        }
        if let Some(ends_at) = input.ends_at {
            banner.ends_at = Some(ends_at);
        }

        if let (Some(starts), Some(ends)) = (banner.starts_at, banner.ends_at) {
            if ends <= starts {
                return Err(BannerServiceError::ValidationError(
                    "Window end must lie after its start".to_string(),
                ));
            }
        }

        let updated = self
            .repo
            .update(&banner)
            .await
            .context("Failed to update banner")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), BannerServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load banner")?
            .is_none()
        {
            return Err(BannerServiceError::NotFound);
        }
        self.repo
            .delete(id)
            .await
            .context("Failed to delete banner")?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("banners:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxBannerRepository;
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration as ChronoDuration, Utc};

    async fn setup() -> BannerService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        BannerService::new(
            Arc::new(SqlxBannerRepository::new(pool)),
            Arc::new(Cache::Memory(MemoryCache::new())),
        )
    }

    fn input(message: &str, placement: BannerPlacement) -> CreateBannerInput {
        CreateBannerInput {
            placement,
            message: message.to_string(),
            link_url: None,
            active: true,
            starts_at: None,
            ends_at: None,
        }
    }

    #[tokio::test]
    async fn test_live_filter_by_placement() {
        let service = setup().await;
        service.create(input("Top strip", BannerPlacement::Top)).await.unwrap();
        service
            .create(input("Footer strip", BannerPlacement::Footer))
            .await
            .unwrap();

        let top = service.list_live(Some(BannerPlacement::Top)).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].message, "Top strip");

        let all = service.list_live(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_window_outside_now_not_live() {
        let service = setup().await;
        let mut future = input("Later", BannerPlacement::Top);
        future.starts_at = Some(Utc::now() + ChronoDuration::hours(1));
        service.create(future).await.unwrap();

        assert!(service.list_live(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inverted_window_rejected() {
        let service = setup().await;
        let mut bad = input("Bad", BannerPlacement::Top);
        bad.starts_at = Some(Utc::now() + ChronoDuration::hours(2));
        bad.ends_at = Some(Utc::now() + ChronoDuration::hours(1));

        let result = service.create(bad).await;
        assert!(matches!(result, Err(BannerServiceError::ValidationError(_))));
    }
}
