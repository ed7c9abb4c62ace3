//! Theme color service
//!
//! Named color tokens stored as ordinary configuration records. Values are
//! validated as hex colors; the frontend maps tokens onto CSS custom
//! properties.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::ThemeRepository;
use crate::models::ThemeColor;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for the palette (1 hour)
const THEME_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_PALETTE: &str = "theme:palette";

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

static TOKEN_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

/// Error types for theme color operations
#[derive(Debug, thiserror::Error)]
pub enum ThemeServiceError {
    #[error("Theme color not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Theme color service
pub struct ThemeService {
    repo: Arc<dyn ThemeRepository>,
    cache: Arc<Cache>,
}

impl ThemeService {
    pub fn new(repo: Arc<dyn ThemeRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    /// The whole palette, cached.
    pub async fn palette(&self) -> Result<Vec<ThemeColor>> {
        if let Ok(Some(cached)) = self.cache.get::<Vec<ThemeColor>>(CACHE_KEY_PALETTE).await {
            return Ok(cached);
        }

        let colors = self.repo.list().await?;
        let _ = self
            .cache
            .set(
                CACHE_KEY_PALETTE,
                &colors,
                Duration::from_secs(THEME_CACHE_TTL_SECS),
            )
            .await;
        Ok(colors)
    }

    pub async fn get(&self, name: &str) -> Result<Option<ThemeColor>> {
        self.repo.get_by_name(name).await
    }

    /// Create or replace a color token.
    pub async fn upsert(&self, name: &str, value: &str) -> Result<ThemeColor, ThemeServiceError> {
        let name = name.trim().to_lowercase();
        if !TOKEN_NAME_RE.is_match(&name) {
            return Err(ThemeServiceError::ValidationError(format!(
                "Invalid color token name: '{}'",
                name
            )));
        }
        let value = value.trim();
        if !HEX_COLOR_RE.is_match(value) {
            return Err(ThemeServiceError::ValidationError(format!(
                "Invalid hex color: '{}'",
                value
            )));
        }

        let color = self
            .repo
            .upsert(&name, &value.to_lowercase())
            .await
            .context("Failed to upsert theme color")?;
        self.invalidate_cache().await;
        Ok(color)
    }

    pub async fn delete(&self, name: &str) -> Result<(), ThemeServiceError> {
        let removed = self
            .repo
            .delete_by_name(name)
            .await
            .context("Failed to delete theme color")?;
        if !removed {
            return Err(ThemeServiceError::NotFound);
        }
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("theme:*").await;
    }
}
