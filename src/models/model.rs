//! Model profile entity
//!
//! This module provides:
//! - `Model` entity representing one showcased profile
//! - Input types for creating and updating profiles
//!
//! The two visibility flags drive the gallery policy: `all_photos_public`
//! overrides `members_only` when both are set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Short tagline shown on cards
    #[serde(default)]
    pub tagline: Option<String>,
    /// Longer biography text
    #[serde(default)]
    pub bio: Option<String>,
    /// Primary profile image URL
    #[serde(default)]
    pub profile_image_url: Option<String>,
    /// Gallery restricted to subscribers by default
    pub members_only: bool,
    /// Override: every photo visible to everyone
    pub all_photos_public: bool,
    /// Whether the profile appears on the public site
    pub published: bool,
    /// Listing order (lower = earlier)
    #[serde(default)]
    pub sort_order: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Create a new model profile with the given parameters
    pub fn new(slug: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            slug,
            name,
            tagline: None,
            bio: None,
            profile_image_url: None,
            members_only: false,
            all_photos_public: false,
            published: false,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new model profile
#[derive(Debug, Clone, Deserialize)]
pub struct CreateModelInput {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub members_only: bool,
    #[serde(default)]
    pub all_photos_public: bool,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input for updating an existing model profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateModelInput {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub members_only: Option<bool>,
    pub all_photos_public: Option<bool>,
    pub published: Option<bool>,
    pub sort_order: Option<i32>,
}

impl UpdateModelInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.slug.is_some()
            || self.name.is_some()
            || self.tagline.is_some()
            || self.bio.is_some()
            || self.profile_image_url.is_some()
            || self.members_only.is_some()
            || self.all_photos_public.is_some()
            || self.published.is_some()
            || self.sort_order.is_some()
    }
}
