//! SEO metadata model
//!
//! One entry per public route; the frontend fetches these to populate meta
//! tags. Routes are unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SEO metadata entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoEntry {
    /// Unique identifier
    pub id: i64,
    /// Public route the metadata applies to, e.g. "/models/ava"
    pub route: String,
    /// Meta title
    pub title: String,
    /// Meta description
    #[serde(default)]
    pub description: Option<String>,
    /// Open Graph image URL
    #[serde(default)]
    pub og_image_url: Option<String>,
    /// Whether crawlers should skip this route
    pub no_index: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl SeoEntry {
    /// Create a new SEO entry for a route
    pub fn new(route: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            route,
            title,
            description: None,
            og_image_url: None,
            no_index: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating an SEO entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSeoEntryInput {
    pub route: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub og_image_url: Option<String>,
    #[serde(default)]
    pub no_index: bool,
}

/// Input for updating an SEO entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeoEntryInput {
    pub route: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_image_url: Option<String>,
    pub no_index: Option<bool>,
}
