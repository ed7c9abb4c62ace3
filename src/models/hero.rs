//! Hero carousel slide model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One slide of the landing page hero carousel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSlide {
    /// Unique identifier
    pub id: i64,
    /// Headline text
    pub title: String,
    /// Secondary line below the headline
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Background image URL
    pub image_url: String,
    /// Optional click-through target
    #[serde(default)]
    pub link_url: Option<String>,
    /// Carousel order (lower = earlier)
    pub sort_order: i32,
    /// Whether the slide is shown
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl HeroSlide {
    /// Create a new slide with the given parameters
    pub fn new(title: String, image_url: String, sort_order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            title,
            subtitle: None,
            image_url,
            link_url: None,
            sort_order,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a hero slide
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHeroSlideInput {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for updating a hero slide
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHeroSlideInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub sort_order: Option<i32>,
    pub active: Option<bool>,
}
