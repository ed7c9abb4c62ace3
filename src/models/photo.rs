//! Gallery photo entity
//!
//! One image belonging to a model profile. `order_index` is a total order
//! within a model's gallery, ties broken by insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gallery photo entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryPhoto {
    /// Unique identifier
    pub id: i64,
    /// Owning model profile
    pub model_id: i64,
    /// Image URL
    pub image_url: String,
    /// Optional caption
    #[serde(default)]
    pub caption: Option<String>,
    /// Display order (lower = earlier)
    pub order_index: i32,
    /// Who may see this photo
    pub visibility: PhotoVisibility,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl GalleryPhoto {
    /// Create a new photo with the given parameters
    pub fn new(model_id: i64, image_url: String, order_index: i32, visibility: PhotoVisibility) -> Self {
        Self {
            id: 0, // Will be set by database
            model_id,
            image_url,
            caption: None,
            order_index,
            visibility,
            created_at: Utc::now(),
        }
    }

    /// Build the synthetic placeholder entry shown for a gallery that
    /// resolved to nothing: the model's profile image captioned with the
    /// model's name. Display fallback only, never run through the
    /// visibility filter.
    pub fn placeholder(model: &crate::models::Model) -> Option<Self> {
        let image_url = model.profile_image_url.clone()?;
        Some(Self {
            id: 0,
            model_id: model.id,
            image_url,
            caption: Some(model.name.clone()),
            order_index: 0,
            visibility: PhotoVisibility::Public,
            created_at: model.created_at,
        })
    }
}

/// Per-photo visibility tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoVisibility {
    /// Visible to any viewer the model's flags allow
    Public,
    /// Restricted to subscribers and admins
    MembersOnly,
}

impl Default for PhotoVisibility {
    fn default() -> Self {
        Self::Public
    }
}

impl PhotoVisibility {
    /// Convert visibility to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoVisibility::Public => "public",
            PhotoVisibility::MembersOnly => "members_only",
        }
    }
}

impl fmt::Display for PhotoVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhotoVisibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(PhotoVisibility::Public),
            "members_only" => Ok(PhotoVisibility::MembersOnly),
            _ => Err(anyhow::anyhow!("Invalid photo visibility: {}", s)),
        }
    }
}

/// Input for adding a photo to a gallery
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhotoInput {
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub order_index: Option<i32>,
    #[serde(default)]
    pub visibility: PhotoVisibility,
}

/// Input for updating a photo
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhotoInput {
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub order_index: Option<i32>,
    pub visibility: Option<PhotoVisibility>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Model;

    #[test]
    fn test_visibility_round_trip() {
        assert_eq!(PhotoVisibility::from_str("public").unwrap(), PhotoVisibility::Public);
        assert_eq!(
            PhotoVisibility::from_str("members_only").unwrap(),
            PhotoVisibility::MembersOnly
        );
        assert!(PhotoVisibility::from_str("hidden").is_err());
    }

    #[test]
    fn test_placeholder_uses_profile_image_and_name() {
        let mut model = Model::new("ava".to_string(), "Ava".to_string());
        model.id = 7;
        model.profile_image_url = Some("https://cdn.example.com/ava.jpg".to_string());

        let placeholder = GalleryPhoto::placeholder(&model).expect("placeholder");
        assert_eq!(placeholder.model_id, 7);
        assert_eq!(placeholder.image_url, "https://cdn.example.com/ava.jpg");
        assert_eq!(placeholder.caption.as_deref(), Some("Ava"));
        assert_eq!(placeholder.order_index, 0);
    }

    #[test]
    fn test_placeholder_requires_profile_image() {
        let model = Model::new("ava".to_string(), "Ava".to_string());
        assert!(GalleryPhoto::placeholder(&model).is_none());
    }
}
