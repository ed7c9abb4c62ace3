//! Site banner model
//!
//! Banners are short announcement strips with an optional scheduling window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Banner entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    /// Unique identifier
    pub id: i64,
    /// Where on the page the banner renders
    pub placement: BannerPlacement,
    /// Banner text
    pub message: String,
    /// Optional click-through target
    #[serde(default)]
    pub link_url: Option<String>,
    /// Whether the banner is switched on
    pub active: bool,
    /// Window start; None means no lower bound
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Window end; None means no upper bound
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// Create a new banner with the given parameters
    pub fn new(placement: BannerPlacement, message: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            placement,
            message,
            link_url: None,
            active: true,
            starts_at: None,
            ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the banner should render at the given instant
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.map_or(true, |s| s <= now)
            && self.ends_at.map_or(true, |e| e > now)
    }

    /// Whether the banner should render right now
    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }
}

/// Banner placement on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerPlacement {
    /// Strip above the header
    Top,
    /// Strip above the footer
    Footer,
}

impl Default for BannerPlacement {
    fn default() -> Self {
        Self::Top
    }
}

impl BannerPlacement {
    /// Convert placement to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerPlacement::Top => "top",
            BannerPlacement::Footer => "footer",
        }
    }
}

impl fmt::Display for BannerPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BannerPlacement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(BannerPlacement::Top),
            "footer" => Ok(BannerPlacement::Footer),
            _ => Err(anyhow::anyhow!("Invalid banner placement: {}", s)),
        }
    }
}

/// Input for creating a banner
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBannerInput {
    #[serde(default)]
    pub placement: BannerPlacement,
    pub message: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Input for updating a banner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBannerInput {
    pub placement: Option<BannerPlacement>,
    pub message: Option<String>,
    pub link_url: Option<String>,
    pub active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_banner_live_without_window() {
        let banner = Banner::new(BannerPlacement::Top, "Summer".to_string());
        assert!(banner.is_live());
    }

    #[test]
    fn test_banner_window_bounds() {
        let now = Utc::now();
        let mut banner = Banner::new(BannerPlacement::Top, "Sale".to_string());
        banner.starts_at = Some(now - Duration::hours(1));
        banner.ends_at = Some(now + Duration::hours(1));
        assert!(banner.is_live_at(now));

        banner.starts_at = Some(now + Duration::hours(1));
        assert!(!banner.is_live_at(now));

        banner.starts_at = None;
        banner.ends_at = Some(now - Duration::minutes(5));
        assert!(!banner.is_live_at(now));
    }

    #[test]
    fn test_inactive_banner_never_live() {
        let mut banner = Banner::new(BannerPlacement::Footer, "Off".to_string());
        banner.active = false;
        assert!(!banner.is_live());
    }
}
