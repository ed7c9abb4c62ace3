//! Legal/info page model
//!
//! Static pages such as terms of service, privacy policy, imprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Page title
    pub title: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content
    pub content_html: String,
    /// Publication status
    pub status: PageStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// Create a new page with the given parameters
    pub fn new(slug: String, title: String, content: String, content_html: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            slug,
            title,
            content,
            content_html,
            status: PageStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Page publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Draft - not visible to public
    Draft,
    /// Published - visible to public
    Published,
}

impl Default for PageStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageStatus::Draft => write!(f, "draft"),
            PageStatus::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for PageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PageStatus::Draft),
            "published" => Ok(PageStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid page status: {}", s)),
        }
    }
}

/// Input for creating a page
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageInput {
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<PageStatus>,
}

/// Input for updating a page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePageInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PageStatus>,
}
