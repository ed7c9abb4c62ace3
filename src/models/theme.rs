//! Theme color model
//!
//! Theme colors are explicit configuration records with the same CRUD
//! lifecycle as every other entity; the frontend maps them onto CSS custom
//! properties at render time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One named theme color, e.g. ("primary", "#b76e79")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeColor {
    /// Unique identifier
    pub id: i64,
    /// Color token name (unique), e.g. "primary", "accent"
    pub name: String,
    /// Hex color value, e.g. "#b76e79"
    pub value: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ThemeColor {
    /// Create a new theme color record
    pub fn new(name: String, value: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            name,
            value,
            created_at: now,
            updated_at: now,
        }
    }
}

