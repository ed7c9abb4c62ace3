//! Subscription model
//!
//! A subscription grants the member tier. It counts as active when the
//! `active` flag is set and the expiry, if present, lies in the future.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Whether the subscription is switched on
    pub active: bool,
    /// When the subscription started
    pub started_at: DateTime<Utc>,
    /// Expiry; None means non-expiring
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a new active subscription for a user
    pub fn new(user_id: i64, expires_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            user_id,
            active: true,
            started_at: now,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this subscription currently grants member access
    pub fn is_active(&self) -> bool {
        self.active && self.expires_at.map_or(true, |e| e > Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_without_expiry() {
        let sub = Subscription::new(1, None);
        assert!(sub.is_active());
    }

    #[test]
    fn test_active_with_future_expiry() {
        let sub = Subscription::new(1, Some(Utc::now() + Duration::days(30)));
        assert!(sub.is_active());
    }

    #[test]
    fn test_expired_subscription() {
        let mut sub = Subscription::new(1, Some(Utc::now() - Duration::days(1)));
        assert!(!sub.is_active());

        // Switching off also deactivates regardless of expiry
        sub.expires_at = None;
        sub.active = false;
        assert!(!sub.is_active());
    }
}
