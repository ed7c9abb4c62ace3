//! Viewer access context
//!
//! This module defines the access tier of the current viewer. The tier is
//! derived once per request from the session, role and subscription lookups,
//! and is consumed by the gallery visibility policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level of the current viewer.
///
/// Ordering matters for nothing; each tier is matched explicitly by the
/// visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// No authenticated session
    Anonymous,
    /// Authenticated, no active subscription
    Regular,
    /// Authenticated with an active, non-expired subscription
    Member,
    /// Administrator
    Admin,
}

impl Default for AccessTier {
    fn default() -> Self {
        Self::Anonymous
    }
}

impl AccessTier {
    /// Convert tier to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Anonymous => "anonymous",
            AccessTier::Regular => "regular",
            AccessTier::Member => "member",
            AccessTier::Admin => "admin",
        }
    }

    /// Whether this tier may view members-only photos
    pub fn can_view_exclusive(&self) -> bool {
        matches!(self, AccessTier::Member | AccessTier::Admin)
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anonymous" => Ok(AccessTier::Anonymous),
            "regular" => Ok(AccessTier::Regular),
            "member" => Ok(AccessTier::Member),
            "admin" => Ok(AccessTier::Admin),
            _ => Err(anyhow::anyhow!("Invalid access tier: {}", s)),
        }
    }
}

/// Per-request access context.
///
/// Never persisted and never cached; re-derived on each gallery load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// Resolved access tier
    pub tier: AccessTier,
    /// Authenticated user id, if any
    pub user_id: Option<i64>,
}

impl AccessContext {
    /// Context for an unauthenticated viewer
    pub fn anonymous() -> Self {
        Self {
            tier: AccessTier::Anonymous,
            user_id: None,
        }
    }

    /// Context for an authenticated viewer at the given tier
    pub fn authenticated(tier: AccessTier, user_id: i64) -> Self {
        Self {
            tier,
            user_id: Some(user_id),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.tier == AccessTier::Admin
    }
}

impl Default for AccessContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_str() {
        assert_eq!(AccessTier::from_str("member").unwrap(), AccessTier::Member);
        assert_eq!(AccessTier::from_str("ADMIN").unwrap(), AccessTier::Admin);
        assert!(AccessTier::from_str("vip").is_err());
    }

    #[test]
    fn test_can_view_exclusive() {
        assert!(!AccessTier::Anonymous.can_view_exclusive());
        assert!(!AccessTier::Regular.can_view_exclusive());
        assert!(AccessTier::Member.can_view_exclusive());
        assert!(AccessTier::Admin.can_view_exclusive());
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = AccessContext::anonymous();
        assert_eq!(ctx.tier, AccessTier::Anonymous);
        assert_eq!(ctx.user_id, None);
        assert!(!ctx.is_admin());
    }
}
