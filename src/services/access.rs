//! Access context resolution
//!
//! Derives the viewer's access tier for a request: anonymous viewers stay
//! anonymous, admins resolve from their role, and everyone else is a member
//! exactly when they hold an active, non-expired subscription.
//!
//! Lookup failures degrade to the least-privileged tier consistent with what
//! is known: a failed role lookup yields `regular`, a failed subscription
//! lookup yields `regular`, never `member` or `admin`. The tier is re-derived
//! on every call; nothing here is cached.

use crate::db::repositories::{SubscriptionRepository, UserRepository};
use crate::models::{AccessContext, AccessTier, User};
use std::sync::Arc;

/// Resolves the access tier of the current viewer.
pub struct AccessResolver {
    user_repo: Arc<dyn UserRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
}

impl AccessResolver {
    /// Create a new access resolver over the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        subscription_repo: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
        }
    }

    /// Resolve the access context for an optional authenticated user id.
    ///
    /// `None` means no session is present and resolves to anonymous. A
    /// session pointing at a deleted or banned user also resolves to
    /// anonymous: such sessions hold no privileges.
    pub async fn resolve(&self, user_id: Option<i64>) -> AccessContext {
        let Some(user_id) = user_id else {
            return AccessContext::anonymous();
        };

        let user = match self.user_repo.get_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return AccessContext::anonymous(),
            Err(e) => {
                tracing::warn!("Role lookup failed for user {}: {:#}", user_id, e);
                return AccessContext::authenticated(AccessTier::Regular, user_id);
            }
        };

        self.resolve_for_user(&user).await
    }

    /// Resolve the access context for an already-loaded user.
    ///
    /// Used by handlers where the auth middleware has the user in hand, so
    /// only the subscription lookup remains.
    pub async fn resolve_for_user(&self, user: &User) -> AccessContext {
        if user.is_banned() {
            return AccessContext::anonymous();
        }

        if user.is_admin() {
            return AccessContext::authenticated(AccessTier::Admin, user.id);
        }

        match self.subscription_repo.has_active(user.id).await {
            Ok(true) => AccessContext::authenticated(AccessTier::Member, user.id),
            Ok(false) => AccessContext::authenticated(AccessTier::Regular, user.id),
            Err(e) => {
                tracing::warn!("Subscription lookup failed for user {}: {:#}", user.id, e);
                AccessContext::authenticated(AccessTier::Regular, user.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Subscription, UserRole};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// User repository double with switchable failure
    struct StubUserRepo {
        user: Option<User>,
        fail: AtomicBool,
    }

    impl StubUserRepo {
        fn with_user(user: User) -> Self {
            Self {
                user: Some(user),
                fail: AtomicBool::new(false),
            }
        }

        fn empty() -> Self {
            Self {
                user: None,
                fail: AtomicBool::new(false),
            }
        }

        fn failing(self) -> Self {
            self.fail.store(true, Ordering::SeqCst);
            self
        }
    }

    #[async_trait]
    impl UserRepository for StubUserRepo {
        async fn create(&self, _user: &User) -> Result<User> {
            unimplemented!()
        }

        async fn get_by_id(&self, _id: i64) -> Result<Option<User>> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("connection reset");
            }
            Ok(self.user.clone())
        }

        async fn get_by_username(&self, _username: &str) -> Result<Option<User>> {
            Ok(self.user.clone())
        }

        async fn get_by_email(&self, _email: &str) -> Result<Option<User>> {
            Ok(self.user.clone())
        }

        async fn update(&self, _user: &User) -> Result<User> {
            unimplemented!()
        }

        async fn delete(&self, _id: i64) -> Result<()> {
            unimplemented!()
        }

        async fn count(&self) -> Result<i64> {
            Ok(self.user.iter().count() as i64)
        }

        async fn list(&self) -> Result<Vec<User>> {
            Ok(self.user.clone().into_iter().collect())
        }
    }

    /// Subscription repository double with switchable failure
    struct StubSubscriptionRepo {
        active: bool,
        fail: bool,
    }

    #[async_trait]
    impl SubscriptionRepository for StubSubscriptionRepo {
        async fn create(&self, _subscription: &Subscription) -> Result<Subscription> {
            unimplemented!()
        }

        async fn get_by_id(&self, _id: i64) -> Result<Option<Subscription>> {
            Ok(None)
        }

        async fn get_for_user(&self, _user_id: i64) -> Result<Option<Subscription>> {
            Ok(None)
        }

        async fn has_active(&self, _user_id: i64) -> Result<bool> {
            if self.fail {
                anyhow::bail!("service unavailable");
            }
            Ok(self.active)
        }

        async fn list(&self) -> Result<Vec<Subscription>> {
            Ok(Vec::new())
        }

        async fn update(&self, _subscription: &Subscription) -> Result<Subscription> {
            unimplemented!()
        }

        async fn delete(&self, _id: i64) -> Result<()> {
            unimplemented!()
        }
    }

    fn user_with_role(role: UserRole) -> User {
        let mut user = User::new(
            "viewer".to_string(),
            "viewer@example.com".to_string(),
            "hash".to_string(),
            role,
        );
        user.id = 42;
        user
    }

    fn resolver(users: StubUserRepo, subs: StubSubscriptionRepo) -> AccessResolver {
        AccessResolver::new(Arc::new(users), Arc::new(subs))
    }

    #[tokio::test]
    async fn test_no_session_is_anonymous() {
        let r = resolver(
            StubUserRepo::empty(),
            StubSubscriptionRepo { active: true, fail: false },
        );
        let ctx = r.resolve(None).await;
        assert_eq!(ctx.tier, AccessTier::Anonymous);
    }

    #[tokio::test]
    async fn test_admin_role_wins() {
        let r = resolver(
            StubUserRepo::with_user(user_with_role(UserRole::Admin)),
            StubSubscriptionRepo { active: false, fail: false },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Admin);
        assert_eq!(ctx.user_id, Some(42));
    }

    #[tokio::test]
    async fn test_active_subscription_is_member() {
        let r = resolver(
            StubUserRepo::with_user(user_with_role(UserRole::User)),
            StubSubscriptionRepo { active: true, fail: false },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Member);
    }

    #[tokio::test]
    async fn test_no_subscription_is_regular() {
        let r = resolver(
            StubUserRepo::with_user(user_with_role(UserRole::User)),
            StubSubscriptionRepo { active: false, fail: false },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Regular);
    }

    #[tokio::test]
    async fn test_role_lookup_failure_degrades_to_regular() {
        let r = resolver(
            StubUserRepo::with_user(user_with_role(UserRole::Admin)).failing(),
            StubSubscriptionRepo { active: true, fail: false },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Regular);
    }

    #[tokio::test]
    async fn test_subscription_lookup_failure_degrades_to_regular() {
        let r = resolver(
            StubUserRepo::with_user(user_with_role(UserRole::User)),
            StubSubscriptionRepo { active: true, fail: true },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Regular);
    }

    #[tokio::test]
    async fn test_banned_user_is_anonymous() {
        let mut user = user_with_role(UserRole::User);
        user.status = crate::models::UserStatus::Banned;
        let r = resolver(
            StubUserRepo::with_user(user),
            StubSubscriptionRepo { active: true, fail: false },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Anonymous);
    }

    #[tokio::test]
    async fn test_stale_session_user_is_anonymous() {
        let r = resolver(
            StubUserRepo::empty(),
            StubSubscriptionRepo { active: true, fail: false },
        );
        let ctx = r.resolve(Some(42)).await;
        assert_eq!(ctx.tier, AccessTier::Anonymous);
    }
}
