//! Subscription service
//!
//! Admin-facing management of member subscriptions. The access resolver
//! talks to the repository directly; this service backs the admin screens.

use crate::db::repositories::{SubscriptionRepository, UserRepository};
use crate::models::Subscription;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for subscription operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("Subscription not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Subscription service
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { repo, user_repo }
    }

    /// Grant a subscription to a user.
    pub async fn grant(
        &self,
        user_id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Subscription, SubscriptionServiceError> {
        if self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load user")?
            .is_none()
        {
            return Err(SubscriptionServiceError::UserNotFound);
        }

        if let Some(expiry) = expires_at {
            if expiry <= Utc::now() {
                return Err(SubscriptionServiceError::ValidationError(
                    "Expiry must lie in the future".to_string(),
                ));
            }
        }

        Ok(self
            .repo
            .create(&Subscription::new(user_id, expires_at))
            .await
            .context("Failed to create subscription")?)
    }

    /// Switch a subscription off without deleting its history.
    pub async fn cancel(&self, id: i64) -> Result<Subscription, SubscriptionServiceError> {
        let mut sub = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load subscription")?
            .ok_or(SubscriptionServiceError::NotFound)?;

        sub.active = false;
        Ok(self
            .repo
            .update(&sub)
            .await
            .context("Failed to update subscription")?)
    }

    /// Extend (or shorten) a subscription's expiry.
    pub async fn set_expiry(
        &self,
        id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Subscription, SubscriptionServiceError> {
        let mut sub = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load subscription")?
            .ok_or(SubscriptionServiceError::NotFound)?;

        sub.expires_at = expires_at;
        Ok(self
            .repo
            .update(&sub)
            .await
            .context("Failed to update subscription")?)
    }

    pub async fn get_for_user(&self, user_id: i64) -> Result<Option<Subscription>> {
        self.repo.get_for_user(user_id).await
    }

    pub async fn has_active(&self, user_id: i64) -> Result<bool> {
        self.repo.has_active(user_id).await
    }

    pub async fn list(&self) -> Result<Vec<Subscription>> {
        self.repo.list().await
    }

    pub async fn delete(&self, id: i64) -> Result<(), SubscriptionServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load subscription")?
            .is_none()
        {
            return Err(SubscriptionServiceError::NotFound);
        }
        self.repo
            .delete(id)
            .await
            .context("Failed to delete subscription")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxSubscriptionRepository, SqlxUserRepository, UserRepository as _,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::Duration;

    async fn setup() -> (SubscriptionService, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let user_repo = Arc::new(SqlxUserRepository::new(pool.clone()));
        let user = user_repo
            .create(&User::new(
                "member".to_string(),
                "member@example.com".to_string(),
                "hash".to_string(),
                UserRole::User,
            ))
            .await
            .unwrap();

        let service = SubscriptionService::new(
            Arc::new(SqlxSubscriptionRepository::new(pool)),
            user_repo,
        );
        (service, user.id)
    }

    #[tokio::test]
    async fn test_grant_and_cancel() {
        let (service, user_id) = setup().await;

        let sub = service.grant(user_id, None).await.unwrap();
        assert!(service.has_active(user_id).await.unwrap());

        service.cancel(sub.id).await.unwrap();
        assert!(!service.has_active(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_unknown_user() {
        let (service, _) = setup().await;
        let result = service.grant(9999, None).await;
        assert!(matches!(result, Err(SubscriptionServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_grant_past_expiry_rejected() {
        let (service, user_id) = setup().await;
        let result = service
            .grant(user_id, Some(Utc::now() - Duration::days(1)))
            .await;
        assert!(matches!(
            result,
            Err(SubscriptionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_set_expiry() {
        let (service, user_id) = setup().await;
        let sub = service.grant(user_id, None).await.unwrap();

        service
            .set_expiry(sub.id, Some(Utc::now() - Duration::seconds(1)))
            .await
            .unwrap();
        assert!(!service.has_active(user_id).await.unwrap());
    }
}
