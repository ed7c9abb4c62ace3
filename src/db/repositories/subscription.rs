//! Subscription repository
//!
//! Database operations for member subscriptions. The `has_active` lookup is
//! the one the access resolver depends on; it pushes the expiry check into
//! SQL so the caller never sees stale rows.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Subscription;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Create a new subscription
    async fn create(&self, subscription: &Subscription) -> Result<Subscription>;

    /// Get a subscription by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Subscription>>;

    /// Get the most recent subscription for a user
    async fn get_for_user(&self, user_id: i64) -> Result<Option<Subscription>>;

    /// Whether the user holds an active, non-expired subscription
    async fn has_active(&self, user_id: i64) -> Result<bool>;

    /// List all subscriptions
    async fn list(&self) -> Result<Vec<Subscription>>;

    /// Update a subscription
    async fn update(&self, subscription: &Subscription) -> Result<Subscription>;

    /// Delete a subscription
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based subscription repository implementation
pub struct SqlxSubscriptionRepository {
    pool: DynDatabasePool,
}

impl SqlxSubscriptionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SubscriptionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubscriptionRepository for SqlxSubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<Subscription> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(self.pool.as_sqlite().unwrap(), subscription).await
            }
            DatabaseDriver::Postgres => {
                create_postgres(self.pool.as_postgres().unwrap(), subscription).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Subscription>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => {
                get_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn get_for_user(&self, user_id: i64) -> Result<Option<Subscription>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Postgres => {
                get_for_user_postgres(self.pool.as_postgres().unwrap(), user_id).await
            }
        }
    }

    async fn has_active(&self, user_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                has_active_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Postgres => {
                has_active_postgres(self.pool.as_postgres().unwrap(), user_id).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Postgres => list_postgres(self.pool.as_postgres().unwrap()).await,
        }
    }

    async fn update(&self, subscription: &Subscription) -> Result<Subscription> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_sqlite(self.pool.as_sqlite().unwrap(), subscription).await
            }
            DatabaseDriver::Postgres => {
                update_postgres(self.pool.as_postgres().unwrap(), subscription).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => delete_postgres(self.pool.as_postgres().unwrap(), id).await,
        }
    }
}

const COLUMNS: &str = "id, user_id, active, started_at, expires_at, created_at, updated_at";

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, sub: &Subscription) -> Result<Subscription> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, active, started_at, expires_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(sub.user_id)
    .bind(sub.active)
    .bind(sub.started_at)
    .bind(sub.expires_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create subscription")?;

    Ok(Subscription {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..sub.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Subscription>> {
    let row = sqlx::query(&format!("SELECT {} FROM subscriptions WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get subscription")?;
    Ok(row.map(|r| row_to_subscription_sqlite(&r)))
}

async fn get_for_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<Subscription>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM subscriptions WHERE user_id = ? ORDER BY started_at DESC LIMIT 1",
        COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get subscription for user")?;
    Ok(row.map(|r| row_to_subscription_sqlite(&r)))
}

async fn has_active_sqlite(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM subscriptions WHERE user_id = ? AND active = 1 AND (expires_at IS NULL OR expires_at > ?)",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to check active subscription")?;
    Ok(row.get::<i64, _>("count") > 0)
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Subscription>> {
    let rows = sqlx::query(&format!("SELECT {} FROM subscriptions ORDER BY id", COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list subscriptions")?;
    Ok(rows.iter().map(row_to_subscription_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, sub: &Subscription) -> Result<Subscription> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE subscriptions SET active = ?, expires_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(sub.active)
    .bind(sub.expires_at)
    .bind(now)
    .bind(sub.id)
    .execute(pool)
    .await
    .context("Failed to update subscription")?;

    get_by_id_sqlite(pool, sub.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Subscription not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM subscriptions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete subscription")?;
    Ok(())
}

fn row_to_subscription_sqlite(row: &sqlx::sqlite::SqliteRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        active: row.get("active"),
        started_at: row.get("started_at"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// PostgreSQL implementations

async fn create_postgres(pool: &PgPool, sub: &Subscription) -> Result<Subscription> {
    let now = Utc::now();
    let row = sqlx::query(
        "INSERT INTO subscriptions (user_id, active, started_at, expires_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(sub.user_id)
    .bind(sub.active)
    .bind(sub.started_at)
    .bind(sub.expires_at)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create subscription")?;

    Ok(Subscription {
        id: row.get("id"),
        created_at: now,
        updated_at: now,
        ..sub.clone()
    })
}

async fn get_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Subscription>> {
    let row = sqlx::query(&format!("SELECT {} FROM subscriptions WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get subscription")?;
    Ok(row.map(|r| row_to_subscription_postgres(&r)))
}

async fn get_for_user_postgres(pool: &PgPool, user_id: i64) -> Result<Option<Subscription>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM subscriptions WHERE user_id = $1 ORDER BY started_at DESC LIMIT 1",
        COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get subscription for user")?;
    Ok(row.map(|r| row_to_subscription_postgres(&r)))
}

async fn has_active_postgres(pool: &PgPool, user_id: i64) -> Result<bool> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM subscriptions WHERE user_id = $1 AND active = TRUE AND (expires_at IS NULL OR expires_at > $2)",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to check active subscription")?;
    Ok(row.get::<i64, _>("count") > 0)
}

async fn list_postgres(pool: &PgPool) -> Result<Vec<Subscription>> {
    let rows = sqlx::query(&format!("SELECT {} FROM subscriptions ORDER BY id", COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list subscriptions")?;
    Ok(rows.iter().map(row_to_subscription_postgres).collect())
}

async fn update_postgres(pool: &PgPool, sub: &Subscription) -> Result<Subscription> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE subscriptions SET active = $1, expires_at = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(sub.active)
    .bind(sub.expires_at)
    .bind(now)
    .bind(sub.id)
    .execute(pool)
    .await
    .context("Failed to update subscription")?;

    get_by_id_postgres(pool, sub.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Subscription not found after update"))
}

async fn delete_postgres(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete subscription")?;
    Ok(())
}

fn row_to_subscription_postgres(row: &sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        active: row.get("active"),
        started_at: row.get("started_at"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::Duration;

    async fn setup() -> (SqlxSubscriptionRepository, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "member".to_string(),
                "member@example.com".to_string(),
                "hash".to_string(),
                UserRole::User,
            ))
            .await
            .unwrap();

        (SqlxSubscriptionRepository::new(pool), user.id)
    }

    #[tokio::test]
    async fn test_active_subscription_detected() {
        let (repo, user_id) = setup().await;

        repo.create(&Subscription::new(user_id, None)).await.unwrap();
        assert!(repo.has_active(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_subscription_not_active() {
        let (repo, user_id) = setup().await;

        let mut sub = Subscription::new(user_id, Some(Utc::now() - Duration::days(1)));
        sub.started_at = Utc::now() - Duration::days(30);
        repo.create(&sub).await.unwrap();

        assert!(!repo.has_active(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_flag_not_active() {
        let (repo, user_id) = setup().await;

        let mut sub = Subscription::new(user_id, None);
        sub.active = false;
        repo.create(&sub).await.unwrap();

        assert!(!repo.has_active(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_deactivates() {
        let (repo, user_id) = setup().await;

        let created = repo.create(&Subscription::new(user_id, None)).await.unwrap();
        assert!(repo.has_active(user_id).await.unwrap());

        let mut sub = created.clone();
        sub.active = false;
        repo.update(&sub).await.unwrap();
        assert!(!repo.has_active(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_subscription_not_active() {
        let (repo, user_id) = setup().await;
        assert!(!repo.has_active(user_id).await.unwrap());
    }
}
