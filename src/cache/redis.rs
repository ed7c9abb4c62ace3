//! Redis cache implementation
//!
//! Provides a distributed cache using Redis for multi-instance deployments.
//!
//! # Features
//! - TTL-based expiration via Redis SETEX/EXPIRE commands
//! - Pattern-based deletion via SCAN + DEL (production-safe, not KEYS)
//! - Thread-safe async access

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Default TTL for cache entries (1 hour)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Number of keys to scan per iteration in delete_pattern
const SCAN_COUNT: usize = 100;

/// Redis cache implementation
///
/// Values are stored as JSON strings to support generic types.
pub struct RedisCache {
    /// Multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Default TTL for entries when not specified
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Create a new Redis cache with the given connection URL
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_ttl(redis_url, DEFAULT_TTL).await
    }

    /// Create a new Redis cache with custom default TTL
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn with_ttl(redis_url: &str, default_ttl: Duration) -> Result<Self> {
        let client = Client::open(redis_url).context("Failed to create Redis client")?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            connection,
            default_ttl,
        })
    }

    /// Get the default TTL for this cache
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[async_trait]
impl CacheLayer for RedisCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .context("Failed to get value from Redis")?;

        match value {
            Some(json) => {
                let parsed =
                    serde_json::from_str(&json).context("Failed to deserialize cache value")?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        let ttl_secs = ttl.as_secs().max(1);

        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, json, ttl_secs)
            .await
            .context("Failed to set value in Redis")?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key)
            .await
            .context("Failed to delete key from Redis")?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .context("Failed to scan Redis keys")?;

            if !keys.is_empty() {
                conn.del::<_, ()>(keys)
                    .await
                    .context("Failed to delete matched keys from Redis")?;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .context("Failed to clear Redis database")?;
        Ok(())
    }
}

// These tests require a running Redis server; run with
// REDIS_URL=redis://127.0.0.1:6379 cargo test --features redis-cache -- --ignored
#[cfg(test)]
mod tests {
    use super::*;

    async fn test_cache() -> RedisCache {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisCache::new(&url).await.expect("Redis connection")
    }

    #[tokio::test]
    #[ignore = "requires running Redis server"]
    async fn test_set_get_delete() {
        let cache = test_cache().await;

        cache
            .set("vitrine_test:key", &"value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("vitrine_test:key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));

        cache.delete("vitrine_test:key").await.unwrap();
        let result: Option<String> = cache.get("vitrine_test:key").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    #[ignore = "requires running Redis server"]
    async fn test_delete_pattern() {
        let cache = test_cache().await;

        cache
            .set("vitrine_test:a", &1i64, Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("vitrine_test:b", &2i64, Duration::from_secs(60))
            .await
            .unwrap();

        cache.delete_pattern("vitrine_test:*").await.unwrap();

        let a: Option<i64> = cache.get("vitrine_test:a").await.unwrap();
        assert_eq!(a, None);
    }
}
