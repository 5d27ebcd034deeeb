//! Redis Cache
//!
//! Shared store for multi-process deployments.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use super::{Cache, CacheError};

/// Redis-backed expiring cache
///
/// Keys are namespaced as `<prefix>:<key>` so several sites can share one
/// Redis database.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    key_prefix: String,
}

impl RedisCache {
    /// Create a client; no connection is opened until the first command
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        tracing::info!(prefix = %key_prefix, "Redis cache client created");
        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_conn(&self) -> Result<MultiplexedConnection, CacheError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Full key as stored in Redis
    pub fn make_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    /// Round-trip a PING to the server
    pub async fn health_check(&self) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl Cache for RedisCache {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(self.make_key(key)).await?;
        Ok(value)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        // SET EX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(self.make_key(key), value, seconds).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let _: () = conn.del(self.make_key(key)).await?;
        Ok(())
    }
}
