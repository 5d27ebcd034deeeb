//! Cache module
//!
//! Expiring key/value stores used to memoize computed results.
//! Values are stored as JSON text so any backend can hold them.

mod error;
mod fail_open;
mod memory;
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{CacheBackend, Config};

pub use error::CacheError;
pub use fail_open::FailOpen;
pub use memory::MemoryCache;
pub use redis_store::RedisCache;

/// Expiring key/value store
///
/// Single-key `get`/`set` are expected to be atomic; callers do no locking
/// of their own.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a live entry, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store an entry that expires after `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry if present
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache that never stores anything
///
/// Every lookup is a miss, so callers always recompute.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Build the cache backend selected by configuration
///
/// Redis is pinged once. When `cache_ignore_errors` is set an unreachable
/// server is only logged and the backend is wrapped in [`FailOpen`], so it
/// degrades to cache misses instead of failed requests.
pub async fn from_config(config: &Config) -> Result<Arc<dyn Cache>, CacheError> {
    let cache: Arc<dyn Cache> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::None => Arc::new(NoopCache),
        CacheBackend::Redis => {
            let redis = RedisCache::new(&config.redis_url, &config.cache_key_prefix)?;
            if config.cache_ignore_errors {
                if let Err(e) = redis.health_check().await {
                    tracing::warn!(error = %e, "Redis unreachable, statistics will be recomputed until it recovers");
                }
                Arc::new(FailOpen::new(redis))
            } else {
                redis.health_check().await?;
                Arc::new(redis)
            }
        }
    };

    tracing::info!(
        backend = %config.cache_backend,
        ignore_errors = config.cache_ignore_errors,
        "Cache backend configured"
    );

    Ok(cache)
}
