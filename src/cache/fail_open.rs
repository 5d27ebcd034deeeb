//! Fail-open Cache Wrapper

use std::time::Duration;

use async_trait::async_trait;

use super::{Cache, CacheError};

/// Absorbs backend errors from the wrapped cache
///
/// Failed reads become misses and failed writes are dropped, each logged at
/// warn level. The wrapper itself never returns an error.
#[derive(Debug, Clone)]
pub struct FailOpen<C> {
    inner: C,
}

impl<C: Cache> FailOpen<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: Cache> Cache for FailOpen<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.inner.get(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if let Err(e) = self.inner.set(key, value, ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed, value not stored");
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        if let Err(e) = self.inner.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache delete failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn refused() -> CacheError {
        CacheError::from(redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }

    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(refused())
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(refused())
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(refused())
        }
    }

    #[tokio::test]
    async fn test_errors_are_absorbed() {
        assert!(BrokenCache.get("k").await.is_err());
        let cache = FailOpen::new(BrokenCache);

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.set("k", "v".to_string(), Duration::from_secs(1)).await.is_ok());
        assert!(cache.delete("k").await.is_ok());
    }

    #[tokio::test]
    async fn test_healthy_backend_passes_through() {
        let cache = FailOpen::new(MemoryCache::new());
        cache.set("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }
}
