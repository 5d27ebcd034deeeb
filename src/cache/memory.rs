//! In-memory Cache
//!
//! Process-local store for single-instance deployments.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;

use super::{Cache, CacheError};

/// Upper bound on stored entries
const MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-local expiring cache backed by moka
#[derive(Clone)]
pub struct MemoryCache {
    entries: moka::future::Cache<String, Entry>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        let entries = moka::future::Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .expire_after(EntryTtl)
            .build();
        Self { entries }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_get_returns_stored_value() {
        let cache = MemoryCache::new();
        cache.set("stats", "{}".to_string(), TTL).await.unwrap();

        assert_eq!(cache.get("stats").await.unwrap(), Some("{}".to_string()));
        assert_eq!(cache.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("short", "a".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        cache.set("long", "b".to_string(), TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrites_value_and_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("stats", "old".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        cache.set("stats", "new".to_string(), TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.get("stats").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("stats", "{}".to_string(), TTL).await.unwrap();
        cache.delete("stats").await.unwrap();

        assert_eq!(cache.get("stats").await.unwrap(), None);
    }
}
