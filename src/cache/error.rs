//! Cache Errors

/// Errors raised by cache backends
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Redis command or connection failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
