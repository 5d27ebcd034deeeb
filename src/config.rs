//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Process-local map
    Memory,
    /// Shared Redis server
    Redis,
    /// No caching, every request recomputes
    None,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            "none" | "dummy" => Ok(CacheBackend::None),
            _ => Err(ConfigError::InvalidValue("CACHE_BACKEND")),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
            CacheBackend::None => write!(f, "none"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Which cache backend holds computed statistics
    pub cache_backend: CacheBackend,

    /// Redis connection URL, used when `cache_backend` is Redis
    pub redis_url: String,

    /// Namespace prepended to cache keys
    pub cache_key_prefix: String,

    /// Treat cache backend failures as misses instead of errors
    pub cache_ignore_errors: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let cache_backend: CacheBackend = lookup("CACHE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .parse()?;

        let redis_url =
            lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379/1".to_string());

        let cache_key_prefix = lookup("CACHE_KEY_PREFIX").unwrap_or_else(|| "aime".to_string());

        let cache_ignore_errors = parse_bool(lookup("CACHE_IGNORE_ERRORS"), true)
            .ok_or(ConfigError::InvalidValue("CACHE_IGNORE_ERRORS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            cache_backend,
            redis_url,
            cache_key_prefix,
            cache_ignore_errors,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Option<bool> {
    match value {
        None => Some(default),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        },
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
