//! Statistics module
//!
//! Site-wide counters computed from the database and memoized in the cache.

mod service;

pub use service::{
    StatisticsError, StatisticsService, CACHE_KEY, CACHE_TTL, SCHOOL_DESCRIPTION_KEYWORDS,
    SCHOOL_NAME_KEYWORDS,
};
