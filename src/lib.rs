//! AIME statistics library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod display;
pub mod domain;
pub mod jobs;
pub mod source;
pub mod statistics;

mod error;

pub use config::Config;
pub use domain::SiteStatistics;
pub use error::{AppError, AppResult, ErrorResponse};
pub use statistics::{StatisticsError, StatisticsService};
