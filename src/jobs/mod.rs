//! Maintenance Jobs
//!
//! Database housekeeping run by the `optimize_db` command: VACUUM, ANALYZE,
//! REINDEX, expired session cleanup, and a size report.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool};

use crate::cache::Cache;
use crate::config::CacheBackend;
use crate::statistics::CACHE_KEY;

/// Which steps an optimization run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Use `VACUUM FULL` (rewrites tables, takes exclusive locks)
    pub full_vacuum: bool,
    /// Rebuild every index of the current database
    pub reindex: bool,
    /// Drop the cached statistics snapshot
    pub clear_cache: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            full_vacuum: false,
            reindex: true,
            clear_cache: false,
        }
    }
}

impl OptimizeOptions {
    /// Parse command-line flags (`--full`, `--no-reindex`, `--clear-cache`)
    pub fn from_args<I, S>(args: I) -> Result<Self, JobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for arg in args {
            match arg.as_ref() {
                "--full" => options.full_vacuum = true,
                "--no-reindex" => options.reindex = false,
                "--clear-cache" => options.clear_cache = true,
                other => return Err(JobError::UnknownArgument(other.to_string())),
            }
        }
        Ok(options)
    }
}

/// Size of one table, as reported after optimization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSize {
    pub table_name: String,
    pub total_size: String,
}

/// Report from an optimization run
#[derive(Debug, Clone, Default)]
pub struct OptimizeReport {
    pub database_size: String,
    pub largest_tables: Vec<TableSize>,
    pub sessions_deleted: u64,
    pub cache_cleared: bool,
    /// Non-fatal problems (session cleanup, cache)
    pub warnings: Vec<String>,
    pub elapsed: Duration,
    pub completed_at: DateTime<Utc>,
}

impl fmt::Display for OptimizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Optimization Report ===")?;
        writeln!(f, "Database size: {}", self.database_size)?;
        writeln!(f, "Expired sessions removed: {}", self.sessions_deleted)?;
        if self.cache_cleared {
            writeln!(f, "Statistics cache cleared")?;
        }
        writeln!(f, "Largest tables:")?;
        for table in &self.largest_tables {
            writeln!(f, "  {:<32} {}", table.table_name, table.total_size)?;
        }
        for warning in &self.warnings {
            writeln!(f, "Warning: {}", warning)?;
        }
        writeln!(f, "Time: {:.2}s", self.elapsed.as_secs_f64())?;
        write!(f, "Completed at: {}", self.completed_at.to_rfc3339())
    }
}

/// Run VACUUM (or VACUUM FULL)
pub async fn vacuum(pool: &PgPool, full: bool) -> Result<(), JobError> {
    let sql = if full { "VACUUM FULL" } else { "VACUUM" };
    tracing::info!(full = full, "Running VACUUM");
    // Simple protocol: VACUUM refuses to run inside an implicit transaction
    pool.execute(sql).await?;
    Ok(())
}

/// Refresh planner statistics
pub async fn analyze(pool: &PgPool) -> Result<(), JobError> {
    tracing::info!("Running ANALYZE");
    pool.execute("ANALYZE").await?;
    Ok(())
}

/// Rebuild the indexes of the current database
pub async fn reindex_database(pool: &PgPool) -> Result<String, JobError> {
    let name: String = sqlx::query_scalar("SELECT current_database()")
        .fetch_one(pool)
        .await?;

    tracing::info!(database = %name, "Running REINDEX");
    let sql = format!("REINDEX DATABASE {}", quote_identifier(&name));
    pool.execute(sql.as_str()).await?;

    Ok(name)
}

/// Delete expired web sessions
///
/// Returns `Ok(None)` when the session table does not exist.
pub async fn delete_expired_sessions(pool: &PgPool) -> Result<Option<u64>, JobError> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = 'django_session'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !exists {
        return Ok(None);
    }

    let result = sqlx::query("DELETE FROM django_session WHERE expire_date < NOW()")
        .execute(pool)
        .await?;

    let rows_deleted = result.rows_affected();
    if rows_deleted > 0 {
        tracing::info!(rows_deleted = rows_deleted, "Deleted expired sessions");
    }

    Ok(Some(rows_deleted))
}

/// Human-readable size of the current database
pub async fn database_size(pool: &PgPool) -> Result<String, JobError> {
    let size: String =
        sqlx::query_scalar("SELECT pg_size_pretty(pg_database_size(current_database()))")
            .fetch_one(pool)
            .await?;
    Ok(size)
}

/// Largest tables of the public schema by total size, indexes included
pub async fn largest_tables(pool: &PgPool, limit: i64) -> Result<Vec<TableSize>, JobError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT c.relname::text, pg_size_pretty(pg_total_relation_size(c.oid))
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = 'public' AND c.relkind = 'r'
        ORDER BY pg_total_relation_size(c.oid) DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(table_name, total_size)| TableSize {
            table_name,
            total_size,
        })
        .collect())
}

/// Drop the cached statistics snapshot
///
/// Only a shared backend can be cleared from this process. The memory
/// backend belongs to the running server, so clearing a fresh one here would
/// change nothing; that case is reported as a warning instead.
pub async fn clear_statistics_cache(cache: &dyn Cache, backend: CacheBackend, report: &mut OptimizeReport) {
    match backend {
        CacheBackend::Redis => match cache.delete(CACHE_KEY).await {
            Ok(()) => {
                tracing::info!(key = CACHE_KEY, "Cleared statistics cache");
                report.cache_cleared = true;
            }
            Err(e) => report.warnings.push(format!("Cache clear: {}", e)),
        },
        CacheBackend::Memory => report.warnings.push(
            "Cache clear: memory backend is local to the server process, nothing cleared".to_string(),
        ),
        CacheBackend::None => report
            .warnings
            .push("Cache clear: caching is disabled, nothing to clear".to_string()),
    }
}

/// Run every optimization step selected by `options`
///
/// VACUUM, ANALYZE and REINDEX failures abort the run. Cache and session
/// cleanup failures are collected as warnings.
pub async fn optimize_database(
    pool: &PgPool,
    cache: &dyn Cache,
    backend: CacheBackend,
    options: OptimizeOptions,
) -> Result<OptimizeReport, JobError> {
    let started = Instant::now();
    let mut report = OptimizeReport::default();

    if options.clear_cache {
        clear_statistics_cache(cache, backend, &mut report).await;
    }

    vacuum(pool, options.full_vacuum).await?;
    analyze(pool).await?;
    if options.reindex {
        reindex_database(pool).await?;
    }

    match delete_expired_sessions(pool).await {
        Ok(Some(count)) => report.sessions_deleted = count,
        Ok(None) => report.warnings.push("Session table not found".to_string()),
        Err(e) => report.warnings.push(format!("Session cleanup: {}", e)),
    }

    report.database_size = database_size(pool).await?;
    report.largest_tables = largest_tables(pool, 5).await?;
    report.elapsed = started.elapsed();
    report.completed_at = Utc::now();

    tracing::info!(
        elapsed_ms = %report.elapsed.as_millis(),
        database_size = %report.database_size,
        "Database optimization completed"
    );

    Ok(report)
}

/// Quote an SQL identifier, doubling embedded quotes
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[test]
    fn test_options_default() {
        let options = OptimizeOptions::default();
        assert!(!options.full_vacuum);
        assert!(options.reindex);
        assert!(!options.clear_cache);
    }

    #[test]
    fn test_options_from_args() {
        let options = OptimizeOptions::from_args(["--full", "--clear-cache", "--no-reindex"]).unwrap();
        assert!(options.full_vacuum);
        assert!(options.clear_cache);
        assert!(!options.reindex);
    }

    #[test]
    fn test_options_reject_unknown_argument() {
        let err = OptimizeOptions::from_args(["--vacuum-everything"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown argument: --vacuum-everything");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("aime"), "\"aime\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_report_default() {
        let report = OptimizeReport::default();
        assert_eq!(report.sessions_deleted, 0);
        assert!(report.warnings.is_empty());
        assert!(!report.cache_cleared);
    }

    async fn cache_with_snapshot() -> MemoryCache {
        let cache = MemoryCache::new();
        cache
            .set(CACHE_KEY, "{}".to_string(), Duration::from_secs(300))
            .await
            .unwrap();
        cache
    }

    #[tokio::test]
    async fn test_clear_cache_on_shared_backend() {
        let cache = cache_with_snapshot().await;
        let mut report = OptimizeReport::default();

        clear_statistics_cache(&cache, CacheBackend::Redis, &mut report).await;

        assert!(report.cache_cleared);
        assert!(report.warnings.is_empty());
        assert_eq!(cache.get(CACHE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_cache_on_process_local_backend_is_not_reported_as_cleared() {
        let cache = cache_with_snapshot().await;
        let mut report = OptimizeReport::default();

        clear_statistics_cache(&cache, CacheBackend::Memory, &mut report).await;

        assert!(!report.cache_cleared);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("memory backend"));
    }

    #[tokio::test]
    async fn test_clear_cache_with_caching_disabled() {
        let mut report = OptimizeReport::default();

        clear_statistics_cache(&crate::cache::NoopCache, CacheBackend::None, &mut report).await;

        assert!(!report.cache_cleared);
        assert!(report.warnings[0].contains("disabled"));
    }

    #[test]
    fn test_report_display_includes_completion_time() {
        let report = OptimizeReport {
            database_size: "12 MB".to_string(),
            largest_tables: vec![TableSize {
                table_name: "main_donation".to_string(),
                total_size: "4096 kB".to_string(),
            }],
            sessions_deleted: 7,
            cache_cleared: true,
            warnings: vec!["Session table not found".to_string()],
            elapsed: Duration::from_millis(1500),
            completed_at: DateTime::parse_from_rfc3339("2024-03-01T02:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let text = report.to_string();

        assert!(text.contains("Database size: 12 MB"));
        assert!(text.contains("Expired sessions removed: 7"));
        assert!(text.contains("Statistics cache cleared"));
        assert!(text.contains("main_donation"));
        assert!(text.contains("Warning: Session table not found"));
        assert!(text.contains("Time: 1.50s"));
        assert!(text.ends_with("Completed at: 2024-03-01T02:00:00+00:00"));
    }
}
