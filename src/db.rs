//! Database module
//!
//! Connection and schema checks for the site database.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::source::REQUIRED_TABLES;

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check that every table read by the statistics exists
///
/// The tables are owned by the site's own migrations; this service never
/// creates them.
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let mut complete = true;

    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables 
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            complete = false;
        }
    }

    Ok(complete)
}
