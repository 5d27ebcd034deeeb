//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// Minimal copies of the site tables read by the statistics
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS auth_user (
    id SERIAL PRIMARY KEY,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);
CREATE TABLE IF NOT EXISTS main_donation (
    id SERIAL PRIMARY KEY,
    amount NUMERIC(12, 2) NOT NULL,
    status VARCHAR(20) NOT NULL,
    donor_email VARCHAR(254)
);
CREATE TABLE IF NOT EXISTS main_userprofile (
    id SERIAL PRIMARY KEY,
    role VARCHAR(20) NOT NULL,
    latitude NUMERIC(9, 6),
    longitude NUMERIC(9, 6)
);
CREATE TABLE IF NOT EXISTS main_mbcparticipant (
    id SERIAL PRIMARY KEY,
    status VARCHAR(20) NOT NULL
);
CREATE TABLE IF NOT EXISTS main_project (
    id SERIAL PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status VARCHAR(20) NOT NULL
);
CREATE TABLE IF NOT EXISTS main_event (
    id SERIAL PRIMARY KEY,
    event_type VARCHAR(20) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);
CREATE TABLE IF NOT EXISTS main_impactpoint (
    id SERIAL PRIMARY KEY,
    latitude NUMERIC(9, 6),
    longitude NUMERIC(9, 6)
);
CREATE TABLE IF NOT EXISTS main_eventparticipation (
    id SERIAL PRIMARY KEY,
    status VARCHAR(20) NOT NULL
);
CREATE TABLE IF NOT EXISTS main_staffcontribution (
    id SERIAL PRIMARY KEY,
    amount NUMERIC(12, 2) NOT NULL,
    is_recorded BOOLEAN NOT NULL DEFAULT FALSE
);
"#;

/// Setup test database - create missing tables and truncate them
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    pool.execute(SCHEMA).await.expect("Failed to create schema");

    sqlx::query(
        r#"
        TRUNCATE TABLE auth_user, main_donation, main_userprofile, main_mbcparticipant,
            main_project, main_event, main_impactpoint, main_eventparticipation,
            main_staffcontribution
        "#,
    )
    .execute(&pool)
    .await
    .expect("Failed to clean up DB");

    pool
}

/// Run a batch of seed statements
pub async fn seed(pool: &PgPool, sql: &str) {
    pool.execute(sql).await.expect("Failed to seed data");
}
