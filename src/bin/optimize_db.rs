//! Database optimization command
//!
//! Run with: cargo run --bin optimize_db -- [--full] [--no-reindex] [--clear-cache]

use aime_stats::jobs::{self, OptimizeOptions};
use aime_stats::{cache, db, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aime_stats=info".into()),
        )
        .init();

    let options = OptimizeOptions::from_args(std::env::args().skip(1))?;
    let config = Config::from_env()?;

    println!("Optimizing database...");
    if options.full_vacuum {
        println!("  VACUUM FULL requested, tables will be locked while rewritten");
    }

    let pool = db::connect(&config.database_url, 1).await?;
    let cache = cache::from_config(&config).await?;

    let report = jobs::optimize_database(&pool, cache.as_ref(), config.cache_backend, options).await?;
    pool.close().await;

    println!("\n{}", report);

    Ok(())
}
