//! # TaskDeck Scheduler
//!
//! Binary entry point: connects to PostgreSQL and runs the recurring-task
//! pass on a fixed interval.
//!
//! ```bash
//! cargo run -p taskdeck-scheduler
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `SCHEDULER_INTERVAL_SECONDS`: Seconds between passes (default: 3600)
//! - `RUST_LOG`: Log filter (default: info)

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdeck_scheduler::recurring;
use taskdeck_shared::db::pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    tracing::info!(
        "TaskDeck Scheduler v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    let interval_seconds = std::env::var("SCHEDULER_INTERVAL_SECONDS")
        .unwrap_or_else(|_| "3600".to_string())
        .parse::<u64>()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: database_url,
        ..Default::default()
    })
    .await?;

    tracing::info!(interval_seconds, "Scheduler loop starting");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));

    loop {
        ticker.tick().await;

        match recurring::run_pass(&db, chrono::Utc::now()).await {
            Ok(spawned) if spawned > 0 => {
                tracing::info!(spawned, "Scheduler pass complete");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Scheduler pass failed: {}", e);
            }
        }
    }
}
