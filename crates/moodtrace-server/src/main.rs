//! MoodTrace Server: Application entry point.

use moodtrace_core::plans::PLANS;
use moodtrace_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moodtrace=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "MoodTrace server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), moodtrace_db::DbError> {
    tracing::info!("Starting MoodTrace server...");

    let config = DbConfig::from_env();
    tracing::info!(config = ?config, "Database configuration loaded");
    let (_manager, _applied) = DbManager::open(&config).await?;

    for plan in PLANS {
        tracing::info!(plan = plan.name, limits = ?plan.limits, "Plan loaded");
    }

    tracing::info!("MoodTrace server stopped.");
    Ok(())
}
