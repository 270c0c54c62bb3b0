//! EventHub worker
//!
//! Main application entry point. Connects to the database, applies
//! migrations and periodically marks past events as finished.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use eventhub::{
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService},
    services::ServiceFactory,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}", eventhub::info());

    info!("Connecting to database...");
    let pool = create_pool(&settings.database)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool).await?;

    let store = DatabaseService::new(pool);
    let services = ServiceFactory::new(store, settings.clone());

    if !settings.events.finish_sweep_enabled {
        info!("Finish sweep disabled; waiting for shutdown");
        tokio::signal::ctrl_c().await?;
        return Ok(());
    }

    let period = Duration::from_secs(settings.events.finish_sweep_interval_seconds);
    let mut ticker = tokio::time::interval(period);
    info!(interval_seconds = period.as_secs(), "Finish sweep scheduled");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = services.event_service.finish_past_events(Utc::now()).await {
                    logging::log_service_error("finish_past_events", &e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("EventHub worker stopped");
    Ok(())
}
