//! Disaster Sentinel - background disaster risk inference daemon
//!
//! Trains (or loads) a risk model, then sweeps a watchlist of locations
//! on a fixed interval, emitting structured alerts for high-confidence
//! non-background predictions.

use anyhow::Result;
use sentinel_lib::models::MonitoredLocation;
use sentinel_lib::source::CompositeSource;
use sentinel_lib::{ModelStore, Predictor, Scheduler, Trainer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const SENTINEL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SENTINEL_VERSION, "Starting sentinel");

    let config = config::SentinelConfig::load()?;
    info!(
        sweep_interval_minutes = config.sweep_interval_minutes,
        alert_threshold = config.alert_threshold,
        model_dir = %config.model_dir,
        "Sentinel configured"
    );

    let store = Arc::new(ModelStore::new(&config.model_dir));
    let trainer = Trainer::new(&config.data_dir);
    let predictor = Predictor::new(
        store,
        Arc::new(CompositeSource::default()),
        trainer,
        MonitoredLocation::default_watchlist(),
    )
    .with_threshold(config.alert_threshold);

    let scheduler = Scheduler::new(
        Arc::new(predictor),
        Duration::from_secs(config.sweep_interval_minutes * 60),
    );
    scheduler.start();

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("SIGINT received, shutting down");
    scheduler.stop();

    Ok(())
}
