//! BDPM refresh service binary.

use std::sync::Arc;

use bdpm_service::{DataContainer, HttpFetcher, ServiceConfig, UpdatePipeline, UpdateScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    let times: Vec<String> = config
        .update_times
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();
    tracing::info!(
        scratch_dir = %config.scratch_dir.display(),
        update_times = %times.join(","),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        fetch_attempts = config.fetch_attempts,
        "starting BDPM refresh service"
    );
    for (file, location) in config.sources.iter() {
        tracing::debug!(file = %file, location = ?location, "source configured");
    }

    let container = Arc::new(DataContainer::new());
    let fetcher = HttpFetcher::new(config.sources.clone(), config.scratch_dir.clone())?
        .with_timeout(config.fetch_timeout)
        .with_attempts(config.fetch_attempts);
    let pipeline = Arc::new(UpdatePipeline::new(container.clone(), Arc::new(fetcher)));

    let scheduler = UpdateScheduler::new(pipeline, config.update_times.clone())
        .with_shutdown_grace(config.shutdown_grace)
        .start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    scheduler.shutdown().await;

    let stats = container.stats();
    tracing::info!(
        generation = stats.generation,
        medications = stats.medications,
        groups = stats.groups,
        "BDPM refresh service stopped"
    );

    Ok(())
}
