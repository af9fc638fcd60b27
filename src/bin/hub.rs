use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use monitor_schedule::{
    clock::SystemClock,
    config::{Config, load_config},
    hub::{Hub, HubSettings},
    monitors::HttpProber,
    storage::open_backend,
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults apply when it does not exist
    #[arg(short, long, default_value = "./monitor-schedule.json")]
    config: String,

    /// Log level for this crate (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new().with_targets(vec![
        ("monitor_schedule", level),
        ("schedule_hub", level),
        ("tower_http", LevelFilter::INFO.min(level)),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = load_config(&args.config)?;

    run(config).await
}

async fn run(config: Config) -> anyhow::Result<()> {
    let store = open_backend(&config.storage)
        .await
        .context("failed to open record store")?;

    let prober = HttpProber::new(config.probe_timeout()).context("failed to build HTTP client")?;

    let hub = Hub::start(
        Arc::clone(&store),
        Arc::new(prober),
        Arc::new(SystemClock),
        HubSettings::from(&config),
    );

    spawn_api(&config, Arc::clone(&store)).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    hub.shutdown().await;
    if let Err(e) = store.close().await {
        warn!("failed to close record store: {e}");
    }

    Ok(())
}

#[cfg(feature = "api")]
async fn spawn_api(
    config: &Config,
    store: Arc<dyn monitor_schedule::storage::StorageBackend>,
) -> anyhow::Result<()> {
    use monitor_schedule::api::{ApiState, spawn_api_server};

    match &config.api {
        Some(api) => {
            spawn_api_server(api, ApiState::new(store)).await?;
        }
        None => info!("API disabled"),
    }
    Ok(())
}

#[cfg(not(feature = "api"))]
async fn spawn_api(
    config: &Config,
    _store: Arc<dyn monitor_schedule::storage::StorageBackend>,
) -> anyhow::Result<()> {
    if config.api.is_some() {
        warn!("API configured but the api feature is not compiled in");
    }
    Ok(())
}
