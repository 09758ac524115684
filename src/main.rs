use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod catalog;
mod config;
mod connectivity;
mod disruption;
mod persistence;
mod poller;
mod preferences;
mod source;
mod state;

use catalog::Catalog;
use config::Config;
use connectivity::{ConnectivityMonitor, SignalBus};
use persistence::{load_preferences, save_preferences};
use poller::AlertPoller;
use preferences::PreferenceStore;
use source::ConfiguredSource;
use state::AppState;

const SAVE_INTERVAL: Duration = Duration::from_secs(60);

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' : {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let config = Config::from_env()?;

    // 1. Reference data and preferences
    info!("Initializing Application State...");
    let catalog = Arc::new(Catalog::medellin());
    let preferences = PreferenceStore::new(catalog);
    info!(
        "Loaded {} lines and {} feeder routes",
        preferences.catalog().lines.len(),
        preferences.catalog().routes.len()
    );

    // 2. Load Persistence (Recovery)
    if let Err(e) = load_preferences(&preferences, &config.data_dir) {
        warn!("Failed to load saved preferences: {:#}", e);
    }

    // 3. Connectivity. The server cannot observe the client's network, so
    // it starts from the assumed-online default and takes signals over HTTP.
    let signals = Arc::new(SignalBus::new(None));
    let mut monitor = ConnectivityMonitor::start(signals.as_ref());

    // 4. Alert poller
    let source = ConfiguredSource::from_url(config.alerts_url.clone(), config.mock_latency);
    info!(source = %source.describe(), "Using alert source");
    let poller = AlertPoller::new(
        source,
        config.poll_interval,
        config.operator_name.clone(),
    )
    .start();

    let state = Arc::new(AppState {
        preferences,
        alerts: poller.subscribe(),
        online: monitor.subscribe(),
        signals,
        operator_name: config.operator_name.clone(),
        timezone: config.timezone,
    });

    // 5. Persistence Loop
    let state_clone_persist = state.clone();
    let data_dir = config.data_dir.clone();
    let persist_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(SAVE_INTERVAL).await;
            if let Err(e) = save_preferences(&state_clone_persist.preferences, &data_dir) {
                error!("Error saving preferences: {:#}", e);
            }
        }
    });

    // 6. HTTP Server
    let (addr, server) = warp::serve(api::routes(state.clone()))
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], config.port), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })?;
    info!("Server running at http://localhost:{}", addr.port());
    server.await;

    // 7. Teardown
    info!(
        polling = poller.is_polling(),
        online = monitor.is_online(),
        last_alerts = poller.snapshot().alerts().len(),
        "Shutting down..."
    );
    persist_task.abort();
    poller.shutdown().await;
    monitor.stop();
    save_preferences(&state.preferences, &config.data_dir)?;

    Ok(())
}
