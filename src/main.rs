//! Signal Gate Bot - Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Open file persistence and restore the latest snapshot
//! 4. Create the venue catalog client (when enabled)
//! 5. Wire the signal processor with its ports
//! 6. Spawn the HTTP intake server
//! 7. Spawn the periodic snapshot task
//! 8. Wait for SIGINT, then save a final snapshot and exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use signal_gate_bot::adapters::catalog::VenueCatalog;
use signal_gate_bot::adapters::http::{self, AppState};
use signal_gate_bot::adapters::metrics::SignalMetrics;
use signal_gate_bot::adapters::persistence::FileRepository;
use signal_gate_bot::config;
use signal_gate_bot::ports::clock::SystemClock;
use signal_gate_bot::ports::market_catalog::MarketCatalog;
use signal_gate_bot::ports::repository::Repository;
use signal_gate_bot::usecases::SignalProcessor;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        starting_balance = %config.account.starting_balance,
        instruments = config.account.allowed_instruments.len(),
        "Starting signal gate bot"
    );

    // ── 3. Open persistence and restore state ───────────────
    let repository = Arc::new(
        FileRepository::from_data_dir(&config.persistence.data_dir)
            .await
            .context("Failed to open data directory")?,
    );
    let repository: Arc<dyn Repository> = repository;

    // ── 4. Venue catalog client (soft instrument check) ─────
    let catalog: Option<Arc<dyn MarketCatalog>> = if config.catalog.enabled {
        Some(Arc::new(
            VenueCatalog::new(&config.catalog).context("Failed to create catalog client")?,
        ))
    } else {
        warn!("Venue catalog check disabled");
        None
    };

    // ── 5. Wire the signal processor ────────────────────────
    let processor = Arc::new(SignalProcessor::new(
        &config,
        catalog,
        Arc::clone(&repository),
        Arc::new(SystemClock),
    ));
    match repository.load_snapshot().await {
        Ok(Some(snapshot)) => processor.restore(snapshot),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Snapshot restore failed, starting fresh"),
    }

    let metrics = Arc::new(SignalMetrics::new().context("Failed to register metrics")?);

    // ── 6. Spawn HTTP intake server ─────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let state = AppState::new(
        &config.server,
        Arc::clone(&processor),
        Arc::clone(&metrics),
        Arc::clone(&repository),
    );
    let bind_address = config.server.bind_address.clone();
    let server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(state, &bind_address, server_shutdown).await {
            error!(error = %e, "Intake server failed");
        }
    });

    // ── 7. Spawn periodic snapshot task ─────────────────────
    let snapshot_processor = Arc::clone(&processor);
    let snapshot_repository = Arc::clone(&repository);
    let interval = Duration::from_secs(config.persistence.snapshot_interval_seconds);
    let mut snapshot_shutdown = shutdown_tx.subscribe();
    let snapshot_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = snapshot_shutdown.recv() => break,
                _ = ticker.tick() => {
                    let snapshot = snapshot_processor.snapshot();
                    if let Err(e) = snapshot_repository.save_snapshot(&snapshot).await {
                        warn!(error = %e, "Periodic snapshot failed");
                    }
                }
            }
        }
    });

    info!("All tasks spawned, bot is running");

    // ── 8. Wait for SIGINT, then shut down gracefully ───────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    let _ = shutdown_tx.send(());

    // Final snapshot before exit
    let snapshot = processor.snapshot();
    match repository.save_snapshot(&snapshot).await {
        Ok(()) => info!("Final snapshot saved"),
        Err(e) => error!(error = %e, "Failed to save final snapshot"),
    }

    let _ = tokio::time::timeout(Duration::from_secs(10), server_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), snapshot_handle).await;

    info!("Shutdown complete");
    Ok(())
}
