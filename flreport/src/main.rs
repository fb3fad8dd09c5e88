//! flreport - operational-profile reporting daemon
//!
//! Runs the slot scheduler in the foreground until interrupted. The
//! preference store and log files live under the XDG data/state
//! directories.

use std::sync::Arc;

use anyhow::{Context, Result};
use flreport_core::{Config, ReportingService, SqlitePrefStore};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        flreport_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("flreport starting up");

    // Open the preference store holding the reporting cursor
    let prefs_path = Config::prefs_path();
    tracing::info!(path = %prefs_path.display(), "Opening preference store");
    let prefs =
        Arc::new(SqlitePrefStore::open(&prefs_path).context("failed to open preference store")?);

    let mut service = ReportingService::with_http_transport(config.reporter, prefs)
        .context("failed to create reporting service")?;

    // The daemon has no host-wide opt-in surface of its own; the config
    // flag is the single switch, so the channel stays true for the run.
    let (_opt_in, enabled_rx) = watch::channel(true);
    service
        .start(enabled_rx)
        .context("failed to start reporting service")?;

    if service.is_running() {
        tracing::info!("Reporting service running, waiting for ctrl-c");
    } else {
        tracing::info!("Reporting disabled, idling until ctrl-c");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    service.stop().await;

    Ok(())
}
