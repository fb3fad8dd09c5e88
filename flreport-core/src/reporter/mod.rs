//! Periodic usage-report client
//!
//! Rotates an anonymous collection id, tracks elapsed collection slots of
//! local wall-clock time, and POSTs a small JSON payload to the collection
//! endpoint at most once per slot. Everything is best effort: a failed
//! upload is dropped and the next slot becomes the implicit retry.
//!
//! ## Architecture
//!
//! - [`client`]: payload shape and the HTTP transport seam.
//! - [`service::Reporter`]: the per-attempt logic and persisted cursor.
//! - [`scheduler`]: the two-timer task that decides when attempts happen.
//! - [`ReportingService`]: the thin owning composition with start/stop.

pub mod client;
pub mod scheduler;
pub mod service;

pub use client::{CollectionReport, HttpTransport, ReportTransport};
pub use scheduler::SchedulerHandle;
pub use service::{Reporter, UploadOutcome};

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::ReporterConfig;
use crate::error::{Error, Result};
use crate::prefs::PrefStore;

/// Owns the reporting lifecycle: composes the preference store, transport
/// and scheduler, and exposes start/stop to the host.
pub struct ReportingService {
    config: ReporterConfig,
    prefs: Arc<dyn PrefStore>,
    transport: Arc<dyn ReportTransport>,
    scheduler: Option<SchedulerHandle>,
}

impl ReportingService {
    /// Create the service. Validates the configuration up front.
    pub fn new(
        config: ReporterConfig,
        prefs: Arc<dyn PrefStore>,
        transport: Arc<dyn ReportTransport>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            prefs,
            transport,
            scheduler: None,
        })
    }

    /// Create the service with the default HTTP transport.
    pub fn with_http_transport(config: ReporterConfig, prefs: Arc<dyn PrefStore>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::new(config, prefs, transport)
    }

    /// Start the scheduler.
    ///
    /// `enabled_rx` carries the host-wide opt-in signal; the scheduler stops
    /// itself when it turns false, and restarting afterwards is the host's
    /// call. Starting while the feature flag or the opt-in is off is a
    /// no-op. Starting while already running is an error rather than an
    /// assertion.
    pub fn start(&mut self, enabled_rx: watch::Receiver<bool>) -> Result<()> {
        if let Some(handle) = &self.scheduler {
            if !handle.is_finished() {
                return Err(Error::Scheduler("already running".to_string()));
            }
            // Previous run ended via the enablement signal; allow a restart.
            self.scheduler = None;
        }

        if !self.config.enabled {
            tracing::info!("Operational-profile reporting disabled by configuration");
            return Ok(());
        }
        if !*enabled_rx.borrow() {
            tracing::info!("Operational-profile reporting disabled by host opt-in");
            return Ok(());
        }

        // The cursor and collection id are re-read from the store on every
        // start, matching the original's load-prefs-on-Start behavior.
        let reporter = Reporter::new(
            self.config.clone(),
            Arc::clone(&self.prefs),
            Arc::clone(&self.transport),
        )?;

        self.scheduler = Some(scheduler::spawn(reporter, &self.config, enabled_rx));
        Ok(())
    }

    /// Stop the scheduler. Idempotent; safe before any start.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.scheduler.take() {
            handle.stop().await;
        }
    }

    /// True while the scheduler task is alive.
    pub fn is_running(&self) -> bool {
        self.scheduler
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}
