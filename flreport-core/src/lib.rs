//! # flreport-core
//!
//! Core library for flreport - a periodic, privacy-preserving
//! usage-reporting client.
//!
//! This library provides:
//! - Collection-slot arithmetic over local wall-clock time
//! - A rotating anonymous collection id with persisted expiration
//! - A two-timer scheduler issuing at most one upload per slot
//! - Preference storage for the reporting cursor
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! The reporting loop is deliberately small: a repeating timer fires twice
//! per slot window and re-arms a one-shot timer; when the one-shot elapses,
//! the current slot index is compared against the last successfully
//! reported one, and only a novel slot produces a single fire-and-forget
//! HTTP POST. An HTTP 200 advances the persisted cursor; any other outcome
//! is dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flreport_core::{Config, ReportingService, SqlitePrefStore};
//!
//! # async fn run() -> flreport_core::Result<()> {
//! let config = Config::load()?;
//! let prefs = Arc::new(SqlitePrefStore::open(&Config::prefs_path())?);
//!
//! let mut service = ReportingService::with_http_transport(config.reporter, prefs)?;
//! let (_opt_in, enabled_rx) = tokio::sync::watch::channel(true);
//! service.start(enabled_rx)?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use prefs::{MemoryPrefStore, PrefStore, SqlitePrefStore};
pub use reporter::{ReportingService, UploadOutcome};

// Public modules
pub mod collection_id;
pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod prefs;
pub mod reporter;
pub mod slot;
