//! Error types for flreport-core

use thiserror::Error;

/// Main error type for the flreport-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Preference store error
    #[error("preference store error: {0}")]
    Prefs(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Scheduler lifecycle error (e.g. Start while already running)
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

/// Result type alias for flreport-core
pub type Result<T> = std::result::Result<T, Error>;
