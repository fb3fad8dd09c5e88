//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/flreport/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/flreport/` (~/.config/flreport/)
//! - Data: `$XDG_DATA_HOME/flreport/` (~/.local/share/flreport/)
//! - State/Logs: `$XDG_STATE_HOME/flreport/` (~/.local/state/flreport/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed collection endpoint of the reporting service.
pub const DEFAULT_ENDPOINT: &str = "https://fl.brave.com/";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Usage-report scheduling and upload configuration
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Usage-report configuration
///
/// All timing knobs are expressed in the units the collection protocol uses:
/// slots and the collection-id lifetime in minutes/days, never raw seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct ReporterConfig {
    /// Master enable switch for operational-profile reporting
    #[serde(default)]
    pub enabled: bool,

    /// Width of a collection slot in minutes
    ///
    /// Controls both the slot-index granularity and the periodic timer,
    /// which fires twice per slot window.
    #[serde(default = "default_slot_size_minutes")]
    pub slot_size_minutes: u32,

    /// Delay of the re-armable one-shot timer in minutes
    ///
    /// Staggers the upload attempt inside the slot window instead of firing
    /// exactly on slot boundaries.
    #[serde(default = "default_simulate_duration_minutes")]
    pub simulate_duration_minutes: u32,

    /// How long a collection id lives before it is rotated, in days
    #[serde(default = "default_collection_id_lifetime_days")]
    pub collection_id_lifetime_days: u32,

    /// Collection endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Override of the detected platform identifier
    #[serde(default)]
    pub platform: Option<String>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            slot_size_minutes: default_slot_size_minutes(),
            simulate_duration_minutes: default_simulate_duration_minutes(),
            collection_id_lifetime_days: default_collection_id_lifetime_days(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            platform: None,
        }
    }
}

impl ReporterConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.slot_size_minutes == 0 {
            return Err(Error::Config(
                "reporter.slot_size_minutes must be greater than 0".to_string(),
            ));
        }
        if self.collection_id_lifetime_days == 0 {
            return Err(Error::Config(
                "reporter.collection_id_lifetime_days must be greater than 0".to_string(),
            ));
        }
        if self.endpoint.is_empty() {
            return Err(Error::Config(
                "reporter.endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Period of the repeating slot timer: twice per nominal slot window
    pub fn periodic_timer_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.slot_size_minutes) * 60 / 2)
    }

    /// Delay of the re-armable one-shot upload timer
    pub fn step_timer_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.simulate_duration_minutes) * 60)
    }
}

fn default_slot_size_minutes() -> u32 {
    30
}

fn default_simulate_duration_minutes() -> u32 {
    5
}

fn default_collection_id_lifetime_days() -> u32 {
    1
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.reporter.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/flreport/config.toml` (~/.config/flreport/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("flreport").join("config.toml")
    }

    /// Returns the data directory path (for the preference store)
    ///
    /// `$XDG_DATA_HOME/flreport/` (~/.local/share/flreport/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("flreport")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/flreport/` (~/.local/state/flreport/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("flreport")
    }

    /// Returns the preference store file path
    ///
    /// `$XDG_DATA_HOME/flreport/prefs.db` (~/.local/share/flreport/prefs.db)
    pub fn prefs_path() -> PathBuf {
        Self::data_dir().join("prefs.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/flreport/flreport.log` (~/.local/state/flreport/flreport.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("flreport.log")
    }
}
