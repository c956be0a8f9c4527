//! TOML-based configuration for the client.
//!
//! Reads and writes `ClientConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\FileDrop\client.toml`
//! - Linux:    `~/.config/filedrop/client.toml`
//! - macOS:    `~/Library/Application Support/FileDrop/client.toml`
//!
//! A different file can be given on the command line with `--config`.
//!
//! ```toml
//! [transport]
//! url = "ws://localhost:8080/hub"
//! base_unit_ms = 600
//! max_backoff_ms = 300000
//! window_secs = 300
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so an empty or partial file is valid and
//! a missing file simply yields `ClientConfig::default()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use filedrop_core::domain::backoff::{DEFAULT_BASE_UNIT, DEFAULT_MAX_BACKOFF, DEFAULT_WINDOW};
use filedrop_core::BackoffPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::transport::TransportConfig;

/// Hub address used when neither the config file nor the CLI names one.
pub const DEFAULT_HUB_URL: &str = "ws://localhost:8080/hub";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where to connect and how to back off after a close.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportSettings {
    /// WebSocket URL of the receiving hub.
    #[serde(default = "default_url")]
    pub url: String,
    /// Delay added per close inside the window, in milliseconds.
    #[serde(default = "default_base_unit_ms")]
    pub base_unit_ms: u64,
    /// Cap on any single reconnect delay, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// How long a close keeps counting, in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// `tracing` filter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_url() -> String {
    DEFAULT_HUB_URL.to_string()
}
fn default_base_unit_ms() -> u64 {
    DEFAULT_BASE_UNIT.as_millis() as u64
}
fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF.as_millis() as u64
}
fn default_window_secs() -> u64 {
    DEFAULT_WINDOW.as_secs()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            base_unit_ms: default_base_unit_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TransportSettings {
    /// The backoff parameters as a domain policy.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.base_unit_ms),
            Duration::from_millis(self.max_backoff_ms),
            Duration::from_secs(self.window_secs),
        )
    }

    /// Converts the settings into the transport's runtime configuration.
    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            url: self.url.clone(),
            backoff: self.backoff_policy(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default path of the client config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("client.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `ClientConfig` from `path`, returning `ClientConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("FileDrop"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("FileDrop"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("filedrop"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
