//! Daemon configuration loading.
//!
//! Configuration is read from a TOML file (default:
//! `<config dir>/clipsync.toml`). The persisted settings store stays the
//! runtime source of truth; the file seeds the server endpoint and applies
//! settings overrides at startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use clipsync_types::AppSettings;

/// Root daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the persisted engine state.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Server endpoint to seed the settings store with.
    #[serde(default)]
    pub server: Option<ServerSection>,
    /// Engine settings overrides applied at startup.
    #[serde(default)]
    pub settings: Option<SettingsSection>,
    /// Clipboard watcher configuration.
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Server endpoint section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Remote endpoint URL.
    pub url: String,
    /// Username for authentication.
    #[serde(default)]
    pub username: String,
    /// Password for authentication.
    #[serde(default)]
    pub password: String,
}

/// Optional overrides of the persisted [`AppSettings`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsSection {
    /// Whether scheduled triggers fire.
    pub auto_sync: Option<bool>,
    /// Seconds between interval attempts.
    pub sync_interval_secs: Option<u64>,
    /// Fire one attempt at daemon start.
    pub sync_on_boot: Option<bool>,
    /// Forward status transitions to the notifier.
    pub show_notifications: Option<bool>,
    /// Human-readable name of this device.
    pub device_name: Option<String>,
    /// Number of history entries retained.
    pub clipboard_history_count: Option<usize>,
}

impl SettingsSection {
    /// Apply the present fields on top of `base`.
    pub fn apply(&self, base: AppSettings) -> AppSettings {
        AppSettings {
            auto_sync: self.auto_sync.unwrap_or(base.auto_sync),
            sync_interval_secs: self.sync_interval_secs.unwrap_or(base.sync_interval_secs),
            sync_on_boot: self.sync_on_boot.unwrap_or(base.sync_on_boot),
            show_notifications: self.show_notifications.unwrap_or(base.show_notifications),
            device_name: self.device_name.clone().unwrap_or(base.device_name),
            clipboard_history_count: self
                .clipboard_history_count
                .unwrap_or(base.clipboard_history_count),
        }
    }
}

/// Clipboard watcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Poll cadence for local clipboard changes (default: 500 ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load from an explicit path, or from the default location if one
    /// exists, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/clipsync.toml` for this platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "clipsync", "clipsync")
        .map(|dirs| dirs.config_dir().join("clipsync.toml"))
}

/// `<data dir>` for this platform.
pub fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "clipsync", "clipsync")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
