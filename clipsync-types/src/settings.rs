//! Configuration snapshots.
//!
//! Both [`ServerConfig`] and [`AppSettings`] are immutable value snapshots:
//! a new instance replaces the old atomically on any field change, which
//! avoids partial-update races without fine-grained locks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard floor for the sync interval, enforced by normalization.
pub const MIN_SYNC_INTERVAL_SECS: u64 = 1;

/// Practical minimum recommended to callers; not enforced.
pub const RECOMMENDED_SYNC_INTERVAL_SECS: u64 = 5;

/// Remote server endpoint and observed connection state.
///
/// `is_connected` and `last_sync_time_ms` are derived/observed, not
/// user-authoritative: the executor updates them on contact, and an
/// explicit endpoint edit invalidates `is_connected`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Remote endpoint URL.
    pub url: String,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
    /// Whether the last contact with the server succeeded.
    #[serde(default)]
    pub is_connected: bool,
    /// Unix timestamp (ms) of the last successful sync, if any.
    #[serde(default)]
    pub last_sync_time_ms: Option<u64>,
}

impl ServerConfig {
    /// Create a config for a freshly entered endpoint (never contacted).
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            is_connected: false,
            last_sync_time_ms: None,
        }
    }

    /// Apply a user edit of the endpoint fields.
    ///
    /// Keeps the observed `last_sync_time_ms` but invalidates
    /// `is_connected` until the next attempt proves reachability.
    pub fn edited(&self, url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            is_connected: false,
            last_sync_time_ms: self.last_sync_time_ms,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("is_connected", &self.is_connected)
            .field("last_sync_time_ms", &self.last_sync_time_ms)
            .finish()
    }
}

/// User-facing engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Whether scheduled triggers fire at all (manual sync always works).
    pub auto_sync: bool,
    /// Seconds between interval-timer attempts.
    pub sync_interval_secs: u64,
    /// Fire one attempt at device/process start.
    pub sync_on_boot: bool,
    /// Forward status transitions to the notification collaborator.
    pub show_notifications: bool,
    /// Human-readable name of this device.
    pub device_name: String,
    /// Number of history entries retained by the ledger.
    pub clipboard_history_count: usize,
}

impl AppSettings {
    /// Clamp fields to safe values.
    ///
    /// `sync_interval_secs` below [`MIN_SYNC_INTERVAL_SECS`] would
    /// busy-loop the scheduler; it is floored rather than rejected.
    pub fn normalized(mut self) -> Self {
        if self.sync_interval_secs < MIN_SYNC_INTERVAL_SECS {
            self.sync_interval_secs = MIN_SYNC_INTERVAL_SECS;
        }
        self
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval_secs: 30,
            sync_on_boot: true,
            show_notifications: true,
            device_name: "clipsync device".to_string(),
            clipboard_history_count: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_normalized() {
        let settings = AppSettings::default();
        assert_eq!(settings, settings.clone().normalized());
        assert!(settings.sync_interval_secs >= RECOMMENDED_SYNC_INTERVAL_SECS);
    }

    #[test]
    fn zero_interval_is_floored() {
        let settings = AppSettings {
            sync_interval_secs: 0,
            ..AppSettings::default()
        }
        .normalized();
        assert_eq!(settings.sync_interval_secs, MIN_SYNC_INTERVAL_SECS);
    }

    #[test]
    fn endpoint_edit_invalidates_connection() {
        let config = ServerConfig {
            url: "https://old.example".into(),
            username: "u".into(),
            password: "p".into(),
            is_connected: true,
            last_sync_time_ms: Some(1_705_000_000_000),
        };

        let edited = config.edited("https://new.example", "u", "p2");

        assert!(!edited.is_connected);
        assert_eq!(edited.url, "https://new.example");
        assert_eq!(edited.last_sync_time_ms, Some(1_705_000_000_000));
    }

    #[test]
    fn server_config_debug_redacts_password() {
        let config = ServerConfig::new("https://example", "alice", "hunter2");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn settings_serde_roundtrip() {
        let settings = AppSettings {
            auto_sync: false,
            sync_interval_secs: 120,
            sync_on_boot: false,
            show_notifications: true,
            device_name: "workstation".into(),
            clipboard_history_count: 50,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let restored: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, restored);
    }

    #[test]
    fn server_config_missing_observed_fields_default() {
        // Older persisted snapshots may predate the observed fields.
        let json = r#"{"url":"https://s","username":"u","password":"p"}"#;
        let config: ServerConfig = serde_json::from_str(json).unwrap();
        assert!(!config.is_connected);
        assert!(config.last_sync_time_ms.is_none());
    }
}
