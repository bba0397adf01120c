//! Engine and connectivity status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine's externally observable disposition.
///
/// Exactly one value is held at a time; this is not a queue of pending work.
/// Every attempt passes through [`SyncStatus::Syncing`] and settles back to
/// [`SyncStatus::Idle`] once the engine quiesces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// No operation outstanding (initial state).
    Idle,
    /// A sync attempt is in flight.
    Syncing,
    /// The last attempt succeeded; the server is reachable.
    Connected,
    /// The server is unreachable or the network is unavailable.
    Disconnected,
    /// The last attempt failed for a reason other than plain unreachability
    /// (auth failure, malformed response, content rejected).
    Error,
}

impl SyncStatus {
    /// Check whether an attempt is currently in flight.
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }

    /// Check whether this is a terminal attempt outcome
    /// (as opposed to `Idle`/`Syncing`).
    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Connected | Self::Disconnected | Self::Error)
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// Connectivity as reported by the host's connectivity observer.
///
/// Read-only to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkStatus {
    /// Network reachable without usage constraints.
    Available,
    /// No usable network.
    Unavailable,
    /// Network reachable but usage-metered.
    Metered,
}

impl NetworkStatus {
    /// Check whether any network is reachable (metered counts as online).
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Available | Self::Metered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_idle() {
        assert_eq!(SyncStatus::default(), SyncStatus::Idle);
    }

    #[test]
    fn syncing_helper() {
        assert!(SyncStatus::Syncing.is_syncing());
        assert!(!SyncStatus::Idle.is_syncing());
        assert!(!SyncStatus::Connected.is_syncing());
    }

    #[test]
    fn outcome_helper() {
        assert!(SyncStatus::Connected.is_outcome());
        assert!(SyncStatus::Disconnected.is_outcome());
        assert!(SyncStatus::Error.is_outcome());
        assert!(!SyncStatus::Idle.is_outcome());
        assert!(!SyncStatus::Syncing.is_outcome());
    }

    #[test]
    fn status_display() {
        assert_eq!(SyncStatus::Disconnected.to_string(), "disconnected");
    }

    #[test]
    fn metered_is_online() {
        assert!(NetworkStatus::Available.is_online());
        assert!(NetworkStatus::Metered.is_online());
        assert!(!NetworkStatus::Unavailable.is_online());
    }
}
