//! Transport abstraction for ClipSync.
//!
//! This module provides a pluggable network layer that abstracts the
//! remote server (HTTP in production, mock for testing). No wire format is
//! fixed by the engine; the implementation defines it.
//!
//! # Design
//!
//! The port is async and request/response shaped:
//! - `fetch_remote_latest()` reads the server's current entry (GET
//!   semantics)
//! - `push_local_latest()` replaces it with the local entry
//!
//! Errors carry their layer: [`TransportError::is_network_failure`]
//! separates unreachability (retry quietly, `Disconnected`) from protocol
//! failures (`Error`, logged distinctly).

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use thiserror::Error;

use clipsync_types::{ClipboardEntry, ServerConfig};

/// The server's current clipboard entry as returned by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoteLatest {
    /// The clipboard text held by the server.
    pub content: String,
    /// Unix timestamp (ms) the server recorded for the content.
    pub timestamp_ms: u64,
    /// Name of the device that pushed the content.
    pub source_device: String,
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Credentials rejected by the server.
    #[error("unauthorized")]
    Unauthorized,

    /// Server unreachable (connection refused, DNS failure, network lost).
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The bounded round-trip wait expired.
    #[error("request timed out")]
    Timeout,

    /// The server responded with something the client cannot parse.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The server refused the pushed content.
    #[error("rejected by server: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether this is a network-layer failure (as opposed to a
    /// protocol-layer one where the server *did* respond).
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }
}

/// Network collaborator port.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the server's current entry, or `None` if the server holds
    /// nothing yet.
    async fn fetch_remote_latest(
        &self,
        config: &ServerConfig,
    ) -> Result<Option<RemoteLatest>, TransportError>;

    /// Replace the server's current entry with the local one.
    async fn push_local_latest(
        &self,
        config: &ServerConfig,
        entry: &ClipboardEntry,
    ) -> Result<(), TransportError>;
}
