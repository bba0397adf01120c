//! Mock transport for testing.
//!
//! Allows staging a remote entry and capturing pushed entries for
//! verification.

use super::{RemoteLatest, Transport, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clipsync_types::{ClipboardEntry, ServerConfig};

/// Mock transport for testing.
///
/// Clones share state so tests can hold a handle while the executor owns
/// another.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    remote: Option<RemoteLatest>,
    pushed: Vec<ClipboardEntry>,
    fetch_count: usize,
    fetch_delay: Option<Duration>,
    fail_next_fetch: Option<TransportError>,
    fail_next_push: Option<TransportError>,
}

impl MockTransport {
    /// Create a mock transport with no remote entry staged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the entry the next fetches will return.
    pub fn set_remote(&self, remote: Option<RemoteLatest>) {
        let mut inner = self.inner.lock().unwrap();
        inner.remote = remote;
    }

    /// The entry currently held by the fake server.
    pub fn remote(&self) -> Option<RemoteLatest> {
        let inner = self.inner.lock().unwrap();
        inner.remote.clone()
    }

    /// All entries that were pushed.
    pub fn pushed_entries(&self) -> Vec<ClipboardEntry> {
        let inner = self.inner.lock().unwrap();
        inner.pushed.clone()
    }

    /// Number of fetches performed.
    pub fn fetch_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.fetch_count
    }

    /// Delay every fetch by `delay` (for exercising round-trip timeouts).
    pub fn set_fetch_delay(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetch_delay = Some(delay);
    }

    /// Cause the next fetch to fail with the given error.
    pub fn fail_next_fetch(&self, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_fetch = Some(error);
    }

    /// Cause the next push to fail with the given error.
    pub fn fail_next_push(&self, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_push = Some(error);
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_remote_latest(
        &self,
        _config: &ServerConfig,
    ) -> Result<Option<RemoteLatest>, TransportError> {
        // Sleep outside the lock so a delayed fetch does not block other
        // handles to the shared state.
        let delay = { self.inner.lock().unwrap().fetch_delay };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.fetch_count += 1;
        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(error);
        }
        Ok(inner.remote.clone())
    }

    async fn push_local_latest(
        &self,
        _config: &ServerConfig,
        entry: &ClipboardEntry,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_push.take() {
            return Err(error);
        }
        inner.remote = Some(RemoteLatest {
            content: entry.content.clone(),
            timestamp_ms: entry.timestamp_ms,
            source_device: entry.source_device.clone(),
        });
        inner.pushed.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::new("https://example", "user", "pw")
    }

    #[tokio::test]
    async fn fetch_returns_staged_remote() {
        let transport = MockTransport::new();
        assert!(transport
            .fetch_remote_latest(&config())
            .await
            .unwrap()
            .is_none());

        let staged = RemoteLatest {
            content: "remote text".into(),
            timestamp_ms: 100,
            source_device: "phone".into(),
        };
        transport.set_remote(Some(staged.clone()));

        let fetched = transport.fetch_remote_latest(&config()).await.unwrap();
        assert_eq!(fetched, Some(staged));
        assert_eq!(transport.fetch_count(), 2);
    }

    #[tokio::test]
    async fn push_records_and_replaces_remote() {
        let transport = MockTransport::new();
        let entry = ClipboardEntry::local("local text", "laptop", 200);

        transport.push_local_latest(&config(), &entry).await.unwrap();

        assert_eq!(transport.pushed_entries().len(), 1);
        let remote = transport.remote().unwrap();
        assert_eq!(remote.content, "local text");
        assert_eq!(remote.timestamp_ms, 200);
    }

    #[tokio::test]
    async fn forced_fetch_failure() {
        let transport = MockTransport::new();
        transport.fail_next_fetch(TransportError::Unreachable("refused".into()));

        let result = transport.fetch_remote_latest(&config()).await;
        assert!(matches!(result, Err(TransportError::Unreachable(_))));

        // Next fetch works again.
        assert!(transport.fetch_remote_latest(&config()).await.is_ok());
    }

    #[tokio::test]
    async fn forced_push_failure() {
        let transport = MockTransport::new();
        transport.fail_next_push(TransportError::Rejected("too large".into()));

        let entry = ClipboardEntry::local("x", "laptop", 1);
        let result = transport.push_local_latest(&config(), &entry).await;
        assert!(matches!(result, Err(TransportError::Rejected(_))));
        assert!(transport.pushed_entries().is_empty());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let transport1 = MockTransport::new();
        let transport2 = transport1.clone();

        let entry = ClipboardEntry::local("shared", "laptop", 1);
        transport1.push_local_latest(&config(), &entry).await.unwrap();

        assert_eq!(transport2.pushed_entries().len(), 1);
        assert!(transport2.remote().is_some());
    }
}
