//! OS clipboard port.
//!
//! The engine reads the current clipboard through the host's poller (which
//! feeds local entries into the ledger) and writes remote content back
//! when the server wins reconciliation. The real implementation lives in
//! the host binary; tests use [`MockClipboard`].

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Clipboard errors.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The OS clipboard could not be opened or written.
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// OS clipboard collaborator port.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Read the current clipboard text, `None` when empty or non-text.
    async fn read_current(&self) -> Result<Option<String>, ClipboardError>;

    /// Replace the clipboard text.
    async fn write_current(&self, content: &str) -> Result<(), ClipboardError>;
}

/// Mock clipboard for testing.
///
/// Clones share state; records every write for verification.
#[derive(Debug, Default)]
pub struct MockClipboard {
    inner: Arc<Mutex<MockClipboardInner>>,
}

#[derive(Debug, Default)]
struct MockClipboardInner {
    current: Option<String>,
    writes: Vec<String>,
    fail_next_write: Option<String>,
}

impl MockClipboard {
    /// Create an empty mock clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text a subsequent read will return.
    pub fn set_current(&self, content: Option<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.current = content;
    }

    /// All texts written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.writes.clone()
    }

    /// Cause the next write to fail with the given error message.
    pub fn fail_next_write(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_write = Some(error.to_string());
    }
}

impl Clone for MockClipboard {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Clipboard for MockClipboard {
    async fn read_current(&self) -> Result<Option<String>, ClipboardError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.current.clone())
    }

    async fn write_current(&self, content: &str) -> Result<(), ClipboardError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(ClipboardError::Unavailable(error));
        }
        inner.current = Some(content.to_string());
        inner.writes.push(content.to_string());
        Ok(())
    }
}
