//! OS clipboard implementation backed by arboard.
//!
//! arboard's handle is not `Send`, so each operation opens a fresh handle
//! inside `spawn_blocking`; the engine's poll cadence makes that cheap
//! enough.

use async_trait::async_trait;

use clipsync_engine::{Clipboard, ClipboardError};

/// System clipboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Create a system clipboard port.
    pub fn new() -> Self {
        Self
    }
}

fn unavailable(error: impl std::fmt::Display) -> ClipboardError {
    ClipboardError::Unavailable(error.to_string())
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn read_current(&self) -> Result<Option<String>, ClipboardError> {
        tokio::task::spawn_blocking(|| {
            let mut clipboard = arboard::Clipboard::new().map_err(unavailable)?;
            match clipboard.get_text() {
                Ok(text) => Ok(Some(text)),
                // Empty or non-text clipboard is "no change", not an error.
                Err(arboard::Error::ContentNotAvailable) => Ok(None),
                Err(e) => Err(unavailable(e)),
            }
        })
        .await
        .map_err(unavailable)?
    }

    async fn write_current(&self, content: &str) -> Result<(), ClipboardError> {
        let content = content.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new().map_err(unavailable)?;
            clipboard.set_text(content).map_err(unavailable)
        })
        .await
        .map_err(unavailable)?
    }
}
