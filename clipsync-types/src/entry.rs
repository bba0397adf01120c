//! Clipboard history entry types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a clipboard history entry.
///
/// UUID v4 format (16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(uuid::Uuid);

impl EntryId {
    /// Create a new random EntryId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

/// Where a history entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryOrigin {
    /// Captured from the local OS clipboard.
    Local,
    /// Received from the remote server.
    Remote,
}

/// One synchronized clipboard item.
///
/// Immutable once created; the ledger replaces rather than mutates entries.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    /// Unique identifier for this entry.
    pub id: EntryId,
    /// The clipboard text.
    pub content: String,
    /// UTF-8 byte length of `content`.
    pub size_bytes: usize,
    /// Name of the device that produced the content.
    pub source_device: String,
    /// Unix timestamp in milliseconds when the content was captured.
    pub timestamp_ms: u64,
    /// Whether the entry originated locally or from the server.
    pub origin: EntryOrigin,
}

impl ClipboardEntry {
    /// Create an entry captured from the local clipboard.
    pub fn local(content: impl Into<String>, source_device: &str, timestamp_ms: u64) -> Self {
        Self::new(content.into(), source_device, timestamp_ms, EntryOrigin::Local)
    }

    /// Create an entry received from the remote server.
    pub fn remote(content: impl Into<String>, source_device: &str, timestamp_ms: u64) -> Self {
        Self::new(content.into(), source_device, timestamp_ms, EntryOrigin::Remote)
    }

    fn new(content: String, source_device: &str, timestamp_ms: u64, origin: EntryOrigin) -> Self {
        let size_bytes = content.len();
        Self {
            id: EntryId::new(),
            content,
            size_bytes,
            source_device: source_device.to_string(),
            timestamp_ms,
            origin,
        }
    }

    /// Replace the content, recomputing the byte size.
    ///
    /// Used by the ledger when storing a governor-truncated copy.
    pub fn with_content(mut self, content: String) -> Self {
        self.size_bytes = content.len();
        self.content = content;
        self
    }
}

impl fmt::Debug for ClipboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardEntry")
            .field("id", &self.id)
            .field(
                "content",
                &format!("[{} bytes REDACTED]", self.content.len()),
            )
            .field("size_bytes", &self.size_bytes)
            .field("source_device", &self.source_device)
            .field("timestamp_ms", &self.timestamp_ms)
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_computes_byte_size() {
        let entry = ClipboardEntry::local("héllo", "laptop", 100);
        assert_eq!(entry.size_bytes, 6); // 'é' is two bytes
        assert_eq!(entry.origin, EntryOrigin::Local);
    }

    #[test]
    fn with_content_recomputes_size() {
        let entry = ClipboardEntry::local("long original text", "laptop", 100);
        let truncated = entry.with_content("ab".to_string());
        assert_eq!(truncated.size_bytes, 2);
        assert_eq!(truncated.content, "ab");
    }

    #[test]
    fn entry_ids_are_unique() {
        let a = ClipboardEntry::local("x", "laptop", 1);
        let b = ClipboardEntry::local("x", "laptop", 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn entry_serde_roundtrip() {
        let entry = ClipboardEntry::remote("copied text", "phone", 1_705_000_000_000);
        let json = serde_json::to_string(&entry).unwrap();
        let restored: ClipboardEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, restored);
    }

    #[test]
    fn entry_debug_redacts_content() {
        let entry = ClipboardEntry::local("top secret password", "laptop", 100);
        let debug = format!("{:?}", entry);
        assert!(
            debug.contains("[19 bytes REDACTED]"),
            "content should be redacted, got: {}",
            debug
        );
        assert!(
            !debug.contains("secret"),
            "clipboard text must not appear in Debug output"
        );
    }
}
