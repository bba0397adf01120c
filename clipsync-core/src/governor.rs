//! Content size governor.
//!
//! Clipboard text crosses three boundaries with independent byte budgets:
//! the database row it is persisted into, the transport payload it is
//! pushed as, and the UI surface that renders it. The governor checks each
//! ceiling and produces character-aligned truncated copies that fit.
//!
//! All checks operate on the UTF-8 byte length, never the character count:
//! storage and transport budgets downstream are byte-denominated.

/// Maximum bytes a persisted entry's content may occupy (database row).
pub const DATABASE_CEILING_BYTES: usize = 1_048_576;

/// Maximum bytes pushed across the transport. Kept below the database
/// ceiling to reserve headroom for wrapping/encoding overhead.
pub const TRANSPORT_CEILING_BYTES: usize = 921_600;

/// Maximum bytes handed to the OS clipboard write API.
pub const CLIPBOARD_CEILING_BYTES: usize = 921_600;

/// Maximum bytes a UI surface renders without pagination.
pub const UI_CEILING_BYTES: usize = 10_240;

/// Suffix appended to persisted/transported truncated content.
pub const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Shorter suffix for UI-only truncation; this copy is never persisted.
pub const UI_TRUNCATION_MARKER: &str = "…";

/// The four ceilings as a policy value.
///
/// The transport headroom (and its clipboard sibling) is a policy constant,
/// not a derived value, so hosts can tune it per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ceilings {
    /// Database row budget.
    pub database: usize,
    /// Transport payload budget.
    pub transport: usize,
    /// OS clipboard write budget.
    pub clipboard: usize,
    /// UI render budget.
    pub ui: usize,
}

impl Default for Ceilings {
    fn default() -> Self {
        Self {
            database: DATABASE_CEILING_BYTES,
            transport: TRANSPORT_CEILING_BYTES,
            clipboard: CLIPBOARD_CEILING_BYTES,
            ui: UI_CEILING_BYTES,
        }
    }
}

/// UTF-8 byte length of the content.
pub fn byte_size(content: &str) -> usize {
    content.len()
}

/// Enforces the ceilings via byte-accurate, character-aligned truncation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentGovernor {
    ceilings: Ceilings,
}

impl ContentGovernor {
    /// Create a governor with custom ceilings.
    pub fn new(ceilings: Ceilings) -> Self {
        Self { ceilings }
    }

    /// The ceilings this governor enforces.
    pub fn ceilings(&self) -> Ceilings {
        self.ceilings
    }

    /// Whether the content exceeds the database row budget.
    pub fn exceeds_database_limit(&self, content: &str) -> bool {
        content.len() > self.ceilings.database
    }

    /// Whether the content exceeds the transport payload budget.
    pub fn exceeds_transport_limit(&self, content: &str) -> bool {
        content.len() > self.ceilings.transport
    }

    /// Whether the content exceeds the OS clipboard write budget.
    pub fn exceeds_clipboard_limit(&self, content: &str) -> bool {
        content.len() > self.ceilings.clipboard
    }

    /// Whether the content exceeds the UI render budget.
    pub fn exceeds_ui_limit(&self, content: &str) -> bool {
        content.len() > self.ceilings.ui
    }

    /// Truncate for persistence; appends [`TRUNCATION_MARKER`] when cut.
    pub fn truncate_for_database(&self, content: &str) -> String {
        truncate_to_ceiling(content, self.ceilings.database, TRUNCATION_MARKER)
    }

    /// Truncate for the transport push; appends [`TRUNCATION_MARKER`] when cut.
    pub fn truncate_for_transport(&self, content: &str) -> String {
        truncate_to_ceiling(content, self.ceilings.transport, TRUNCATION_MARKER)
    }

    /// Truncate for the OS clipboard write; appends [`TRUNCATION_MARKER`] when cut.
    pub fn truncate_for_clipboard(&self, content: &str) -> String {
        truncate_to_ceiling(content, self.ceilings.clipboard, TRUNCATION_MARKER)
    }

    /// Truncate for rendering; appends [`UI_TRUNCATION_MARKER`] when cut.
    pub fn truncate_for_ui(&self, content: &str) -> String {
        truncate_to_ceiling(content, self.ceilings.ui, UI_TRUNCATION_MARKER)
    }
}

/// Longest character-aligned prefix whose byte length is ≤ `ceiling`,
/// with `marker` appended when anything was cut.
///
/// Binary search over the character index space; each probe re-encodes a
/// prefix, so the cost is O(n log n) on oversized content. The marker is
/// assumed short relative to the ceiling, so the combined result is not
/// re-validated against the ceiling.
fn truncate_to_ceiling(content: &str, ceiling: usize, marker: &str) -> String {
    if content.len() <= ceiling {
        return content.to_string();
    }

    let char_count = content.chars().count();
    let mut lo = 0usize;
    let mut hi = char_count;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if prefix_byte_len(content, mid) <= ceiling {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    let prefix_bytes = prefix_byte_len(content, lo);
    let mut out = String::with_capacity(prefix_bytes + marker.len());
    out.push_str(&content[..prefix_bytes]);
    out.push_str(marker);
    out
}

/// Byte length of the first `chars` characters of `content`.
fn prefix_byte_len(content: &str, chars: usize) -> usize {
    content
        .char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len())
}
