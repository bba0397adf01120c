//! History ledger.
//!
//! A bounded, ordered log of synced clipboard entries, most-recent-first.
//! Entries are immutable once stored; the ledger evicts from the tail and
//! never mutates. Content is passed through the governor's database
//! truncation before storage, so the ledger never holds unbounded text.

use std::collections::VecDeque;

use clipsync_types::ClipboardEntry;

use crate::governor::ContentGovernor;

/// Result of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The entry was inserted at the head.
    Appended,
    /// The content was byte-identical to the latest entry; nothing changed.
    ///
    /// This absorbs the loopback of a sync echoing back content the device
    /// itself just sent.
    DuplicateOfLatest,
}

/// Bounded most-recent-first log of synced clipboard entries.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    capacity: usize,
    governor: ContentGovernor,
    entries: VecDeque<ClipboardEntry>,
}

impl HistoryLedger {
    /// Create an empty ledger retaining at most `capacity` entries.
    pub fn new(capacity: usize, governor: ContentGovernor) -> Self {
        Self {
            capacity,
            governor,
            entries: VecDeque::new(),
        }
    }

    /// Rebuild a ledger from persisted entries (most-recent-first).
    ///
    /// Entries beyond `capacity` are dropped; oversized content is
    /// hard-truncated rather than rejected, so a corrupt or downgraded
    /// snapshot cannot violate the bound.
    pub fn from_entries(
        capacity: usize,
        governor: ContentGovernor,
        entries: Vec<ClipboardEntry>,
    ) -> Self {
        let mut ledger = Self::new(capacity, governor);
        for entry in entries.into_iter().rev() {
            let content = governor.truncate_for_database(&entry.content);
            let entry = if content == entry.content {
                entry
            } else {
                entry.with_content(content)
            };
            ledger.entries.push_front(entry);
        }
        ledger.prune();
        ledger
    }

    /// Insert at the head, then prune; idempotent for content identical to
    /// [`HistoryLedger::latest`].
    ///
    /// Append-then-prune runs in this single call, so a caller holding the
    /// ledger behind a lock never exposes a length above capacity.
    pub fn append(&mut self, entry: ClipboardEntry) -> AppendOutcome {
        let content = self.governor.truncate_for_database(&entry.content);
        let entry = if content == entry.content {
            entry
        } else {
            entry.with_content(content)
        };

        if let Some(latest) = self.entries.front() {
            if latest.content == entry.content {
                return AppendOutcome::DuplicateOfLatest;
            }
        }

        self.entries.push_front(entry);
        self.prune();
        AppendOutcome::Appended
    }

    /// Evict entries beyond the retained count, oldest first.
    pub fn prune(&mut self) {
        self.entries.truncate(self.capacity);
    }

    /// Change the retained count, pruning immediately if it shrank.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.prune();
    }

    /// The retained count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read-only view of the entries, most-recent-first.
    pub fn entries(&self) -> impl Iterator<Item = &ClipboardEntry> {
        self.entries.iter()
    }

    /// The most recent entry, if any.
    pub fn latest(&self) -> Option<&ClipboardEntry> {
        self.entries.front()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
