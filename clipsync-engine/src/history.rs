//! Persistent history store.
//!
//! Wraps the pure [`HistoryLedger`] behind one mutex and persists the full
//! ordered entry list through the [`KeyValueStore`] port after each
//! mutation. Append-then-prune happens inside the ledger under the lock,
//! so a concurrent reader can never observe a length above the retained
//! count.

use std::sync::Arc;

use tokio::sync::Mutex;

use clipsync_core::{AppendOutcome, ContentGovernor, HistoryLedger};
use clipsync_types::ClipboardEntry;

use crate::store::{KeyValueStore, StoreError, HISTORY_KEY};

/// Mutex-guarded, persisted history ledger.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    ledger: Mutex<HistoryLedger>,
}

impl HistoryStore {
    /// Load persisted entries into a ledger bounded to `capacity`.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        capacity: usize,
        governor: ContentGovernor,
    ) -> Result<Self, StoreError> {
        let entries: Vec<ClipboardEntry> = match store.get(HISTORY_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            None => Vec::new(),
        };
        let ledger = HistoryLedger::from_entries(capacity, governor, entries);
        Ok(Self {
            store,
            ledger: Mutex::new(ledger),
        })
    }

    /// Append an entry; persists only when the ledger actually changed.
    pub async fn append(&self, entry: ClipboardEntry) -> Result<AppendOutcome, StoreError> {
        let mut ledger = self.ledger.lock().await;
        let outcome = ledger.append(entry);
        if outcome == AppendOutcome::Appended {
            self.persist(&ledger).await?;
        } else {
            tracing::debug!("history append skipped: duplicate of latest");
        }
        Ok(outcome)
    }

    /// The most recent entry, if any.
    pub async fn latest(&self) -> Option<ClipboardEntry> {
        self.ledger.lock().await.latest().cloned()
    }

    /// Snapshot of all entries, most-recent-first (UI read path).
    pub async fn entries(&self) -> Vec<ClipboardEntry> {
        self.ledger.lock().await.entries().cloned().collect()
    }

    /// Number of retained entries.
    pub async fn len(&self) -> usize {
        self.ledger.lock().await.len()
    }

    /// Whether the ledger holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.ledger.lock().await.is_empty()
    }

    /// Apply a new retained count (settings change), pruning if needed.
    pub async fn set_capacity(&self, capacity: usize) -> Result<(), StoreError> {
        let mut ledger = self.ledger.lock().await;
        if ledger.capacity() == capacity {
            return Ok(());
        }
        ledger.set_capacity(capacity);
        self.persist(&ledger).await
    }

    async fn persist(&self, ledger: &HistoryLedger) -> Result<(), StoreError> {
        let entries: Vec<&ClipboardEntry> = ledger.entries().collect();
        let json = serde_json::to_string(&entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(HISTORY_KEY, &json).await
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore").finish_non_exhaustive()
    }
}
