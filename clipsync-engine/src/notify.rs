//! Notification port.
//!
//! Fire-and-forget observer of status transitions; the engine never
//! consumes a return value. Only consulted when `show_notifications` is
//! set - the tracing log carries every transition regardless.

use std::sync::{Arc, Mutex};

use clipsync_types::SyncStatus;

/// Notification collaborator port.
pub trait StatusNotifier: Send + Sync {
    /// Called on every status transition.
    fn status_changed(&self, previous: SyncStatus, current: SyncStatus);
}

/// Notifier that forwards transitions to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl StatusNotifier for LogNotifier {
    fn status_changed(&self, previous: SyncStatus, current: SyncStatus) {
        tracing::info!(%previous, %current, "sync status changed");
    }
}

/// Recording notifier for testing.
///
/// Clones share state.
#[derive(Debug, Default)]
pub struct MockNotifier {
    events: Arc<Mutex<Vec<(SyncStatus, SyncStatus)>>>,
}

impl MockNotifier {
    /// Create a notifier with no recorded events.
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(previous, current)` transitions observed so far.
    pub fn events(&self) -> Vec<(SyncStatus, SyncStatus)> {
        self.events.lock().unwrap().clone()
    }
}

impl Clone for MockNotifier {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl StatusNotifier for MockNotifier {
    fn status_changed(&self, previous: SyncStatus, current: SyncStatus) {
        self.events.lock().unwrap().push((previous, current));
    }
}
