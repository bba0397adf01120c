//! # clipsync-engine
//!
//! The ClipSync synchronization engine: decides *when* to sync (scheduler),
//! performs one attempt at a time (executor), and talks to the host through
//! narrow collaborator ports.
//!
//! # Architecture
//!
//! ```text
//! Host app → SyncScheduler → SyncExecutor → Transport → Network
//!                  ↓              ↓
//!            SettingsStore   clipsync-core (pure governor/machine/ledger)
//!                  ↓              ↓
//!            KeyValueStore   Clipboard / StatusNotifier
//! ```
//!
//! The pure logic lives in `clipsync-core`; this crate interprets the state
//! machine's actions, owns the single background worker context, and
//! persists settings and history through the [`KeyValueStore`] port.
//!
//! # Example
//!
//! ```ignore
//! use clipsync_core::ContentGovernor;
//! use clipsync_engine::{
//!     HistoryStore, MemoryStore, MockClipboard, MockTransport, SettingsStore, SyncExecutor,
//! };
//!
//! let store = Arc::new(MemoryStore::new());
//! let settings = Arc::new(SettingsStore::load(store.clone()).await?);
//! let history = Arc::new(HistoryStore::load(store, 25, ContentGovernor::default()).await?);
//! let executor = SyncExecutor::new(MockTransport::new(), MockClipboard::new(), settings, history);
//! executor.sync_once().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod clipboard;
mod executor;
mod history;
mod notify;
mod scheduler;
mod store;
mod transport;

pub use clipboard::{Clipboard, ClipboardError, MockClipboard};
pub use executor::{now_unix_ms, SyncError, SyncExecutor, SyncOutcome, DEFAULT_ROUND_TRIP_TIMEOUT};
pub use history::HistoryStore;
pub use notify::{LogNotifier, MockNotifier, StatusNotifier};
pub use scheduler::{SyncScheduler, SyncTrigger, TriggerDecision};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, SettingsStore, StoreError};
pub use transport::{HttpTransport, MockTransport, RemoteLatest, Transport, TransportError};
