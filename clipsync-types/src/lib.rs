//! # clipsync-types
//!
//! Shared value types for the ClipSync clipboard synchronization engine.
//!
//! This crate provides the foundational types used across all ClipSync crates:
//! - [`EntryId`], [`EntryOrigin`], [`ClipboardEntry`] - History entry types
//! - [`SyncStatus`], [`NetworkStatus`] - Engine and connectivity dispositions
//! - [`ServerConfig`], [`AppSettings`] - Configuration snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entry;
mod settings;
mod status;

pub use entry::{ClipboardEntry, EntryId, EntryOrigin};
pub use settings::{AppSettings, ServerConfig, MIN_SYNC_INTERVAL_SECS, RECOMMENDED_SYNC_INTERVAL_SECS};
pub use status::{NetworkStatus, SyncStatus};
