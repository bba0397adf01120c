//! Sync executor.
//!
//! Performs one synchronization attempt: compare local vs. remote, resolve
//! last-writer-wins, apply the winner, update ledger and server config.
//! Protocol logic is the pure state machine from `clipsync-core`; this
//! module interprets its actions and performs the actual I/O.
//!
//! The `Syncing` guard in the machine is the sole mutual-exclusion
//! mechanism: concurrent triggers coalesce into at most one in-flight
//! attempt, and every attempt settles back to `Idle` so the scheduler can
//! always fire again.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::{watch, Mutex};

use clipsync_core::{ContentGovernor, SyncAction, SyncEvent, SyncStateMachine};
use clipsync_types::{ClipboardEntry, SyncStatus};

use crate::clipboard::{Clipboard, ClipboardError};
use crate::history::HistoryStore;
use crate::notify::{LogNotifier, StatusNotifier};
use crate::store::{SettingsStore, StoreError};
use crate::transport::{RemoteLatest, Transport, TransportError};

/// Bounded wait for one network round trip.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(30);

/// Executor errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An attempt is already in flight; the trigger is rejected.
    #[error("an attempt is already in flight")]
    AlreadySyncing,

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Clipboard error.
    #[error("clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether the failure is network-layer (server never answered).
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Transport(t) if t.is_network_failure())
    }
}

/// What a successful attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local and remote already agree; no write occurred.
    UpToDate,
    /// The local entry won and was pushed to the server.
    PushedLocal,
    /// The remote entry won and was applied to ledger and clipboard.
    AppliedRemote,
}

/// Unix timestamp in milliseconds.
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Performs sync attempts against the transport and interprets the state
/// machine's actions.
pub struct SyncExecutor<T: Transport, C: Clipboard> {
    transport: T,
    clipboard: C,
    settings: Arc<SettingsStore>,
    history: Arc<HistoryStore>,
    governor: ContentGovernor,
    notifier: Arc<dyn StatusNotifier>,
    machine: Mutex<SyncStateMachine>,
    last_outcome: Mutex<SyncStatus>,
    status_tx: watch::Sender<SyncStatus>,
    round_trip_timeout: Duration,
}

impl<T: Transport, C: Clipboard> SyncExecutor<T, C> {
    /// Create an executor with default governor, timeout and log notifier.
    pub fn new(
        transport: T,
        clipboard: C,
        settings: Arc<SettingsStore>,
        history: Arc<HistoryStore>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            transport,
            clipboard,
            settings,
            history,
            governor: ContentGovernor::default(),
            notifier: Arc::new(LogNotifier),
            machine: Mutex::new(SyncStateMachine::new()),
            last_outcome: Mutex::new(SyncStatus::Idle),
            status_tx,
            round_trip_timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }

    /// Use a custom governor (ceilings are policy, not derived values).
    pub fn with_governor(mut self, governor: ContentGovernor) -> Self {
        self.governor = governor;
        self
    }

    /// Use a custom notification collaborator.
    pub fn with_notifier(mut self, notifier: Arc<dyn StatusNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Use a custom round-trip timeout.
    pub fn with_round_trip_timeout(mut self, timeout: Duration) -> Self {
        self.round_trip_timeout = timeout;
        self
    }

    /// The current status.
    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// The most recent terminal outcome (`Connected`, `Disconnected` or
    /// `Error`; `Idle` before the first attempt).
    ///
    /// The machine always quiesces to `Idle` after an attempt, so the
    /// scheduler's network-recovery precondition reads this instead.
    pub async fn last_outcome(&self) -> SyncStatus {
        *self.last_outcome.lock().await
    }

    /// Run one synchronization attempt.
    ///
    /// Returns [`SyncError::AlreadySyncing`] without touching anything if
    /// an attempt is in flight. Otherwise the machine passes through
    /// `Syncing`, settles on the outcome, and quiesces back to `Idle`
    /// regardless of the result.
    pub async fn sync_once(&self) -> Result<SyncOutcome, SyncError> {
        // Begin: quiesce a leftover outcome state, then enter Syncing.
        // One lock scope so concurrent callers cannot both pass the guard.
        let begin_actions = {
            let mut machine = self.machine.lock().await;
            if !machine.can_start_attempt() {
                return Err(SyncError::AlreadySyncing);
            }
            let mut actions = Vec::new();
            if machine.status().is_outcome() {
                let (next, quiesce) = machine.on_event(SyncEvent::Quiesced);
                *machine = next;
                actions.extend(quiesce);
            }
            let (next, start) = machine.on_event(SyncEvent::AttemptStarted);
            *machine = next;
            actions.extend(start);
            actions
        };
        self.run_actions(begin_actions).await;

        let result = self.attempt().await;

        // Settle on the outcome, record it, quiesce back to Idle.
        let settle_event = match &result {
            Ok(_) => SyncEvent::Succeeded,
            Err(e) if e.is_network_failure() => SyncEvent::NetworkFailed {
                reason: e.to_string(),
            },
            Err(e) => SyncEvent::ProtocolFailed {
                reason: e.to_string(),
            },
        };
        let settle_actions = {
            let mut machine = self.machine.lock().await;
            let (next, mut actions) = machine.on_event(settle_event);
            *machine = next;
            *self.last_outcome.lock().await = machine.status();
            let (next, quiesce) = machine.on_event(SyncEvent::Quiesced);
            *machine = next;
            actions.extend(quiesce);
            actions
        };
        self.run_actions(settle_actions).await;

        match &result {
            Ok(outcome) => tracing::info!(?outcome, "sync attempt succeeded"),
            Err(e) if e.is_network_failure() => {
                tracing::warn!(error = %e, "sync attempt failed: server unreachable")
            }
            Err(e) => tracing::warn!(error = %e, "sync attempt failed: protocol error"),
        }
        result
    }

    /// The attempt proper: fetch, reconcile, apply.
    ///
    /// No ledger or server-config write happens before the network phase
    /// completes, so a torn-down process leaves the attempt absent rather
    /// than half-committed.
    async fn attempt(&self) -> Result<SyncOutcome, SyncError> {
        let config = self.settings.server_config().await;
        let local = self.history.latest().await;

        let remote = tokio::time::timeout(
            self.round_trip_timeout,
            self.transport.fetch_remote_latest(&config),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;

        match (local, remote) {
            (None, None) => Ok(SyncOutcome::UpToDate),
            (Some(local), None) => self.push_local(local).await,
            (None, Some(remote)) => self.apply_remote(remote).await,
            (Some(local), Some(remote)) => {
                // Byte-equality after database normalization: the sync is
                // an echo, not a change.
                let normalized = self.governor.truncate_for_database(&remote.content);
                if normalized == local.content {
                    return Ok(SyncOutcome::UpToDate);
                }
                if remote.timestamp_ms > local.timestamp_ms {
                    self.apply_remote(remote).await
                } else {
                    // Strictly newer local, or a tie: the entry already
                    // present locally wins (avoids oscillation).
                    self.push_local(local).await
                }
            }
        }
    }

    async fn push_local(&self, entry: ClipboardEntry) -> Result<SyncOutcome, SyncError> {
        let config = self.settings.server_config().await;
        let outbound = if self.governor.exceeds_transport_limit(&entry.content) {
            tracing::warn!(
                bytes = entry.size_bytes,
                "local entry exceeds transport ceiling, truncating for push"
            );
            let content = self.governor.truncate_for_transport(&entry.content);
            entry.with_content(content)
        } else {
            entry
        };

        tokio::time::timeout(
            self.round_trip_timeout,
            self.transport.push_local_latest(&config, &outbound),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;

        Ok(SyncOutcome::PushedLocal)
    }

    async fn apply_remote(&self, remote: RemoteLatest) -> Result<SyncOutcome, SyncError> {
        let entry = ClipboardEntry::remote(
            remote.content.clone(),
            &remote.source_device,
            remote.timestamp_ms,
        );
        self.history.append(entry).await?;

        let for_clipboard = self.governor.truncate_for_clipboard(&remote.content);
        self.clipboard.write_current(&for_clipboard).await?;

        Ok(SyncOutcome::AppliedRemote)
    }

    /// Interpret the machine's actions.
    ///
    /// Persistence failures while settling are logged rather than
    /// propagated: the transition itself already happened.
    async fn run_actions(&self, actions: Vec<SyncAction>) {
        for action in actions {
            match action {
                SyncAction::MarkConnected => {
                    if let Err(e) = self.settings.record_sync_success(now_unix_ms()).await {
                        tracing::error!(error = %e, "failed to record sync success");
                    }
                }
                SyncAction::MarkDisconnected => {
                    if let Err(e) = self.settings.mark_connected(false).await {
                        tracing::error!(error = %e, "failed to record disconnection");
                    }
                }
                SyncAction::NotifyStatus(current) => {
                    let previous = self.status_tx.send_replace(current);
                    if previous != current && self.settings.settings().await.show_notifications {
                        self.notifier.status_changed(previous, current);
                    }
                }
            }
        }
    }
}

impl<T: Transport, C: Clipboard> std::fmt::Debug for SyncExecutor<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncExecutor")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
