//! Sync state machine.
//!
//! This module provides a pure, side-effect-free state machine for the
//! engine's disposition. The machine takes events as input and produces a
//! new machine plus a list of actions to execute.
//!
//! The actual I/O (marking the server config, notifying the host) is
//! performed by clipsync-engine, not by this module. This enables instant
//! unit testing without mocks.
//!
//! Every attempt passes through `Syncing` - there is no transition from
//! `Idle` directly to an outcome state - and every outcome quiesces back
//! to `Idle`, so the machine is a perpetually cycling control loop with no
//! terminal state.

use clipsync_types::SyncStatus;

/// Events observed during the attempt lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A scheduler-triggered attempt started.
    AttemptStarted,
    /// The round trip completed with no conflict errors.
    Succeeded,
    /// Network-layer failure (timeout, connection refused, network lost).
    NetworkFailed {
        /// Human-readable failure reason.
        reason: String,
    },
    /// Protocol-layer failure (auth rejected, malformed payload,
    /// content rejected by server-side limits).
    ProtocolFailed {
        /// Human-readable failure reason.
        reason: String,
    },
    /// The engine quiesced awaiting the next scheduled trigger.
    Quiesced,
}

/// Actions to be executed by the engine.
///
/// These are instructions, not side effects. The executor interprets them
/// and performs the actual writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Record `is_connected = true` on the server config.
    MarkConnected,
    /// Record `is_connected = false` on the server config.
    MarkDisconnected,
    /// Surface the new status to observers.
    NotifyStatus(SyncStatus),
}

/// Pure state machine over [`SyncStatus`] - NO I/O, just transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStateMachine {
    status: SyncStatus,
}

impl SyncStateMachine {
    /// Create a machine in the initial `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current status.
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Whether a new attempt may start (nothing in flight).
    pub fn can_start_attempt(&self) -> bool {
        !self.status.is_syncing()
    }

    /// Process an event and return the new machine plus actions.
    ///
    /// Transitions are total functions of (current state, event):
    /// undefined pairs keep the current state and produce no actions.
    pub fn on_event(self, event: SyncEvent) -> (Self, Vec<SyncAction>) {
        use SyncStatus::*;

        match (self.status, event) {
            (Idle, SyncEvent::AttemptStarted) => {
                (Self { status: Syncing }, vec![SyncAction::NotifyStatus(Syncing)])
            }

            (Syncing, SyncEvent::Succeeded) => (
                Self { status: Connected },
                vec![
                    SyncAction::MarkConnected,
                    SyncAction::NotifyStatus(Connected),
                ],
            ),
            (Syncing, SyncEvent::NetworkFailed { .. }) => (
                Self { status: Disconnected },
                vec![
                    SyncAction::MarkDisconnected,
                    SyncAction::NotifyStatus(Disconnected),
                ],
            ),
            // The server *did* respond, just with an error: leave the
            // connection flag alone.
            (Syncing, SyncEvent::ProtocolFailed { .. }) => {
                (Self { status: Error }, vec![SyncAction::NotifyStatus(Error)])
            }

            (Connected | Disconnected | Error, SyncEvent::Quiesced) => {
                (Self { status: Idle }, vec![SyncAction::NotifyStatus(Idle)])
            }

            // Undefined pairs - stay in current state
            (status, _) => (Self { status }, vec![]),
        }
    }
}
