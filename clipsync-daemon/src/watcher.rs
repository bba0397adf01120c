//! Local clipboard watcher.
//!
//! Polls the OS clipboard and feeds changed text into the history ledger
//! as `origin = Local` entries. The ledger's idempotent append absorbs
//! repeated reads and the loopback of a sync echoing back content this
//! device just sent.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use clipsync_engine::{now_unix_ms, Clipboard, HistoryStore, SettingsStore};
use clipsync_types::ClipboardEntry;

/// Spawn the background watcher task.
///
/// Returns a handle that can be used to abort the task on shutdown.
pub fn spawn_clipboard_watcher<C: Clipboard + 'static>(
    clipboard: C,
    history: Arc<HistoryStore>,
    settings: Arc<SettingsStore>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let poll_ms = poll_interval.as_millis() as u64;
        tracing::info!(poll_ms, "clipboard watcher started");
        let mut ticker = tokio::time::interval(poll_interval);
        let mut last_seen: Option<String> = None;

        loop {
            ticker.tick().await;

            let current = match clipboard.read_current().await {
                Ok(current) => current,
                Err(e) => {
                    tracing::debug!(error = %e, "clipboard read failed");
                    continue;
                }
            };
            let Some(content) = current else { continue };
            if content.is_empty() || last_seen.as_deref() == Some(content.as_str()) {
                continue;
            }
            last_seen = Some(content.clone());

            let device_name = settings.settings().await.device_name;
            let entry = ClipboardEntry::local(content, &device_name, now_unix_ms());
            match history.append(entry).await {
                Ok(outcome) => tracing::debug!(?outcome, "local clipboard change observed"),
                Err(e) => tracing::error!(error = %e, "failed to record clipboard change"),
            }
        }
    })
}
