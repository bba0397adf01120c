//! Persistence port and settings store.
//!
//! The engine consumes persistence through a narrow key-value contract:
//! `get`/`set` of string values, with whole-snapshot writes so a settings
//! update is atomic from the reader's perspective.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use clipsync_types::{AppSettings, ServerConfig};

/// Key under which the [`AppSettings`] snapshot is persisted.
pub(crate) const SETTINGS_KEY: &str = "settings";
/// Key under which the [`ServerConfig`] snapshot is persisted.
pub(crate) const SERVER_KEY: &str = "server";
/// Key under which the history ledger entries are persisted.
pub(crate) const HISTORY_KEY: &str = "history";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing store failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted snapshot could not be (de)serialized.
    #[error("store serialization failed: {0}")]
    Serialization(String),
}

/// Key-value persistence port.
///
/// Implementations must make `set` a full-value replace so readers never
/// observe a partially written snapshot.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store.
///
/// Clones share state, which makes it useful both as a test double and as
/// the backing store for ephemeral (mock-transport) runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file-backed store.
///
/// Holds the full key-value map in memory and rewrites one JSON file per
/// mutation. Suitable for the small record set this engine persists
/// (settings, server config, bounded history).
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading the existing file if present.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let cache = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    /// The file this store writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, cache: &HashMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(cache)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let cache = self.cache.lock().await;
        Ok(cache.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().await;
        cache.insert(key.to_string(), value.to_string());
        self.flush(&cache).await
    }
}

/// Source of truth for sync cadence, device identity and history depth.
///
/// Both snapshots are held as immutable values and replaced wholesale:
/// readers clone, writers persist first and then swap.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<AppSettings>,
    server: RwLock<ServerConfig>,
}

impl SettingsStore {
    /// Load persisted snapshots, falling back to defaults for absent keys.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let settings = match store.get(SETTINGS_KEY).await? {
            Some(json) => {
                let parsed: AppSettings = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                let normalized = parsed.clone().normalized();
                if normalized != parsed {
                    tracing::warn!(
                        interval_secs = normalized.sync_interval_secs,
                        "persisted sync interval below floor, clamped"
                    );
                }
                normalized
            }
            None => AppSettings::default(),
        };
        let server = match store.get(SERVER_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            None => ServerConfig::default(),
        };
        Ok(Self {
            store,
            settings: RwLock::new(settings),
            server: RwLock::new(server),
        })
    }

    /// Current settings snapshot.
    pub async fn settings(&self) -> AppSettings {
        self.settings.read().await.clone()
    }

    /// Current server config snapshot.
    pub async fn server_config(&self) -> ServerConfig {
        self.server.read().await.clone()
    }

    /// Replace the settings snapshot atomically.
    pub async fn update_settings(&self, new: AppSettings) -> Result<(), StoreError> {
        let normalized = new.clone().normalized();
        if normalized != new {
            tracing::warn!(
                interval_secs = normalized.sync_interval_secs,
                "sync interval below floor, clamped"
            );
        }
        self.persist_settings(&normalized).await?;
        *self.settings.write().await = normalized;
        Ok(())
    }

    /// Apply a user edit of the server endpoint.
    ///
    /// Invalidates `is_connected` until the next attempt proves
    /// reachability.
    pub async fn set_server_endpoint(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        let edited = self.server.read().await.edited(url, username, password);
        self.persist_server(&edited).await?;
        *self.server.write().await = edited;
        Ok(())
    }

    /// Record a successful attempt: server reachable, sync time observed.
    pub async fn record_sync_success(&self, timestamp_ms: u64) -> Result<(), StoreError> {
        let mut updated = self.server.read().await.clone();
        updated.is_connected = true;
        updated.last_sync_time_ms = Some(timestamp_ms);
        self.persist_server(&updated).await?;
        *self.server.write().await = updated;
        Ok(())
    }

    /// Record the observed reachability of the server.
    pub async fn mark_connected(&self, is_connected: bool) -> Result<(), StoreError> {
        let mut updated = self.server.read().await.clone();
        updated.is_connected = is_connected;
        self.persist_server(&updated).await?;
        *self.server.write().await = updated;
        Ok(())
    }

    async fn persist_settings(&self, settings: &AppSettings) -> Result<(), StoreError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(SETTINGS_KEY, &json).await
    }

    async fn persist_server(&self, server: &ServerConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string(server)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(SERVER_KEY, &json).await
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // MemoryStore Tests
    // ===========================================

    #[tokio::test]
    async fn memory_store_get_set() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v1".to_string()));

        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn memory_store_clone_shares_state() {
        let store1 = MemoryStore::new();
        let store2 = store1.clone();

        store1.set("k", "v").await.unwrap();
        assert_eq!(store2.get("k").await.unwrap(), Some("v".to_string()));
    }

    // ===========================================
    // JsonFileStore Tests
    // ===========================================

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.set("settings", "{\"a\":1}").await.unwrap();
        }

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("settings").await.unwrap(),
            Some("{\"a\":1}".to_string())
        );
    }

    #[tokio::test]
    async fn file_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dirs/state.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.set("k", "v").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    // ===========================================
    // SettingsStore Tests
    // ===========================================

    async fn settings_store() -> (MemoryStore, SettingsStore) {
        let store = MemoryStore::new();
        let settings = SettingsStore::load(Arc::new(store.clone())).await.unwrap();
        (store, settings)
    }

    #[tokio::test]
    async fn absent_keys_yield_defaults() {
        let (_, store) = settings_store().await;
        assert_eq!(store.settings().await, AppSettings::default());
        assert_eq!(store.server_config().await, ServerConfig::default());
    }

    #[tokio::test]
    async fn update_settings_persists_and_survives_reload() {
        let (backing, store) = settings_store().await;
        let new = AppSettings {
            sync_interval_secs: 120,
            device_name: "workstation".into(),
            ..AppSettings::default()
        };
        store.update_settings(new.clone()).await.unwrap();

        let reloaded = SettingsStore::load(Arc::new(backing)).await.unwrap();
        assert_eq!(reloaded.settings().await, new);
    }

    #[tokio::test]
    async fn update_clamps_interval_floor() {
        let (_, store) = settings_store().await;
        store
            .update_settings(AppSettings {
                sync_interval_secs: 0,
                ..AppSettings::default()
            })
            .await
            .unwrap();
        assert_eq!(
            store.settings().await.sync_interval_secs,
            clipsync_types::MIN_SYNC_INTERVAL_SECS
        );
    }

    #[tokio::test]
    async fn load_clamps_persisted_interval() {
        let backing = MemoryStore::new();
        backing
            .set(
                SETTINGS_KEY,
                &serde_json::to_string(&AppSettings {
                    sync_interval_secs: 0,
                    ..AppSettings::default()
                })
                .unwrap(),
            )
            .await
            .unwrap();

        let store = SettingsStore::load(Arc::new(backing)).await.unwrap();
        assert_eq!(
            store.settings().await.sync_interval_secs,
            clipsync_types::MIN_SYNC_INTERVAL_SECS
        );
    }

    #[tokio::test]
    async fn endpoint_edit_resets_connection_flag() {
        let (_, store) = settings_store().await;
        store.record_sync_success(1_000).await.unwrap();
        assert!(store.server_config().await.is_connected);

        store
            .set_server_endpoint("https://new.example", "alice", "pw")
            .await
            .unwrap();

        let config = store.server_config().await;
        assert!(!config.is_connected);
        assert_eq!(config.url, "https://new.example");
        assert_eq!(config.last_sync_time_ms, Some(1_000));
    }

    #[tokio::test]
    async fn sync_success_records_time_and_connection() {
        let (_, store) = settings_store().await;
        store.record_sync_success(42_000).await.unwrap();

        let config = store.server_config().await;
        assert!(config.is_connected);
        assert_eq!(config.last_sync_time_ms, Some(42_000));

        store.mark_connected(false).await.unwrap();
        let config = store.server_config().await;
        assert!(!config.is_connected);
        assert_eq!(config.last_sync_time_ms, Some(42_000));
    }
}
