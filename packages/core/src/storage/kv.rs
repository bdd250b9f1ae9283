//! Key-Value Store
//!
//! Small string-to-string store abstraction backing [`LocalNotesStore`] and
//! the theme preference. The original host kept this data in the browser's
//! localStorage; here the same contract is satisfied by an in-process map
//! (tests, ephemeral sessions) or a single JSON file on disk.
//!
//! [`LocalNotesStore`]: crate::storage::LocalNotesStore

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::models::Theme;
use crate::storage::StoreError;

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "personal-notes-theme";

/// String key-value storage.
///
/// Implementations are fallible; the never-raise policy is applied by the
/// callers that sit on the repository boundary, not here.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value for a key, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or replace the value for a key.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory key-value store.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value store persisted as one JSON object in a single file.
///
/// Writes are atomic (temp file + rename). A missing file reads as an empty
/// store; an unreadable file is reset on the next write.
pub struct JsonFileKv {
    path: PathBuf,
}

impl JsonFileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> Result<HashMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string_pretty(map)?;

        // Atomic write: write to temp file, then rename
        let mut temp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "kv".into());
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        fs::write(&temp_path, serialized).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(StoreError::Json(err)) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "key-value file unreadable, resetting"
                );
                HashMap::new()
            }
            Err(other) => return Err(other),
        };
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }
}

/// Read the persisted theme, defaulting on absence or any failure.
pub async fn load_theme(kv: &dyn KeyValueStore) -> Theme {
    match kv.get(THEME_KEY).await {
        Ok(Some(value)) => Theme::from_stored(&value),
        Ok(None) => Theme::default(),
        Err(err) => {
            warn!(error = %err, "failed to read theme preference");
            Theme::default()
        }
    }
}

/// Persist the theme choice; failures are logged and swallowed.
pub async fn save_theme(kv: &dyn KeyValueStore, theme: Theme) {
    if let Err(err) = kv.set(THEME_KEY, theme.as_str()).await {
        warn!(error = %err, "failed to persist theme preference");
    }
}
