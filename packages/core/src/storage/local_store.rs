//! Key-Value Notes Store
//!
//! Persists the whole collection as one JSON array under a namespaced key,
//! the way the original web build of the app used browser localStorage. The
//! key is versioned so a future format change can migrate by switching keys.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{sort_notes, Note};
use crate::storage::{KeyValueStore, NotesStore, StoreError};

/// Default key under which the notes array lives.
pub const DEFAULT_NOTES_KEY: &str = "personal-notes-v1";

/// Notes store backed by any [`KeyValueStore`].
pub struct LocalNotesStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalNotesStore {
    /// Store notes under [`DEFAULT_NOTES_KEY`].
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, DEFAULT_NOTES_KEY)
    }

    /// Store notes under a custom key.
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    async fn try_load(&self) -> Result<Vec<Note>, StoreError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        let value: Value = serde_json::from_str(&raw)?;
        let Value::Array(entries) = value else {
            warn!(key = %self.key, "stored notes are not an array, ignoring");
            return Ok(Vec::new());
        };

        // Shape filtering: anything that does not deserialize to a Note is
        // dropped. Duplicate ids keep their first occurrence.
        let mut seen: HashSet<String> = HashSet::new();
        let mut notes = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Note>(entry) {
                Ok(note) => {
                    if seen.insert(note.id.clone()) {
                        notes.push(note);
                    } else {
                        debug!(key = %self.key, id = %note.id, "dropping duplicate note entry");
                    }
                }
                Err(err) => {
                    debug!(key = %self.key, error = %err, "dropping malformed note entry");
                }
            }
        }

        sort_notes(&mut notes);
        Ok(notes)
    }

    async fn try_save(&self, notes: &[Note]) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(notes)?;
        self.kv.set(&self.key, &serialized).await
    }
}

#[async_trait]
impl NotesStore for LocalNotesStore {
    async fn load_notes(&self) -> Vec<Note> {
        match self.try_load().await {
            Ok(notes) => notes,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to load notes, starting empty");
                Vec::new()
            }
        }
    }

    async fn save_notes(&self, notes: &[Note]) {
        if let Err(err) = self.try_save(notes).await {
            warn!(key = %self.key, error = %err, "failed to persist notes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKv;

    fn store() -> (Arc<MemoryKv>, LocalNotesStore) {
        let kv = Arc::new(MemoryKv::new());
        let store = LocalNotesStore::new(kv.clone());
        (kv, store)
    }

    fn note(id: &str, updated_at: i64) -> Note {
        Note {
            id: id.to_string(),
            title: id.to_string(),
            content: String::new(),
            tags: Vec::new(),
            created_at: updated_at,
            updated_at,
        }
    }

    #[tokio::test]
    async fn absent_key_loads_empty() {
        let (_kv, store) = store();
        assert!(store.load_notes().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_loads_empty() {
        let (kv, store) = store();
        kv.set(DEFAULT_NOTES_KEY, "{ definitely not json")
            .await
            .unwrap();
        assert!(store.load_notes().await.is_empty());
    }

    #[tokio::test]
    async fn non_array_payload_loads_empty() {
        let (kv, store) = store();
        kv.set(DEFAULT_NOTES_KEY, r#"{"id":"n1"}"#).await.unwrap();
        assert!(store.load_notes().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_entries_are_dropped_not_fatal() {
        let (kv, store) = store();
        kv.set(
            DEFAULT_NOTES_KEY,
            r#"[{"id":"keep","updatedAt":5}, {"title":"no id"}, 42, {"id":"sparse"}]"#,
        )
        .await
        .unwrap();

        let notes = store.load_notes().await;
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["keep", "sparse"]);
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first_occurrence() {
        let (kv, store) = store();
        kv.set(
            DEFAULT_NOTES_KEY,
            r#"[{"id":"n1","title":"first"},{"id":"n1","title":"second"}]"#,
        )
        .await
        .unwrap();

        let notes = store.load_notes().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "first");
    }

    #[tokio::test]
    async fn save_replaces_previous_state_entirely() {
        let (_kv, store) = store();
        store
            .save_notes(&[note("a", 1), note("b", 2), note("c", 3)])
            .await;
        store.save_notes(&[note("b", 2)]).await;

        let notes = store.load_notes().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "b");
    }

    #[tokio::test]
    async fn load_returns_newest_first() {
        let (_kv, store) = store();
        store
            .save_notes(&[note("old", 10), note("new", 30), note("mid", 20)])
            .await;

        let notes = store.load_notes().await;
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn sync_callers_can_drive_the_store() {
        let (_kv, store) = store();
        let notes = tokio_test::block_on(store.load_notes());
        assert!(notes.is_empty());
    }
}
