//! Notes Service Integration Tests
//!
//! Drives the full stack: service lifecycle over real storage backends,
//! hydration gating, save coalescing, and cross-session persistence.

#[cfg(test)]
mod notes_service_tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use notefold_core::models::{Note, NotePatch};
    use notefold_core::services::{NotesEvent, NotesService};
    use notefold_core::storage::{FolderNotesStore, NotesStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout, Duration};

    /// Store that counts saves and records the last persisted snapshot.
    #[derive(Default)]
    struct RecordingStore {
        saves: AtomicUsize,
        last: Mutex<Vec<Note>>,
        save_delay: Option<Duration>,
    }

    #[async_trait]
    impl NotesStore for RecordingStore {
        async fn load_notes(&self) -> Vec<Note> {
            self.last.lock().unwrap().clone()
        }

        async fn save_notes(&self, notes: &[Note]) {
            if let Some(delay) = self.save_delay {
                sleep(delay).await;
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = notes.to_vec();
        }
    }

    /// Store whose initial load takes a while, for racing mutations
    /// against hydration.
    struct SlowLoadStore {
        notes: Vec<Note>,
    }

    #[async_trait]
    impl NotesStore for SlowLoadStore {
        async fn load_notes(&self) -> Vec<Note> {
            sleep(Duration::from_millis(50)).await;
            self.notes.clone()
        }

        async fn save_notes(&self, _notes: &[Note]) {
            panic!("nothing should persist during these tests");
        }
    }

    #[tokio::test]
    async fn session_survives_a_restart() -> Result<()> {
        let dir = TempDir::new()?;

        // First session: create and edit.
        let store = Arc::new(FolderNotesStore::new(dir.path()));
        let service = NotesService::new(store);
        service.hydrate().await;

        let first = service.add_note();
        let second = service.add_note();
        // Millisecond timestamps tie when edits land in the same instant;
        // space the update out so "touched last" is unambiguous.
        sleep(Duration::from_millis(2)).await;
        service.update_note(
            &first.id,
            NotePatch {
                title: Some("Remember this".to_string()),
                content: Some("# Kept\n\nacross restarts\n".to_string()),
                tags: Some(vec!["keep".to_string()]),
            },
        );
        service.flush().await;
        drop(service);

        // Second session over the same folder.
        let store = Arc::new(FolderNotesStore::new(dir.path()));
        let service = NotesService::new(store);
        service.hydrate().await;

        let notes = service.notes();
        assert_eq!(notes.len(), 2);
        // The updated note was touched last, so it loads first.
        assert_eq!(notes[0].id, first.id);
        assert_eq!(notes[0].title, "Remember this");
        assert_eq!(notes[0].content, "# Kept\n\nacross restarts\n");
        assert_eq!(notes[0].tags, vec!["keep"]);
        assert_eq!(notes[1].id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn add_then_delete_persists_an_empty_collection() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Arc::new(FolderNotesStore::new(dir.path()));
        let service = NotesService::new(store.clone());
        service.hydrate().await;

        let note = service.add_note();
        assert!(service.delete_note(&note.id));
        service.flush().await;

        assert!(service.notes().is_empty());
        assert!(store.load_notes().await.is_empty());
        let leftover_files = std::fs::read_dir(dir.path())?
            .filter_map(|e| e.ok()?.file_name().into_string().ok())
            .filter(|name| name.starts_with("note-") && name.ends_with(".md"))
            .count();
        assert_eq!(leftover_files, 0);
        Ok(())
    }

    #[tokio::test]
    async fn rapid_mutations_coalesce_into_fewer_saves() -> Result<()> {
        let store = Arc::new(RecordingStore {
            save_delay: Some(Duration::from_millis(10)),
            ..Default::default()
        });
        let service = NotesService::new(store.clone());
        service.hydrate().await;

        for _ in 0..5 {
            service.add_note();
        }
        service.flush().await;

        let saves = store.saves.load(Ordering::SeqCst);
        assert!(saves < 5, "expected coalescing, saw {} saves", saves);
        assert_eq!(store.last.lock().unwrap().len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn saves_happen_in_order_and_last_state_wins() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let service = NotesService::new(store.clone());
        service.hydrate().await;

        let a = service.add_note();
        service.flush().await;
        service.delete_note(&a.id);
        service.flush().await;

        assert!(store.last.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn hydration_replaces_pre_load_mutations_without_persisting() -> Result<()> {
        let loaded_note = Note {
            id: "from-disk".to_string(),
            title: "Loaded".to_string(),
            content: String::new(),
            tags: Vec::new(),
            created_at: 1,
            updated_at: 1,
        };
        let store = Arc::new(SlowLoadStore {
            notes: vec![loaded_note],
        });
        let service = Arc::new(NotesService::new(store));

        let hydration = {
            let service = service.clone();
            tokio::spawn(async move { service.hydrate().await })
        };

        // Mutate while the initial load is still in flight. The store's
        // save_notes panics, so this also proves nothing persisted.
        sleep(Duration::from_millis(5)).await;
        service.add_note();
        assert!(!service.is_hydrated());

        hydration.await?;
        assert!(service.is_hydrated());

        let notes = service.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "from-disk");
        Ok(())
    }

    #[tokio::test]
    async fn reload_picks_up_out_of_band_folder_changes() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Arc::new(FolderNotesStore::new(dir.path()));
        let service = NotesService::new(store);
        service.hydrate().await;
        assert!(service.notes().is_empty());

        std::fs::write(
            dir.path().join("note-external.md"),
            "---\ntitle: Dropped in\ntags: \ncreatedAt: 1000\nupdatedAt: 2000\n---\n\nhello\n",
        )?;

        service.reload().await;
        let notes = service.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "external");
        assert_eq!(notes[0].title, "Dropped in");
        Ok(())
    }

    #[tokio::test]
    async fn observers_see_the_whole_session() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let service = NotesService::new(store);
        let mut rx = service.subscribe();

        service.hydrate().await;
        let note = service.add_note();
        service.delete_note(&note.id);

        let mut seen = Vec::new();
        for _ in 0..3 {
            let event = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("event within 1 second")
                .expect("channel open");
            seen.push(event.event_type());
        }
        assert_eq!(seen, vec!["hydrated", "added", "removed"]);

        let forwarded = serde_json::to_value(NotesEvent::Removed { id: note.id })?;
        assert_eq!(forwarded["type"], "removed");
        Ok(())
    }
}
