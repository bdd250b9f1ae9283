//! Notes Service
//!
//! The single owner of the in-memory notes collection. All reads and
//! mutations go through [`NotesService`]; storage is only ever touched by
//! the initial hydration, explicit reloads, and the background persister.
//!
//! # Lifecycle
//!
//! A service starts *hydrating*: the collection is empty and persistence is
//! disarmed. [`NotesService::hydrate`] loads from the store, sorts, installs
//! the result, and flips the service to *ready*. Mutations made before that
//! point still update memory and emit events, but schedule no saves, so a
//! slow initial load can never be overwritten by the empty boot state.
//!
//! # Persistence
//!
//! Mutations are synchronous: callers observe the new state immediately.
//! Each mutation hands a snapshot of the full collection to a background
//! persister task through a watch channel. The channel keeps only the
//! latest snapshot, so bursts of edits coalesce into fewer disk writes, the
//! last state always wins, and saves never interleave. [`NotesService::flush`]
//! awaits the persistence of everything scheduled so far.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::models::{sort_notes, Note, NotePatch};
use crate::services::NotesEvent;
use crate::storage::NotesStore;

/// Broadcast channel capacity for notes events.
///
/// 128 provides enough headroom for burst operations (imports, rapid edits)
/// while limiting memory overhead. Subscriber lag is acceptable - observers
/// re-read the collection from the service, they do not replay history.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Snapshot handed to the persister task. Generation numbers are strictly
/// increasing so `flush` can wait for a specific point in time.
#[derive(Clone)]
struct SaveRequest {
    generation: u64,
    notes: Arc<Vec<Note>>,
}

impl SaveRequest {
    fn initial() -> Self {
        SaveRequest {
            generation: 0,
            notes: Arc::new(Vec::new()),
        }
    }
}

struct ServiceState {
    notes: Vec<Note>,
    hydrated: bool,
    /// Generation of the most recently scheduled save.
    generation: u64,
}

/// Owns the notes collection and coordinates storage and observers.
pub struct NotesService {
    store: Arc<dyn NotesStore>,
    state: Mutex<ServiceState>,
    event_tx: broadcast::Sender<NotesEvent>,
    save_tx: watch::Sender<SaveRequest>,
    persisted_rx: watch::Receiver<u64>,
}

impl NotesService {
    /// Create a service over the given store and start its persister task.
    ///
    /// Must be called from within a tokio runtime; the persister runs until
    /// the service is dropped.
    pub fn new(store: Arc<dyn NotesStore>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (save_tx, save_rx) = watch::channel(SaveRequest::initial());
        let (persisted_tx, persisted_rx) = watch::channel(0u64);

        tokio::spawn(run_persister(store.clone(), save_rx, persisted_tx));

        NotesService {
            store,
            state: Mutex::new(ServiceState {
                notes: Vec::new(),
                hydrated: false,
                generation: 0,
            }),
            event_tx,
            save_tx,
            persisted_rx,
        }
    }

    /// Perform the initial load: read from storage, sort newest-first,
    /// install as the collection, and arm persistence.
    ///
    /// Never schedules a save, so hydrating cannot clobber disk state.
    pub async fn hydrate(&self) {
        let mut notes = self.store.load_notes().await;
        sort_notes(&mut notes);
        let count = notes.len();
        {
            let mut state = self.lock_state();
            state.notes = notes;
            state.hydrated = true;
        }
        debug!(count, "notes collection hydrated");
        self.emit_event(NotesEvent::Hydrated { count });
    }

    /// Re-read the collection from storage, replacing in-memory state.
    ///
    /// Used when the backing folder changed out-of-band. Like `hydrate`,
    /// this never schedules a save.
    pub async fn reload(&self) {
        self.hydrate().await;
    }

    /// Whether the initial load has completed.
    pub fn is_hydrated(&self) -> bool {
        self.lock_state().hydrated
    }

    /// Snapshot of the current collection, newest first.
    pub fn notes(&self) -> Vec<Note> {
        self.lock_state().notes.clone()
    }

    /// Create a fresh note at the top of the collection.
    ///
    /// The new note is returned so the caller can focus it immediately.
    pub fn add_note(&self) -> Note {
        let note = Note::new();
        {
            let mut state = self.lock_state();
            state.notes.insert(0, note.clone());
            sort_notes(&mut state.notes);
            self.schedule_save(&mut state);
        }
        self.emit_event(NotesEvent::Added(note.clone()));
        note
    }

    /// Apply a partial update to a note.
    ///
    /// Bumps `updated_at` and re-sorts, so the touched note moves to the
    /// top. Returns the updated note, or `None` (and schedules nothing)
    /// when the id is unknown.
    pub fn update_note(&self, id: &str, patch: NotePatch) -> Option<Note> {
        let updated = {
            let mut state = self.lock_state();
            let position = state.notes.iter().position(|n| n.id == id)?;
            patch.apply_to(&mut state.notes[position]);
            let updated = state.notes[position].clone();
            sort_notes(&mut state.notes);
            self.schedule_save(&mut state);
            updated
        };
        self.emit_event(NotesEvent::Updated(updated.clone()));
        Some(updated)
    }

    /// Remove a note by id. Returns `false` (and schedules nothing) when
    /// the id is unknown. The remaining order is untouched.
    pub fn delete_note(&self, id: &str) -> bool {
        {
            let mut state = self.lock_state();
            let before = state.notes.len();
            state.notes.retain(|n| n.id != id);
            if state.notes.len() == before {
                return false;
            }
            self.schedule_save(&mut state);
        }
        self.emit_event(NotesEvent::Removed { id: id.to_string() });
        true
    }

    /// Subscribe to collection events.
    ///
    /// Returns a broadcast receiver that sees every add, update, remove,
    /// and hydration from the moment of subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<NotesEvent> {
        self.event_tx.subscribe()
    }

    /// Wait until every save scheduled so far has been persisted.
    ///
    /// Call before shutdown so the final coalesced write reaches storage.
    pub async fn flush(&self) {
        let target = self.lock_state().generation;
        if target == 0 {
            return;
        }
        let mut persisted = self.persisted_rx.clone();
        if persisted.wait_for(|g| *g >= target).await.is_err() {
            warn!("persister task stopped before flush completed");
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Hand the current collection to the persister. No-op until hydration
    /// completes.
    fn schedule_save(&self, state: &mut ServiceState) {
        if !state.hydrated {
            debug!("skipping save before hydration");
            return;
        }
        state.generation += 1;
        let request = SaveRequest {
            generation: state.generation,
            notes: Arc::new(state.notes.clone()),
        };
        if self.save_tx.send(request).is_err() {
            warn!("persister task gone, dropping save request");
        }
    }

    /// Emit an event to all subscribers. Ignores errors when nobody is
    /// listening (expected in tests and headless runs).
    fn emit_event(&self, event: NotesEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Background task: persist the newest pending snapshot until the service
/// is dropped. The watch channel collapses intermediate snapshots, which is
/// exactly the coalescing the save discipline wants.
async fn run_persister(
    store: Arc<dyn NotesStore>,
    mut save_rx: watch::Receiver<SaveRequest>,
    persisted_tx: watch::Sender<u64>,
) {
    while save_rx.changed().await.is_ok() {
        let request = save_rx.borrow_and_update().clone();
        if request.generation == 0 {
            continue;
        }
        store.save_notes(&request.notes).await;
        debug!(generation = request.generation, "notes snapshot persisted");
        let _ = persisted_tx.send(request.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, LocalNotesStore, MemoryKv, NotesStore};

    fn memory_service() -> (Arc<MemoryKv>, NotesService) {
        let kv = Arc::new(MemoryKv::new());
        let store = Arc::new(LocalNotesStore::new(kv.clone()));
        (kv, NotesService::new(store))
    }

    #[tokio::test]
    async fn add_note_lands_on_top_and_is_returned() {
        let (_kv, service) = memory_service();
        service.hydrate().await;

        let first = service.add_note();
        let second = service.add_note();

        let notes = service.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, second.id);
        assert_eq!(notes[1].id, first.id);
    }

    #[tokio::test]
    async fn update_note_bumps_timestamp_and_resorts() {
        let (_kv, service) = memory_service();
        service.hydrate().await;

        let first = service.add_note();
        let _second = service.add_note();
        // Timestamps are millisecond-granular; space the edit out so the
        // bump is strict and the resulting order deterministic.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let updated = service
            .update_note(
                &first.id,
                NotePatch {
                    title: Some("bumped".to_string()),
                    ..Default::default()
                },
            )
            .expect("note exists");

        assert_eq!(updated.title, "bumped");
        assert!(updated.updated_at > first.updated_at);
        assert_eq!(service.notes()[0].id, first.id);
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected_without_side_effects() {
        let (_kv, service) = memory_service();
        service.hydrate().await;
        service.add_note();

        assert!(service.update_note("missing", NotePatch::default()).is_none());
        assert!(!service.delete_note("missing"));
        assert_eq!(service.notes().len(), 1);
    }

    #[tokio::test]
    async fn mutations_emit_events() {
        let (_kv, service) = memory_service();
        service.hydrate().await;
        let mut rx = service.subscribe();

        let note = service.add_note();
        service.update_note(&note.id, NotePatch::default());
        service.delete_note(&note.id);

        assert_eq!(rx.recv().await.unwrap().event_type(), "added");
        assert_eq!(rx.recv().await.unwrap().event_type(), "updated");
        match rx.recv().await.unwrap() {
            NotesEvent::Removed { id } => assert_eq!(id, note.id),
            other => panic!("expected removed event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn hydrate_emits_count_and_marks_ready() {
        let (kv, service) = memory_service();
        kv.set(
            crate::storage::DEFAULT_NOTES_KEY,
            r#"[{"id":"a","updatedAt":1},{"id":"b","updatedAt":2}]"#,
        )
        .await
        .unwrap();

        assert!(!service.is_hydrated());
        let mut rx = service.subscribe();
        service.hydrate().await;

        assert!(service.is_hydrated());
        match rx.recv().await.unwrap() {
            NotesEvent::Hydrated { count } => assert_eq!(count, 2),
            other => panic!("expected hydrated event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn mutations_before_hydration_do_not_persist() {
        let (kv, service) = memory_service();
        service.add_note();
        service.flush().await;

        assert_eq!(kv.get(crate::storage::DEFAULT_NOTES_KEY).await.unwrap(), None);

        // Hydration then replaces the unpersisted pre-load state.
        service.hydrate().await;
        assert!(service.notes().is_empty());
    }

    #[tokio::test]
    async fn flush_persists_the_latest_state() {
        let (kv, service) = memory_service();
        service.hydrate().await;

        let a = service.add_note();
        let _b = service.add_note();
        service.delete_note(&a.id);
        service.flush().await;

        let store = LocalNotesStore::new(kv);
        let persisted = store.load_notes().await;
        assert_eq!(persisted.len(), 1);
    }
}
