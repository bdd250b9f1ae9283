//! Storage Layer
//!
//! This module handles all note persistence:
//!
//! - `NotesStore` - the repository contract the service layer talks to
//! - `LocalNotesStore` - whole collection as a JSON array under a namespaced
//!   key in a [`KeyValueStore`] (in-memory or single JSON file)
//! - `FolderNotesStore` - one front-matter markdown document per note in a
//!   user-chosen folder
//! - `StoreError` - internal error type; it never crosses the `NotesStore`
//!   boundary
//!
//! # Contract
//!
//! Loading and saving never fail from the caller's point of view. A missing
//! or corrupt source loads as an empty collection, an unwritable target
//! makes the save a no-op, and per-item damage (a malformed JSON entry, one
//! unreadable file) drops only that item. Every swallowed failure is logged
//! at `warn` level with its cause.

mod error;
mod folder_store;
mod front_matter;
mod kv;
mod local_store;

pub use error::StoreError;
pub use folder_store::FolderNotesStore;
pub use kv::{load_theme, save_theme, JsonFileKv, KeyValueStore, MemoryKv, THEME_KEY};
pub use local_store::{LocalNotesStore, DEFAULT_NOTES_KEY};

use async_trait::async_trait;

use crate::models::Note;

/// Repository contract for a complete notes collection.
///
/// `save_notes` always receives the full collection and replaces whatever
/// was persisted before; there is no per-note mutation at this layer. Both
/// operations are infallible by contract (see the module docs), which keeps
/// every caller free of storage error handling.
#[async_trait]
pub trait NotesStore: Send + Sync {
    /// Load the full collection, newest first. Failures yield an empty
    /// collection.
    async fn load_notes(&self) -> Vec<Note>;

    /// Persist the full collection, replacing previous state. Failures are
    /// swallowed.
    async fn save_notes(&self, notes: &[Note]);
}
