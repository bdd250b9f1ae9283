//! Notes Domain Events
//!
//! Events emitted by [`NotesService`] whenever the collection changes. They
//! follow the observer pattern over tokio's broadcast channel, so a host
//! shell or UI layer can react to changes without coupling to the service
//! internals. Subscribers that lag simply miss events; the collection itself
//! is always re-readable from the service.
//!
//! [`NotesService`]: crate::services::NotesService

use serde::{Deserialize, Serialize};

use crate::models::Note;

/// Domain events for the notes collection.
///
/// Serialized with an internally-tagged `type` field so host processes can
/// forward them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotesEvent {
    /// A new note entered the collection
    Added(Note),

    /// An existing note's fields changed
    Updated(Note),

    /// A note left the collection
    Removed { id: String },

    /// The collection was (re)loaded from storage
    Hydrated { count: usize },
}

impl NotesEvent {
    /// Event type name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            NotesEvent::Added(_) => "added",
            NotesEvent::Updated(_) => "updated",
            NotesEvent::Removed { .. } => "removed",
            NotesEvent::Hydrated { .. } => "hydrated",
        }
    }
}
