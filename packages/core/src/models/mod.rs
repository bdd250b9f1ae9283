//! Data Models
//!
//! This module contains the core data structures used throughout Notefold:
//!
//! - `Note` - A single markdown note with title, tags, and timestamps
//! - `NotePatch` - Partial update applied through the notes service
//! - `Theme` - Persisted light/dark preference
//!
//! The free functions here (`sort_notes`, `filter_notes`, `collect_tags`,
//! `normalize_tags_input`) are pure collection helpers shared by the service
//! layer and the UI surface.

mod note;
mod theme;

pub use note::{
    collect_tags, filter_notes, format_timestamp, normalize_tags_input, now_millis, sort_notes,
    tags_to_string, Note, NotePatch, DEFAULT_NOTE_CONTENT, EMPTY_EXCERPT_FALLBACK,
    UNTITLED_FALLBACK,
};
pub use theme::Theme;
