//! Note Data Structures
//!
//! This module defines the core `Note` struct and the pure helpers that
//! operate on note collections. Everything here is side-effect free: no I/O,
//! no global state, no panics on arbitrary input. Persistence lives in
//! [`crate::storage`]; lifecycle and ordering rules live in
//! [`crate::services`].
//!
//! # Examples
//!
//! ```rust
//! use notefold_core::models::{sort_notes, Note};
//!
//! let mut notes = vec![Note::new(), Note::new()];
//! sort_notes(&mut notes);
//! assert_eq!(notes.len(), 2);
//! assert_eq!(notes[0].display_title(), "Untitled note");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seed content for a freshly created note.
pub const DEFAULT_NOTE_CONTENT: &str = "# New note\n\nStart writing...";

/// Display fallback when a note's title is blank.
pub const UNTITLED_FALLBACK: &str = "Untitled note";

/// Display fallback when a note's content is blank.
pub const EMPTY_EXCERPT_FALLBACK: &str = "No content yet.";

/// A single markdown note.
///
/// # Fields
///
/// - `id`: Opaque unique identifier. Minted as a UUID v4 by [`Note::new`],
///   but any non-empty string loaded from storage is accepted as-is.
/// - `title`: Display title; may be blank (see [`Note::display_title`])
/// - `content`: Markdown body, stored verbatim
/// - `tags`: Free-form labels, normalized at input time by
///   [`normalize_tags_input`]
/// - `created_at` / `updated_at`: Milliseconds since the Unix epoch
///
/// # Serialized form
///
/// External JSON uses camelCase (`createdAt`, `updatedAt`). Every field
/// except `id` has a serde default, so partially populated stored objects
/// still deserialize; objects missing an `id` fail and are discarded by the
/// storage layer.
///
/// # Examples
///
/// ```rust
/// use notefold_core::models::Note;
///
/// let note = Note::new();
/// assert!(!note.id.is_empty());
/// assert_eq!(note.created_at, note.updated_at);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier (UUID v4 for notes created in-app)
    pub id: String,

    /// Display title; blank titles fall back to a placeholder in the UI
    #[serde(default)]
    pub title: String,

    /// Markdown body
    #[serde(default)]
    pub content: String,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation timestamp (ms since epoch)
    #[serde(default)]
    pub created_at: i64,

    /// Last modification timestamp (ms since epoch)
    #[serde(default)]
    pub updated_at: i64,
}

impl Note {
    /// Create a new note with a fresh UUID and seed content.
    ///
    /// Both timestamps are set to the current time, so a new note sorts to
    /// the top of the collection.
    pub fn new() -> Self {
        let now = now_millis();
        Note {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            content: DEFAULT_NOTE_CONTENT.to_string(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Trimmed title, or `"Untitled note"` when blank.
    pub fn display_title(&self) -> &str {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            UNTITLED_FALLBACK
        } else {
            trimmed
        }
    }

    /// Single-line preview of the content.
    ///
    /// Whitespace runs collapse to single spaces and the result is trimmed.
    /// Blank content yields `"No content yet."`. Content longer than
    /// `max_len` characters is cut at `max_len` and suffixed with `"..."`,
    /// so the result can be up to `max_len + 3` characters long.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use notefold_core::models::Note;
    ///
    /// let mut note = Note::new();
    /// note.content = "  line one\n\n\tline two  ".to_string();
    /// assert_eq!(note.excerpt(50), "line one line two");
    /// ```
    pub fn excerpt(&self, max_len: usize) -> String {
        let flattened = self
            .content
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if flattened.is_empty() {
            return EMPTY_EXCERPT_FALLBACK.to_string();
        }
        if flattened.chars().count() <= max_len {
            return flattened;
        }
        let mut cut: String = flattened.chars().take(max_len).collect();
        cut.push_str("...");
        cut
    }
}

impl Default for Note {
    fn default() -> Self {
        Note::new()
    }
}

/// Partial update for a note. `None` fields are left unchanged.
///
/// Mirrors the mutation surface of the notes service: callers only name the
/// fields they want to change, and `updated_at` is bumped by the service,
/// never by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    /// Replace the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Replace the markdown body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Replace the tag list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    /// Apply the patch to a note, bumping `updated_at` to now.
    pub(crate) fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(tags) = &self.tags {
            note.tags = tags.clone();
        }
        note.updated_at = now_millis();
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Sort notes by `updated_at`, newest first.
///
/// The sort is stable (ties keep their relative order) and therefore
/// idempotent: sorting an already-sorted collection changes nothing.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Filter by tag membership and free-text query.
///
/// A note passes when it carries `tag` exactly (`None` disables the tag
/// filter) and, if the query is non-blank after trimming, its title,
/// content, or tags contain the query case-insensitively. Input order is
/// preserved.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str, tag: Option<&str>) -> Vec<&'a Note> {
    let needle = query.trim().to_lowercase();
    notes
        .iter()
        .filter(|note| {
            if let Some(tag) = tag {
                if !note.tags.iter().any(|t| t == tag) {
                    return false;
                }
            }
            if needle.is_empty() {
                return true;
            }
            let haystack = format!(
                "{} {} {}",
                note.title,
                note.content,
                note.tags.join(" ")
            )
            .to_lowercase();
            haystack.contains(&needle)
        })
        .collect()
}

/// Distinct tags across all notes, lexicographically sorted.
pub fn collect_tags(notes: &[Note]) -> Vec<String> {
    let mut tags: Vec<String> = notes
        .iter()
        .flat_map(|note| note.tags.iter().cloned())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Parse a comma-separated tag string into a normalized tag list.
///
/// Splits on commas, trims each piece, drops empties, and keeps the first
/// occurrence of each duplicate.
///
/// # Examples
///
/// ```rust
/// use notefold_core::models::normalize_tags_input;
///
/// assert_eq!(normalize_tags_input("  a, b , ,a "), vec!["a", "b"]);
/// ```
pub fn normalize_tags_input(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for piece in raw.split(',') {
        let tag = piece.trim();
        if tag.is_empty() || tags.iter().any(|t| t == tag) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}

/// Inverse display form of [`normalize_tags_input`]: tags joined by `", "`.
pub fn tags_to_string(tags: &[String]) -> String {
    tags.join(", ")
}

/// Human-readable date for a note timestamp, e.g. `"Aug 25, 2026"`.
///
/// Out-of-range timestamps render as `"Invalid date"` rather than panicking.
pub fn format_timestamp(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => "Invalid date".to_string(),
    }
}
