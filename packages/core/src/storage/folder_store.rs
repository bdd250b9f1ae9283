//! Folder Notes Store
//!
//! Persists each note as its own markdown document in a user-chosen folder,
//! named `note-<sanitized-id>.md`. The folder stays human-editable: files
//! can be created, edited, or deleted out-of-band and the next load picks
//! the changes up. Anything that does not match the `note-*.md` shape is
//! ignored and never deleted.
//!
//! Saving replaces persisted state wholesale: every note in the collection
//! is written, then files for notes that no longer exist are removed. The
//! delete pass starts only after all writes have finished, so a crash
//! mid-save can leave extra files behind but never a missing one.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::fs;
use tracing::{debug, warn};

use crate::models::{now_millis, sort_notes, Note};
use crate::storage::front_matter::{parse_document, serialize_note};
use crate::storage::{NotesStore, StoreError};

const NOTE_FILE_PREFIX: &str = "note-";
const NOTE_FILE_SUFFIX: &str = ".md";

/// Strip everything but `[A-Za-z0-9_-]` from a note id.
///
/// Keeps filenames portable across filesystems. Two distinct ids can
/// sanitize to the same name; the store warns and the later write wins.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

fn note_file_name(id: &str) -> String {
    format!("{}{}{}", NOTE_FILE_PREFIX, sanitize_id(id), NOTE_FILE_SUFFIX)
}

/// Extract the note id from a `note-*.md` file name, `None` for anything
/// else.
fn note_id_from_file_name(name: &str) -> Option<&str> {
    name.strip_prefix(NOTE_FILE_PREFIX)?
        .strip_suffix(NOTE_FILE_SUFFIX)
}

/// Strictly parse a front-matter timestamp: integer, positive, no trailing
/// junk. Anything else falls back to file times.
fn parse_timestamp(value: Option<&String>) -> Option<i64> {
    value?.trim().parse::<i64>().ok().filter(|ms| *ms > 0)
}

fn system_time_millis(time: std::io::Result<SystemTime>) -> Option<i64> {
    let duration = time.ok()?.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(duration.as_millis()).ok()
}

/// Notes store over a folder of `note-*.md` documents.
pub struct FolderNotesStore {
    folder: PathBuf,
}

impl FolderNotesStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// The folder this store reads and writes.
    pub fn folder(&self) -> &std::path::Path {
        &self.folder
    }

    async fn try_load(&self) -> Result<Vec<Note>, StoreError> {
        let mut dir = match fs::read_dir(&self.folder).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut notes = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                debug!(path = %entry.path().display(), "skipping non-utf8 file name");
                continue;
            };
            let Some(id) = note_id_from_file_name(name) else {
                continue;
            };
            match self.read_note(entry.path(), id).await {
                Ok(note) => notes.push(note),
                Err(err) => {
                    warn!(file = %name, error = %err, "skipping unreadable note file");
                }
            }
        }

        sort_notes(&mut notes);
        Ok(notes)
    }

    async fn read_note(&self, path: PathBuf, id: &str) -> Result<Note, StoreError> {
        let raw = fs::read_to_string(&path).await?;
        let doc = parse_document(&raw);

        let metadata = fs::metadata(&path).await.ok();
        let now = now_millis();
        let created_fallback = metadata
            .as_ref()
            .and_then(|m| system_time_millis(m.created()))
            .unwrap_or(now);
        let modified_fallback = metadata
            .as_ref()
            .and_then(|m| system_time_millis(m.modified()))
            .unwrap_or(now);

        let created_at = parse_timestamp(doc.meta.get("createdAt")).unwrap_or(created_fallback);
        // When the header does not carry a usable updatedAt, the file mtime
        // stands in; clamp it so a fresh copy never sorts before it was
        // created.
        let updated_at = match parse_timestamp(doc.meta.get("updatedAt")) {
            Some(ms) => ms,
            None => modified_fallback.max(created_at),
        };

        let title = doc.meta.get("title").cloned().unwrap_or_default();
        let tags = doc
            .meta
            .get("tags")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Note {
            id: id.to_string(),
            title,
            content: doc.content,
            tags,
            created_at,
            updated_at,
        })
    }

    async fn try_save(&self, notes: &[Note]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.folder).await?;
        let existing = self.existing_note_files().await?;

        let mut written: HashSet<String> = HashSet::with_capacity(notes.len());
        let mut writes = Vec::with_capacity(notes.len());
        for note in notes {
            let file_name = note_file_name(&note.id);
            if !written.insert(file_name.clone()) {
                warn!(
                    id = %note.id,
                    file = %file_name,
                    "note id collides with an earlier note after sanitization, last write wins"
                );
            }
            writes.push(self.write_note(file_name, note));
        }
        join_all(writes).await;

        // Reconcile strictly after every write has finished: anything that
        // matches the note shape but was not just written is stale.
        for file_name in existing {
            if written.contains(&file_name) {
                continue;
            }
            let path = self.folder.join(&file_name);
            if let Err(err) = fs::remove_file(&path).await {
                warn!(file = %file_name, error = %err, "failed to delete stale note file");
            }
        }

        Ok(())
    }

    async fn write_note(&self, file_name: String, note: &Note) {
        let path = self.folder.join(&file_name);
        if let Err(err) = fs::write(&path, serialize_note(note)).await {
            warn!(file = %file_name, error = %err, "failed to write note file");
        }
    }

    async fn existing_note_files(&self) -> Result<HashSet<String>, StoreError> {
        let mut files = HashSet::new();
        let mut dir = match fs::read_dir(&self.folder).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if note_id_from_file_name(name).is_some() {
                    files.insert(name.to_string());
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl NotesStore for FolderNotesStore {
    async fn load_notes(&self) -> Vec<Note> {
        match self.try_load().await {
            Ok(notes) => notes,
            Err(err) => {
                warn!(
                    folder = %self.folder.display(),
                    error = %err,
                    "failed to load notes folder, starting empty"
                );
                Vec::new()
            }
        }
    }

    async fn save_notes(&self, notes: &[Note]) {
        if let Err(err) = self.try_save(notes).await {
            warn!(
                folder = %self.folder.display(),
                error = %err,
                "failed to persist notes folder"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_ascii_word_chars_and_dashes() {
        assert_eq!(sanitize_id("abc-123_DEF"), "abc-123_DEF");
        assert_eq!(sanitize_id("a b/c:d"), "abcd");
        assert_eq!(sanitize_id("ü niçode"), "niode");
        assert_eq!(sanitize_id("../../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn file_names_round_trip_through_ids() {
        assert_eq!(note_file_name("abc-123"), "note-abc-123.md");
        assert_eq!(note_id_from_file_name("note-abc-123.md"), Some("abc-123"));
    }

    #[test]
    fn foreign_file_names_are_rejected() {
        assert_eq!(note_id_from_file_name("draft-abc.md"), None);
        assert_eq!(note_id_from_file_name("note-abc.txt"), None);
        assert_eq!(note_id_from_file_name("README.md"), None);
        assert_eq!(note_id_from_file_name("note-abc.md.tmp"), None);
    }

    #[test]
    fn timestamps_parse_strictly() {
        let some = |s: &str| Some(s.to_string());
        assert_eq!(parse_timestamp(some("1700000000000").as_ref()), Some(1_700_000_000_000));
        assert_eq!(parse_timestamp(some(" 42 ").as_ref()), Some(42));
        assert_eq!(parse_timestamp(some("12abc").as_ref()), None);
        assert_eq!(parse_timestamp(some("-5").as_ref()), None);
        assert_eq!(parse_timestamp(some("0").as_ref()), None);
        assert_eq!(parse_timestamp(some("").as_ref()), None);
        assert_eq!(parse_timestamp(None), None);
    }
}
