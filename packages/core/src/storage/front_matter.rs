//! Note Document Grammar
//!
//! Serializes a note to a markdown document with a minimal front-matter
//! header, and parses such documents back tolerantly. The grammar is fixed:
//!
//! ```text
//! ---
//! title: <single line>
//! tags: <comma separated>
//! createdAt: <ms since epoch>
//! updatedAt: <ms since epoch>
//! ---
//!
//! <content verbatim>
//! ```
//!
//! Parsing accepts documents this module never wrote: CRLF line endings are
//! normalized, a missing or unterminated header means the whole document is
//! content, metadata lines without a colon are skipped, and unknown keys are
//! preserved in the metadata map for the caller to ignore.

use std::collections::HashMap;

use crate::models::Note;

/// Parsed form of a note document: raw metadata plus the verbatim body.
#[derive(Debug, Default)]
pub(crate) struct RawDocument {
    pub meta: HashMap<String, String>,
    pub content: String,
}

/// Render a note as a front-matter document.
///
/// Newlines inside the title collapse to spaces so the header stays
/// line-oriented; everything else round-trips exactly through
/// [`parse_document`].
pub(crate) fn serialize_note(note: &Note) -> String {
    let title = note.title.replace("\r\n", " ").replace('\n', " ");
    [
        "---".to_string(),
        format!("title: {}", title.trim()),
        format!("tags: {}", note.tags.join(", ")),
        format!("createdAt: {}", note.created_at),
        format!("updatedAt: {}", note.updated_at),
        "---".to_string(),
        String::new(),
        note.content.clone(),
    ]
    .join("\n")
}

/// Split a document into metadata and content.
///
/// Never fails: malformed headers degrade to an empty metadata map with the
/// full document as content.
pub(crate) fn parse_document(raw: &str) -> RawDocument {
    let normalized = raw.replace("\r\n", "\n");

    let Some(rest) = normalized.strip_prefix("---\n") else {
        return RawDocument {
            meta: HashMap::new(),
            content: normalized,
        };
    };
    let Some(end) = rest.find("\n---") else {
        return RawDocument {
            meta: HashMap::new(),
            content: normalized,
        };
    };

    let mut meta = HashMap::new();
    for line in rest[..end].split('\n') {
        let Some(idx) = line.find(':') else {
            continue;
        };
        let key = line[..idx].trim();
        let value = line[idx + 1..].trim();
        if !key.is_empty() {
            meta.insert(key.to_string(), value.to_string());
        }
    }

    // The serializer emits the closing delimiter's newline plus one blank
    // separator line, so strip at most two leading newlines. Anything beyond
    // that belongs to the content itself.
    let mut content = &rest[end + 4..];
    for _ in 0..2 {
        match content.strip_prefix('\n') {
            Some(stripped) => content = stripped,
            None => break,
        }
    }

    RawDocument {
        meta,
        content: content.to_string(),
    }
}
