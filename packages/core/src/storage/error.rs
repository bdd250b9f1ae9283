//! Storage Error Types
//!
//! Internal error type for the storage layer. The public [`NotesStore`]
//! contract never surfaces these: implementations log them and fall back to
//! an empty result or a no-op. Typed variants exist so the fallible private
//! helpers compose with `?` and so log lines carry precise causes.
//!
//! [`NotesStore`]: crate::storage::NotesStore

use thiserror::Error;

/// Storage operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
