//! Notes Bridge
//!
//! The process boundary between the UI and the notes folder. Exactly four
//! operations cross it, named after the original IPC channels:
//!
//! - `notes:get-folder` - currently configured folder, or null
//! - `notes:select-folder` - adopt a picked folder (null means the picker
//!   was cancelled) and persist the choice
//! - `notes:load` - full collection from the folder, empty when unset
//! - `notes:save` - replace the folder's contents with the given collection
//!
//! Requests and responses travel as newline-delimited JSON over
//! stdin/stdout, one object per line:
//!
//! ```text
//! -> {"id":1,"op":"notes:load"}
//! <- {"id":1,"result":{"notes":[...]}}
//! -> {"id":2,"op":"nope"}
//! <- {"id":2,"error":"malformed request: unknown variant `nope` ..."}
//! ```
//!
//! Load and save never fail (the storage layer swallows and logs); the only
//! error responses are malformed requests, and those never stop the loop.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use notefold_core::models::Note;
use notefold_core::storage::{FolderNotesStore, NotesStore};

use crate::settings::{SettingsStore, ShellSettings};

/// Bridge transport and protocol errors.
///
/// Malformed requests are reported back to the client inside the response
/// envelope; only transport failures (stdin/stdout gone) end the loop.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Request line was not a valid operation
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Transport read or write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One request line: an `id` echoed back in the response, plus the
/// operation selected by the `op` field.
#[derive(Debug, Deserialize)]
struct RequestEnvelope {
    #[serde(default)]
    id: u64,
    #[serde(flatten)]
    request: BridgeRequest,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op")]
enum BridgeRequest {
    #[serde(rename = "notes:get-folder")]
    GetFolder,
    #[serde(rename = "notes:select-folder")]
    SelectFolder {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    #[serde(rename = "notes:load")]
    LoadNotes,
    #[serde(rename = "notes:save")]
    SaveNotes { notes: Vec<Note> },
}

/// Shared bridge state: the persisted settings plus the folder active for
/// this session.
pub struct Bridge {
    settings: SettingsStore,
    folder: Mutex<Option<PathBuf>>,
}

impl Bridge {
    /// Create a bridge, seeding the active folder from persisted settings.
    pub async fn new(settings: SettingsStore) -> Self {
        let initial = settings.load().await.notes_folder;
        match &initial {
            Some(folder) => info!(folder = %folder.display(), "notes folder restored from settings"),
            None => info!("no notes folder configured yet"),
        }
        Bridge {
            settings,
            folder: Mutex::new(initial),
        }
    }

    /// Folder currently in effect for this session.
    pub fn notes_folder(&self) -> Option<PathBuf> {
        self.folder
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Handle one raw request line, producing the response object.
    ///
    /// Public so hosts and tests can drive the bridge without stdio.
    pub async fn handle_line(&self, line: &str) -> Value {
        match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(envelope) => self.handle_request(envelope.id, envelope.request).await,
            Err(err) => {
                // Salvage the id if the line was at least valid JSON, so the
                // client can correlate the failure.
                let id = serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|v| v.get("id")?.as_u64())
                    .unwrap_or(0);
                warn!(error = %err, "rejecting malformed bridge request");
                error_response(id, &BridgeError::Malformed(err))
            }
        }
    }

    async fn handle_request(&self, id: u64, request: BridgeRequest) -> Value {
        match request {
            BridgeRequest::GetFolder => ok_response(id, json!({ "folder": self.notes_folder() })),
            BridgeRequest::SelectFolder { path } => self.select_folder(id, path).await,
            BridgeRequest::LoadNotes => {
                let notes = match self.notes_folder() {
                    Some(folder) => FolderNotesStore::new(folder).load_notes().await,
                    None => Vec::new(),
                };
                debug!(count = notes.len(), "bridge served notes:load");
                ok_response(id, json!({ "notes": notes }))
            }
            BridgeRequest::SaveNotes { notes } => match self.notes_folder() {
                Some(folder) => {
                    FolderNotesStore::new(folder).save_notes(&notes).await;
                    debug!(count = notes.len(), "bridge served notes:save");
                    ok_response(id, json!({ "saved": true }))
                }
                None => {
                    warn!("notes:save with no folder configured, dropping");
                    ok_response(id, json!({ "saved": false }))
                }
            },
        }
    }

    async fn select_folder(&self, id: u64, path: Option<PathBuf>) -> Value {
        // A null path means the picker was cancelled: keep the current
        // folder and report null, matching the original dialog flow.
        let Some(path) = path else {
            return ok_response(id, json!({ "folder": Value::Null }));
        };

        {
            let mut folder = self.folder.lock().unwrap_or_else(|e| e.into_inner());
            *folder = Some(path.clone());
        }
        info!(folder = %path.display(), "notes folder selected");

        let settings = ShellSettings {
            notes_folder: Some(path.clone()),
        };
        // The folder stays active for the session even if persisting fails.
        if let Err(err) = self.settings.save(&settings).await {
            warn!(error = %err, "failed to persist notes folder choice");
        }

        ok_response(id, json!({ "folder": path }))
    }
}

fn ok_response(id: u64, result: Value) -> Value {
    json!({ "id": id, "result": result })
}

fn error_response(id: u64, error: &BridgeError) -> Value {
    json!({ "id": id, "error": error.to_string() })
}

/// Serve the bridge over stdin/stdout until stdin closes.
///
/// Blank lines are skipped; every other line gets exactly one response
/// line. Logging goes to stderr, keeping stdout a clean protocol channel.
pub async fn serve_stdio(bridge: &Bridge) -> Result<(), BridgeError> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let response = bridge.handle_line(trimmed).await;
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    debug!("stdin closed, bridge shutting down");
    Ok(())
}
