//! Persistent shell settings
//!
//! One small JSON file remembers the user's chosen notes folder across
//! sessions: `{ "notesFolder": <absolute path or null> }`. Reads swallow
//! every failure into defaults so a damaged file can never block startup;
//! writes are atomic so a crash mid-save leaves the previous file intact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

/// File name of the settings document inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// User settings persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSettings {
    /// Folder holding the `note-*.md` documents; `None` until chosen
    #[serde(default)]
    pub notes_folder: Option<PathBuf>,
}

/// Loads and saves [`ShellSettings`] at a fixed path.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings. A missing, unreadable, or malformed file yields
    /// defaults.
    pub async fn load(&self) -> ShellSettings {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "settings file malformed, using defaults"
                    );
                    ShellSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file yet, using defaults");
                ShellSettings::default()
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to read settings, using defaults"
                );
                ShellSettings::default()
            }
        }
    }

    /// Persist settings. Creates the parent directory as needed.
    pub async fn save(&self, settings: &ShellSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create settings directory {}", parent.display())
                })?;
            }
        }

        let serialized =
            serde_json::to_string_pretty(settings).context("failed to serialize settings")?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serialized)
            .await
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("failed to save {}", self.path.display()))?;
        Ok(())
    }
}
