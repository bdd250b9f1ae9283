//! Runtime shell configuration
//!
//! ShellConfig is what the running process uses. It is resolved once at
//! startup from the environment and never serialized; the persistent user
//! settings live in settings.rs.

use std::path::PathBuf;

use tracing::info;

/// Environment variable overriding the settings directory. Useful for
/// tests and for running several isolated profiles side by side.
pub const CONFIG_DIR_ENV: &str = "NOTEFOLD_CONFIG_DIR";

const APP_DIR_NAME: &str = "notefold";

/// Runtime configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Resolved location of settings.json
    pub settings_path: PathBuf,
}

impl ShellConfig {
    /// Resolve configuration from the environment.
    ///
    /// Precedence: `NOTEFOLD_CONFIG_DIR`, then the platform config
    /// directory, then a dot-directory relative to the working directory
    /// for environments without a resolvable home.
    pub fn from_env() -> Self {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                info!(dir = %dir.display(), "settings directory overridden via {}", CONFIG_DIR_ENV);
                dir
            }
            None => default_config_dir(),
        };
        ShellConfig {
            settings_path: dir.join(crate::settings::SETTINGS_FILE),
        }
    }
}

fn default_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(base) => base.join(APP_DIR_NAME),
        None => PathBuf::from(format!(".{}", APP_DIR_NAME)),
    }
}
