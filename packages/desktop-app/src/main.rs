//! Notefold shell binary
//!
//! Starts the stdio bridge and serves it until the host closes stdin.
//!
//! # Usage
//!
//! ```bash
//! # Default profile (platform config directory)
//! cargo run -p notefold-app
//!
//! # Isolated profile, verbose logging
//! NOTEFOLD_CONFIG_DIR=/tmp/profile RUST_LOG=debug cargo run -p notefold-app
//! ```

use notefold_app::bridge::{serve_stdio, Bridge};
use notefold_app::config::ShellConfig;
use notefold_app::settings::SettingsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging goes to stderr: stdout is the bridge protocol channel.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ShellConfig::from_env();
    tracing::info!(settings = %config.settings_path.display(), "starting notefold shell");

    let bridge = Bridge::new(SettingsStore::new(config.settings_path)).await;
    serve_stdio(&bridge).await?;

    tracing::info!("notefold shell stopped");
    Ok(())
}
