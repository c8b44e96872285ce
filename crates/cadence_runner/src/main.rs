// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cadence headless runner.
//!
//! Drives a sequencer preset at a fixed frame rate without a host and logs
//! the values its modifiers apply:
//! - Run settings come from a RON file (`cadence.ron` by default)
//! - Presets are JSON files saved by `Manager::save`
//! - Without a preset a built-in demo rig is driven
//!
//! Usage: `cadence [--init] [run-config.ron]`. With `--init` the default
//! run settings are written to the config path instead of running.

mod config;
mod demo;
mod error;
mod run;

use config::{RunConfig, RUN_CONFIG_FILE_NAME};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG overrides the default directives
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cadence_sequencer=info,cadence_runner=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cadence runner v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args_os().skip(1).peekable();
    let init = args.next_if(|arg| arg == "--init").is_some();
    let config_path = args
        .next()
        .map_or_else(|| PathBuf::from(RUN_CONFIG_FILE_NAME), PathBuf::from);

    if init {
        match RunConfig::default().save(&config_path) {
            Ok(()) => tracing::info!("Wrote default run config to {}", config_path.display()),
            Err(e) => {
                tracing::error!("Failed to write run config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let result = RunConfig::load_or_default(&config_path).and_then(|config| run::run(&config));
    match result {
        Ok(summary) => {
            tracing::info!(
                "Run complete: {} frames, {} paused, {} steps disabled",
                summary.frames,
                summary.paused_frames,
                summary.disabled_steps
            );
        }
        Err(e) => {
            tracing::error!("Run failed: {e}");
            std::process::exit(1);
        }
    }
}
