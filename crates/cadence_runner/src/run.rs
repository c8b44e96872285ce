// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-rate frame loop.

use crate::config::RunConfig;
use crate::demo::demo_manager;
use crate::error::{Result, RunnerError};
use cadence_sequencer::{default_modifier_factory, Manager};
use cadence_timing::{RandomSource, StdRandom};
use std::path::Path;

/// What happened during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames driven
    pub frames: u32,
    /// Frames applied with `paused = true`
    pub paused_frames: u32,
    /// Steps disabled by a modifier fault
    pub disabled_steps: usize,
}

/// Read a JSON preset into a manager
pub fn load_preset(path: &Path, rng: &mut dyn RandomSource) -> Result<Manager> {
    let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(Manager::load(&value, &default_modifier_factory(), rng))
}

/// Write a manager as a JSON preset
pub fn save_preset(manager: &Manager, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&manager.save())?;
    std::fs::write(path, content).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Drive a manager for the configured number of frames
pub fn drive(manager: &mut Manager, config: &RunConfig, rng: &mut dyn RandomSource) -> RunSummary {
    let dt = config.frame_time();
    let mut summary = RunSummary::default();

    for frame in 0..config.frame_count() {
        let time = frame as f32 * dt;
        let paused = config.is_paused(time);

        manager.tick(rng, dt);
        manager.set(paused);

        summary.frames += 1;
        if paused {
            summary.paused_frames += 1;
        }

        if config.log_every > 0 && frame % config.log_every == 0 {
            let current = manager.current_step().map_or("-", |step| step.name.as_str());
            for (step, output, value) in manager.outputs() {
                tracing::info!(time, current, step, output, value, "Frame output");
            }
        }
    }

    summary.disabled_steps = manager.steps().filter(|step| !step.enabled()).count();
    if summary.disabled_steps > 0 {
        tracing::warn!("{} step(s) were disabled during the run", summary.disabled_steps);
    }
    summary
}

/// Load the configured preset and drive it
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let mut rng = match config.seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_entropy(),
    };

    let mut manager = match &config.preset {
        Some(path) => {
            tracing::info!("Loading preset {}", path.display());
            load_preset(path, &mut rng)?
        }
        None => {
            tracing::info!("No preset configured, using the built-in demo");
            demo_manager(&mut rng)
        }
    };

    tracing::info!(
        "Driving {} steps for {} frames at {} fps",
        manager.step_count(),
        config.frame_count(),
        config.frame_rate
    );
    let summary = drive(&mut manager, config, &mut rng);

    if let Some(path) = &config.save_preset {
        save_preset(&manager, path)?;
        tracing::info!("Saved preset to {}", path.display());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PauseWindow;

    #[test]
    fn test_demo_run_counts_frames() {
        let config = RunConfig {
            frame_rate: 20.0,
            duration: 3.0,
            seed: Some(3),
            log_every: 0,
            pauses: vec![PauseWindow { start: 1.0, end: 2.0 }],
            ..RunConfig::default()
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.frames, 60);
        assert_eq!(summary.paused_frames, 20);
        assert_eq!(summary.disabled_steps, 0);
    }

    #[test]
    fn test_demo_outputs_stay_finite() {
        let mut rng = StdRandom::seeded(9);
        let mut manager = demo_manager(&mut rng);
        let config = RunConfig {
            duration: 20.0,
            log_every: 0,
            ..RunConfig::default()
        };
        drive(&mut manager, &config, &mut rng);
        for (_, _, value) in manager.outputs() {
            assert!(value.is_finite());
        }
    }

    #[test]
    fn test_missing_preset_is_an_error() {
        let mut rng = StdRandom::seeded(0);
        let err = load_preset(Path::new("does/not/exist.json"), &mut rng).unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }

    #[test]
    fn test_preset_file_round_trip() {
        let mut rng = StdRandom::seeded(4);
        let manager = demo_manager(&mut rng);
        let path = std::env::temp_dir().join(format!("cadence_preset_{}.json", std::process::id()));
        save_preset(&manager, &path).unwrap();
        let loaded = load_preset(&path, &mut rng).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.save(), manager.save());
    }
}
