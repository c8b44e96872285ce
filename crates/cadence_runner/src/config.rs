// SPDX-License-Identifier: MIT OR Apache-2.0
//! Run configuration stored as RON.

use crate::error::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current run configuration format version
pub const RUN_CONFIG_VERSION: u32 = 1;

/// Default run configuration file name
pub const RUN_CONFIG_FILE_NAME: &str = "cadence.ron";

/// Window of time during which `set` is called with `paused = true`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseWindow {
    /// Start time in seconds
    pub start: f32,
    /// End time in seconds
    pub end: f32,
}

impl PauseWindow {
    /// Whether `time` falls inside the window
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start && time < self.end
    }
}

/// Settings for one headless run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Settings format version
    pub version: u32,
    /// Frames per second
    pub frame_rate: f32,
    /// Length of the run in seconds
    pub duration: f32,
    /// RNG seed, entropy when absent
    pub seed: Option<u64>,
    /// Frames between logged output snapshots, 0 to disable
    pub log_every: u32,
    /// Paused windows
    pub pauses: Vec<PauseWindow>,
    /// JSON preset to drive, the built-in demo when absent
    pub preset: Option<PathBuf>,
    /// Write the preset driven to this path after the run
    pub save_preset: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: RUN_CONFIG_VERSION,
            frame_rate: 60.0,
            duration: 10.0,
            seed: None,
            log_every: 30,
            pauses: Vec::new(),
            preset: None,
            save_preset: None,
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded run config from {}", path.display());
        Ok(config)
    }

    /// Load from a file, using defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No run config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate RON text
    pub fn from_ron(content: &str) -> Result<Self> {
        let config: RunConfig = ron::from_str(content)?;

        // Version check
        if config.version > RUN_CONFIG_VERSION {
            return Err(RunnerError::UnsupportedVersion {
                found: config.version,
                supported: RUN_CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save as pretty RON
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject settings the frame loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(RunnerError::InvalidSetting {
                field: "frame_rate",
                reason: format!("must be positive, got {}", self.frame_rate),
            });
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(RunnerError::InvalidSetting {
                field: "duration",
                reason: format!("must not be negative, got {}", self.duration),
            });
        }
        if let Some(window) = self.pauses.iter().find(|w| w.end < w.start) {
            return Err(RunnerError::InvalidSetting {
                field: "pauses",
                reason: format!(
                    "window ends at {} before it starts at {}",
                    window.end, window.start
                ),
            });
        }
        Ok(())
    }

    /// Seconds per frame
    pub fn frame_time(&self) -> f32 {
        1.0 / self.frame_rate
    }

    /// Number of frames in the run
    pub fn frame_count(&self) -> u32 {
        (self.duration * self.frame_rate).round() as u32
    }

    /// Whether `time` falls in a pause window
    pub fn is_paused(&self, time: f32) -> bool {
        self.pauses.iter().any(|window| window.contains(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.version, RUN_CONFIG_VERSION);
        assert_eq!(config.frame_count(), 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = RunConfig::from_ron("(frame_rate: 30.0, seed: Some(7))").unwrap();
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.duration, 10.0);
        assert_eq!(config.preset, None);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = RunConfig::from_ron("(version: 99)").unwrap_err();
        assert!(matches!(err, RunnerError::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(matches!(
            RunConfig::from_ron("(frame_rate: 0.0)"),
            Err(RunnerError::InvalidSetting { field: "frame_rate", .. })
        ));
        assert!(matches!(
            RunConfig::from_ron("(pauses: [(start: 2.0, end: 1.0)])"),
            Err(RunnerError::InvalidSetting { field: "pauses", .. })
        ));
        assert!(matches!(RunConfig::from_ron("(frame_rate: \"fast\")"), Err(RunnerError::Ron(_))));
    }

    #[test]
    fn test_pause_windows() {
        let config = RunConfig {
            pauses: vec![PauseWindow { start: 1.0, end: 2.0 }],
            ..RunConfig::default()
        };
        assert!(!config.is_paused(0.5));
        assert!(config.is_paused(1.0));
        assert!(config.is_paused(1.5));
        assert!(!config.is_paused(2.0));
    }

    #[test]
    fn test_ron_round_trip() {
        let config = RunConfig {
            seed: Some(42),
            pauses: vec![PauseWindow { start: 0.5, end: 1.5 }],
            preset: Some(PathBuf::from("presets/face.json")),
            ..RunConfig::default()
        };
        let text = config.to_ron().unwrap();
        assert_eq!(RunConfig::from_ron(&text).unwrap(), config);
    }
}
