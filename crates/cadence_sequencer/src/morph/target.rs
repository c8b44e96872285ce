// SPDX-License-Identifier: MIT OR Apache-2.0
//! A single named weight driven by a movement.

use crate::modifier::ModifierError;
use cadence_timing::{Movement, MovementConfig, RandomSource};
use serde::{Deserialize, Serialize};

/// Persisted configuration of a morph target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MorphTargetConfig {
    /// Target name
    pub name: String,
    /// Whether the target is driven
    pub enabled: bool,
    /// Weight track
    pub movement: MovementConfig,
}

impl Default for MorphTargetConfig {
    fn default() -> Self {
        Self {
            name: "Target".to_string(),
            enabled: true,
            movement: MovementConfig::default(),
        }
    }
}

/// A morph weight.
///
/// `value` is what the progression computed this frame; `applied` is what
/// was last committed to the host by [`MorphTarget::apply`].
#[derive(Debug, Clone)]
pub struct MorphTarget {
    /// Target name
    pub name: String,
    movement: Movement,
    value: f32,
    applied: f32,
    enabled: bool,
}

impl MorphTarget {
    /// Create a target at rest
    pub fn new(name: impl Into<String>, movement: Movement) -> Self {
        let value = movement.rest_value();
        Self {
            name: name.into(),
            movement,
            value,
            applied: value,
            enabled: true,
        }
    }

    /// Weight track
    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    /// Mutable weight track
    pub fn movement_mut(&mut self) -> &mut Movement {
        &mut self.movement
    }

    /// Weight computed this frame
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Override the computed weight
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// Weight last committed to the host
    pub fn applied(&self) -> f32 {
        self.applied
    }

    /// Weight at rest
    pub fn rest_value(&self) -> f32 {
        self.movement.rest_value()
    }

    /// Whether the target is driven
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the target
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Move along the track
    pub fn tick(&mut self, rng: &mut dyn RandomSource, dt: f32, progress: f32, forwards: bool) {
        self.movement.tick(rng, dt, progress, forwards);
        self.value = self.movement.magnitude();
    }

    /// Commit the computed weight
    pub fn apply(&mut self) -> Result<(), ModifierError> {
        if !self.value.is_finite() {
            return Err(ModifierError::InvalidValue {
                target: self.name.clone(),
                value: self.value,
            });
        }
        self.applied = self.value;
        Ok(())
    }

    /// Return to rest
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.movement.reset(rng);
        self.value = self.movement.rest_value();
    }

    /// Pick up edits to the track
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        self.movement.resume(rng);
    }

    /// Persisted configuration
    pub fn config(&self) -> MorphTargetConfig {
        MorphTargetConfig {
            name: self.name.clone(),
            enabled: self.enabled,
            movement: self.movement.config(),
        }
    }

    /// Build from persisted configuration
    pub fn from_config(config: MorphTargetConfig) -> Self {
        let mut target = Self::new(config.name, Movement::from_config(config.movement));
        target.enabled = config.enabled;
        target
    }
}
