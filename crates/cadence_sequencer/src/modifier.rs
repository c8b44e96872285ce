// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract between a step and the effect modifiers it drives.

use crate::morph::MorphModifier;
use cadence_timing::{Factory, RandomSource};
use serde_json::Value;

/// Fault reported by a modifier while ticking or applying
#[derive(Debug, thiserror::Error)]
pub enum ModifierError {
    /// A target produced a value that cannot be applied
    #[error("Target `{target}` produced an invalid value: {value}")]
    InvalidValue {
        /// Target name
        target: String,
        /// Offending value
        value: f32,
    },

    /// The host object the modifier drives is gone
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// Any other fault
    #[error("{0}")]
    Custom(String),
}

/// An effect driven by a step's progress.
///
/// Steps call `tick*` once per frame and then `set` once per frame,
/// separately, so observers can read state between the two.
pub trait Modifier: std::fmt::Debug {
    /// Stable type tag
    fn type_tag(&self) -> &'static str;

    /// Advance with the step's progress in the current half
    fn tick(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) -> Result<(), ModifierError>;

    /// Advance while another step is the current one; hold values
    fn tick_paused(&mut self, dt: f32) -> Result<(), ModifierError>;

    /// Advance while the step's delay is running; hold position
    fn tick_delayed(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) -> Result<(), ModifierError>;

    /// Apply the computed values to the host
    fn set(&mut self, paused: bool) -> Result<(), ModifierError>;

    /// Return to rest and forget all runtime state
    fn reset(&mut self, rng: &mut dyn RandomSource);

    /// Continue after an activation ended, picking up configuration edits
    fn resume(&mut self, rng: &mut dyn RandomSource);

    /// Converge so that the modifier ends within `time_remaining` seconds
    fn stop(&mut self, time_remaining: f32);

    /// Whether the modifier is at a point where the step may end
    fn finished(&self) -> bool;

    /// Time the modifier still needs before it is finished
    fn time_remaining(&self) -> f32;

    /// Values the modifier currently applies, by name
    fn outputs(&self) -> Vec<(&str, f32)> {
        Vec::new()
    }

    /// The owning step is about to drop this modifier
    fn about_to_be_removed(&mut self) {}

    /// The owning step dropped this modifier
    fn removed(&mut self) {}

    /// Save configuration (must include the type tag)
    fn save(&self) -> Value;

    /// Load configuration saved by [`Modifier::save`]; bad data is logged
    /// and replaced with defaults
    fn load(&mut self, value: &Value);
}

/// Registry of modifier kinds keyed by tag
pub type ModifierFactory = Factory<Box<dyn Modifier>>;

fn new_morph_modifier() -> Box<dyn Modifier> {
    Box::new(MorphModifier::default())
}

/// Registry with every modifier kind this crate provides
pub fn default_modifier_factory() -> ModifierFactory {
    Factory::new("modifier").with(MorphModifier::TAG, new_morph_modifier)
}
