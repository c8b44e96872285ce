// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two randomized bounds and an easing curve producing a magnitude.

use crate::easing::Easing;
use crate::persist::{self, LoadError};
use crate::random::RandomSource;
use crate::randomizable::{RandomizableConfig, RandomizableFloat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted configuration of a movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Bound reached at progress 0
    pub minimum: RandomizableConfig<f32>,
    /// Bound reached at progress 1
    pub maximum: RandomizableConfig<f32>,
    /// Interpolation curve
    pub easing: Easing,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            minimum: RandomizableConfig {
                initial: 0.0,
                range: 0.0,
                interval: 0.0,
            },
            maximum: RandomizableConfig {
                initial: 1.0,
                range: 0.0,
                interval: 0.0,
            },
            easing: Easing::Linear,
        }
    }
}

/// Interpolation track between two independently randomized bounds.
///
/// Moving forwards heads from `minimum` to `maximum`, moving backwards
/// heads back. A bound is only re-rolled when a pass towards it starts,
/// which is when the magnitude is pinned to the other bound, so a re-roll
/// never makes the magnitude jump.
#[derive(Debug, Clone)]
pub struct Movement {
    minimum: RandomizableFloat,
    maximum: RandomizableFloat,
    easing: Easing,
    magnitude: f32,
    /// Direction of the pass in progress, `None` before the first tick
    forwards: Option<bool>,
}

impl Movement {
    /// Create a movement between two fixed bounds
    pub fn new(minimum: f32, maximum: f32) -> Self {
        Self::from_bounds(
            RandomizableFloat::fixed(minimum),
            RandomizableFloat::fixed(maximum),
            Easing::Linear,
        )
    }

    /// Create a movement from randomized bounds
    pub fn from_bounds(
        minimum: RandomizableFloat,
        maximum: RandomizableFloat,
        easing: Easing,
    ) -> Self {
        let magnitude = minimum.current();
        Self {
            minimum,
            maximum,
            easing,
            magnitude,
            forwards: None,
        }
    }

    /// Set the easing curve
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Lower end of the track
    pub fn minimum(&self) -> &RandomizableFloat {
        &self.minimum
    }

    /// Mutable lower end of the track
    pub fn minimum_mut(&mut self) -> &mut RandomizableFloat {
        &mut self.minimum
    }

    /// Upper end of the track
    pub fn maximum(&self) -> &RandomizableFloat {
        &self.maximum
    }

    /// Mutable upper end of the track
    pub fn maximum_mut(&mut self) -> &mut RandomizableFloat {
        &mut self.maximum
    }

    /// Interpolation curve
    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Change the interpolation curve
    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    /// Last computed magnitude
    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    /// Magnitude at rest (progress 0 forwards)
    pub fn rest_value(&self) -> f32 {
        self.minimum.current()
    }

    /// Advance the bound being approached and recompute the magnitude
    pub fn tick(&mut self, rng: &mut dyn RandomSource, dt: f32, progress: f32, forwards: bool) {
        if self.forwards != Some(forwards) {
            if forwards {
                self.maximum.reset(false, rng);
            } else {
                self.minimum.reset(false, rng);
            }
            self.forwards = Some(forwards);
        }

        if forwards {
            self.maximum.tick(dt);
        } else {
            self.minimum.tick(dt);
        }

        self.magnitude = self.magnitude_at(progress, forwards);
    }

    /// Magnitude for a progress and direction without changing state
    pub fn magnitude_at(&self, progress: f32, forwards: bool) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        let t = if forwards { progress } else { 1.0 - progress };
        let low = self.minimum.current();
        let high = self.maximum.current();
        let distance = (high - low).abs();
        let eased = self.easing.apply(t);
        if high >= low {
            low + eased * distance
        } else {
            low - eased * distance
        }
    }

    /// Re-roll both bounds where due and return to rest
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.minimum.reset(false, rng);
        self.maximum.reset(false, rng);
        self.forwards = None;
        self.magnitude = self.rest_value();
    }

    /// Pick up edits to either bound
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        self.minimum.resume(rng);
        self.maximum.resume(rng);
    }

    /// Persisted configuration
    pub fn config(&self) -> MovementConfig {
        MovementConfig {
            minimum: self.minimum.config(),
            maximum: self.maximum.config(),
            easing: self.easing,
        }
    }

    /// Build from persisted configuration
    pub fn from_config(config: MovementConfig) -> Self {
        Self::from_bounds(
            RandomizableFloat::from_config(config.minimum),
            RandomizableFloat::from_config(config.maximum),
            config.easing,
        )
    }

    /// Save configuration
    pub fn save(&self) -> Value {
        persist::to_value(&self.config())
    }

    /// Load a saved movement
    pub fn try_load(value: &Value) -> Result<Movement, LoadError> {
        Ok(Self::from_config(persist::from_value(value)?))
    }

    /// Load a saved movement, falling back to the default on bad data
    pub fn load(value: &Value) -> Movement {
        persist::or_default("movement", Self::try_load(value), Movement::default)
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::from_config(MovementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_forwards_and_backwards() {
        let mut rng = ScriptedRandom::new();
        let mut movement = Movement::new(2.0, 4.0);
        movement.tick(&mut rng, 0.1, 0.25, true);
        assert!((movement.magnitude() - 2.5).abs() < EPS);
        movement.tick(&mut rng, 0.1, 0.25, false);
        assert!((movement.magnitude() - 3.5).abs() < EPS);
    }

    #[test]
    fn test_inverted_bounds_interpolate_from_minimum() {
        let mut rng = ScriptedRandom::new();
        let mut movement = Movement::new(1.0, -1.0);
        movement.tick(&mut rng, 0.1, 0.0, true);
        assert_eq!(movement.magnitude(), 1.0);
        movement.tick(&mut rng, 0.1, 0.5, true);
        assert!(movement.magnitude().abs() < EPS);
        movement.tick(&mut rng, 0.1, 1.0, true);
        assert_eq!(movement.magnitude(), -1.0);
    }

    #[test]
    fn test_rerolls_only_the_approached_bound() {
        // Every roll lands on the top of the range
        let mut rng = ScriptedRandom::constant(1.0);
        let mut movement = Movement::from_bounds(
            RandomizableFloat::new(0.0, 1.0, 0.0),
            RandomizableFloat::new(10.0, 1.0, 0.0),
            Easing::Linear,
        );

        movement.tick(&mut rng, 0.1, 0.0, true);
        assert_eq!(movement.maximum().current(), 11.0);
        assert_eq!(movement.minimum().current(), 0.0);
        // Magnitude stays at the minimum when the pass starts
        assert_eq!(movement.magnitude(), 0.0);

        movement.tick(&mut rng, 0.1, 1.0, true);
        assert_eq!(movement.magnitude(), 11.0);

        // Turning around re-rolls the minimum while pinned at the maximum
        movement.tick(&mut rng, 0.1, 0.0, false);
        assert_eq!(movement.minimum().current(), 1.0);
        assert_eq!(movement.magnitude(), 11.0);
    }

    #[test]
    fn test_reset_returns_to_rest() {
        let mut rng = ScriptedRandom::new();
        let mut movement = Movement::new(0.2, 0.8);
        movement.tick(&mut rng, 0.1, 1.0, true);
        movement.reset(&mut rng);
        assert_eq!(movement.magnitude(), 0.2);
    }

    #[test]
    fn test_config_round_trip() {
        let movement = Movement::from_bounds(
            RandomizableFloat::new(0.1, 0.05, 2.0),
            RandomizableFloat::new(0.9, 0.1, 1.0),
            Easing::BounceOut,
        );
        let loaded = Movement::load(&movement.save());
        assert_eq!(loaded.config(), movement.config());
    }
}
