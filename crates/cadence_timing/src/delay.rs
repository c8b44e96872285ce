// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pauses injected at halfway and end points of an owner's progression.

use crate::duration::{Duration, RandomDuration};
use crate::persist::{self, LoadError};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trigger points of a delay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayTriggers {
    /// Pause when the owner crosses its halfway point
    pub halfway: bool,
    /// Pause when the owner completes a forwards pass
    pub end_forwards: bool,
    /// Pause when the owner completes a backwards pass
    pub end_backwards: bool,
}

/// A pause layered on top of an owner's duration.
///
/// While active the owner's progression is frozen and only the delay's
/// own duration advances. When the owner arms the delay it also decides
/// what happens afterwards: halt the owner, reset its duration, or both.
#[derive(Debug, Clone)]
pub struct Delay {
    duration: Duration,
    /// Trigger points
    pub triggers: DelayTriggers,
    active: bool,
    stop_after: bool,
    reset_duration_after: bool,
}

impl Delay {
    /// Create a disabled delay with the given duration
    pub fn new(duration: impl Into<Duration>) -> Self {
        Self {
            duration: duration.into(),
            triggers: DelayTriggers::default(),
            active: false,
            stop_after: false,
            reset_duration_after: false,
        }
    }

    /// Set the trigger points
    pub fn with_triggers(mut self, halfway: bool, end_forwards: bool, end_backwards: bool) -> Self {
        self.triggers = DelayTriggers {
            halfway,
            end_forwards,
            end_backwards,
        };
        self
    }

    /// Pause duration
    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    /// Mutable pause duration
    pub fn duration_mut(&mut self) -> &mut Duration {
        &mut self.duration
    }

    /// Replace the pause duration, returning the previous one
    pub fn set_duration(&mut self, duration: Duration) -> Duration {
        std::mem::replace(&mut self.duration, duration)
    }

    /// Whether any trigger point is set
    pub fn is_enabled(&self) -> bool {
        self.triggers.halfway || self.triggers.end_forwards || self.triggers.end_backwards
    }

    /// Whether the owner is currently frozen
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the owner halts once this pause ends
    pub fn stop_after(&self) -> bool {
        self.stop_after
    }

    /// Whether the owner resets its duration once this pause ends
    pub fn reset_duration_after(&self) -> bool {
        self.reset_duration_after
    }

    /// Start the pause; takes effect on the owner's next tick
    pub fn activate(
        &mut self,
        stop_after: bool,
        reset_duration_after: bool,
        rng: &mut dyn RandomSource,
    ) {
        self.active = true;
        self.stop_after = stop_after;
        self.reset_duration_after = reset_duration_after;
        self.duration.reset(0.0, rng);
    }

    /// Advance the pause. Returns `true` on the tick it ends.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.duration.tick(dt);
        if self.duration.finished() {
            self.active = false;
            true
        } else {
            false
        }
    }

    /// Abort any pause in progress
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.active = false;
        self.stop_after = false;
        self.reset_duration_after = false;
        self.duration.reset(0.0, rng);
    }

    /// Pick up configuration edits
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        self.duration.resume(rng);
    }

    /// Save configuration
    pub fn save(&self) -> Value {
        let mut value = persist::to_value(&self.triggers);
        if let Value::Object(object) = &mut value {
            object.insert("duration".to_string(), self.duration.save());
        }
        value
    }

    /// Load a saved delay
    pub fn try_load(value: &Value) -> Result<Delay, LoadError> {
        let triggers: DelayTriggers = persist::from_value(value)?;
        let duration = match value.get("duration") {
            Some(saved) => Duration::try_load(saved)?,
            None => Duration::default(),
        };
        Ok(Self {
            triggers,
            ..Self::new(duration)
        })
    }

    /// Load a saved delay, falling back to the default on bad data
    pub fn load(value: &Value) -> Delay {
        persist::or_default("delay", Self::try_load(value), Delay::default)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new(RandomDuration::new(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_inactive_delay_ignores_ticks() {
        let mut delay = Delay::default();
        assert!(!delay.tick(5.0));
        assert!(!delay.is_active());
    }

    #[test]
    fn test_activation_runs_its_duration() {
        let mut rng = ScriptedRandom::new();
        let mut delay = Delay::new(RandomDuration::new(0.5)).with_triggers(true, false, false);
        assert!(delay.is_enabled());

        delay.activate(true, false, &mut rng);
        assert!(delay.is_active());
        assert!(delay.stop_after());
        assert!(!delay.tick(0.25));
        assert!(delay.is_active());
        assert!(delay.tick(0.25));
        assert!(!delay.is_active());
        // Post-flags stay readable after the pause ends
        assert!(delay.stop_after());
    }

    #[test]
    fn test_reactivation_restarts_duration() {
        let mut rng = ScriptedRandom::new();
        let mut delay = Delay::new(RandomDuration::new(0.5));
        delay.activate(false, true, &mut rng);
        delay.tick(0.5);
        delay.activate(false, true, &mut rng);
        assert!(!delay.tick(0.25));
    }

    #[test]
    fn test_reset_aborts() {
        let mut rng = ScriptedRandom::new();
        let mut delay = Delay::default();
        delay.activate(true, true, &mut rng);
        delay.reset(&mut rng);
        assert!(!delay.is_active());
        assert!(!delay.stop_after());
    }

    #[test]
    fn test_round_trip() {
        let delay =
            Delay::new(RandomDuration::with_range(2.0, 0.5, 1.0)).with_triggers(false, true, true);
        let saved = delay.save();
        let loaded = Delay::load(&saved);
        assert_eq!(loaded.triggers, delay.triggers);
        assert_eq!(loaded.save(), saved);
    }
}
