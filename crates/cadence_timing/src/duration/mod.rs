// SPDX-License-Identifier: MIT OR Apache-2.0
//! Durations: timed units of progress split into two named halves.

mod ramp;
mod random_duration;

pub use ramp::{RampConfig, RampDuration, RampState};
pub use random_duration::RandomDuration;

use crate::factory::Factory;
use crate::persist::{self, LoadError};
use crate::random::RandomSource;
use serde_json::Value;

/// A timed unit of progress.
///
/// All progress values are clamped to `[0, 1]`. The first half runs
/// forwards, the second half runs backwards.
#[derive(Debug, Clone)]
pub enum Duration {
    /// Single randomized span
    Random(RandomDuration),
    /// Cycle length ramping up, holding, then ramping down
    Ramp(RampDuration),
}

impl Duration {
    /// Stable type tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Random(_) => RandomDuration::TAG,
            Self::Ramp(_) => RampDuration::TAG,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Random(_) => "Random range",
            Self::Ramp(_) => "Ramp",
        }
    }

    /// Registry of duration kinds keyed by tag
    pub fn factory() -> Factory<Duration> {
        Factory::new("duration")
            .with(RandomDuration::TAG, || Duration::Random(RandomDuration::default()))
            .with(RampDuration::TAG, || Duration::Ramp(RampDuration::default()))
    }

    /// Time spent in the current span or cycle
    pub fn elapsed(&self) -> f32 {
        match self {
            Self::Random(d) => d.elapsed(),
            Self::Ramp(d) => d.elapsed(),
        }
    }

    /// Current span or cycle length
    pub fn current(&self) -> f32 {
        match self {
            Self::Random(d) => d.current(),
            Self::Ramp(d) => d.current(),
        }
    }

    /// Progress through the first half
    pub fn first_half_progress(&self) -> f32 {
        match self {
            Self::Random(d) => d.first_half_progress(),
            Self::Ramp(d) => d.first_half_progress(),
        }
    }

    /// Progress through the second half
    pub fn second_half_progress(&self) -> f32 {
        match self {
            Self::Random(d) => d.second_half_progress(),
            Self::Ramp(d) => d.second_half_progress(),
        }
    }

    /// Progress through the whole duration
    pub fn total_progress(&self) -> f32 {
        match self {
            Self::Random(d) => d.total_progress(),
            Self::Ramp(d) => d.total_progress(),
        }
    }

    /// Progress and direction of the half currently running
    pub fn half_progress(&self) -> (f32, bool) {
        if self.in_first_half() {
            (self.first_half_progress(), true)
        } else {
            (self.second_half_progress(), false)
        }
    }

    /// Whether the halfway point has not been passed yet
    pub fn in_first_half(&self) -> bool {
        match self {
            Self::Random(d) => d.in_first_half(),
            Self::Ramp(d) => d.in_first_half(),
        }
    }

    /// Whether the duration has run out
    pub fn finished(&self) -> bool {
        match self {
            Self::Random(d) => d.finished(),
            Self::Ramp(d) => d.finished(),
        }
    }

    /// Time left until finished
    pub fn time_remaining(&self) -> f32 {
        match self {
            Self::Random(d) => d.time_remaining(),
            Self::Ramp(d) => d.time_remaining(),
        }
    }

    /// Time left in the current half
    pub fn time_remaining_in_half(&self) -> f32 {
        match self {
            Self::Random(d) => d.time_remaining_in_half(),
            Self::Ramp(d) => d.time_remaining_in_half(),
        }
    }

    /// Advance by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        match self {
            Self::Random(d) => d.tick(dt),
            Self::Ramp(d) => d.tick(dt),
        }
    }

    /// Restart, ending within `max_time` when it is positive
    pub fn reset(&mut self, max_time: f32, rng: &mut dyn RandomSource) {
        match self {
            Self::Random(d) => d.reset(max_time, rng),
            Self::Ramp(d) => d.reset(max_time),
        }
    }

    /// Pick up configuration edits without restarting
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        match self {
            Self::Random(d) => d.resume(rng),
            Self::Ramp(d) => d.resume(),
        }
    }

    /// Save configuration with its type tag
    pub fn save(&self) -> Value {
        match self {
            Self::Random(d) => persist::to_tagged(RandomDuration::TAG, &d.config()),
            Self::Ramp(d) => persist::to_tagged(RampDuration::TAG, &d.config()),
        }
    }

    /// Load a saved duration, falling back to the default on bad data
    pub fn load(value: &Value) -> Duration {
        persist::or_default("duration", Self::try_load(value), Duration::default)
    }

    /// Load a saved duration
    pub fn try_load(value: &Value) -> Result<Duration, LoadError> {
        let tag = persist::type_tag(value)?;
        let duration = match Self::factory().create(tag)? {
            Self::Random(_) => {
                Self::Random(RandomDuration::from_config(persist::from_value(value)?))
            }
            Self::Ramp(_) => Self::Ramp(RampDuration::from_config(persist::from_value(value)?)),
        };
        Ok(duration)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::Random(RandomDuration::default())
    }
}

impl From<RandomDuration> for Duration {
    fn from(duration: RandomDuration) -> Self {
        Self::Random(duration)
    }
}

impl From<RampDuration> for Duration {
    fn from(duration: RampDuration) -> Self {
        Self::Ramp(duration)
    }
}
