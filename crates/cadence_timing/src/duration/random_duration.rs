// SPDX-License-Identifier: MIT OR Apache-2.0
//! Duration with a single randomized span.

use crate::random::RandomSource;
use crate::randomizable::{RandomizableConfig, RandomizableTime};

/// Duration facade over one [`RandomizableTime`].
///
/// The span is split in two equal halves at `current / 2`.
#[derive(Debug, Clone)]
pub struct RandomDuration {
    time: RandomizableTime,
}

impl RandomDuration {
    /// Type tag
    pub const TAG: &'static str = "random";

    /// Create a fixed-length duration
    pub fn new(seconds: f32) -> Self {
        Self {
            time: RandomizableTime::fixed(seconds),
        }
    }

    /// Create a randomized duration
    pub fn with_range(initial: f32, range: f32, interval: f32) -> Self {
        Self {
            time: RandomizableTime::new(initial, range, interval),
        }
    }

    /// Underlying randomizable time
    pub fn time(&self) -> &RandomizableTime {
        &self.time
    }

    /// Mutable access to the randomizable time
    pub fn time_mut(&mut self) -> &mut RandomizableTime {
        &mut self.time
    }

    fn half(&self) -> f32 {
        self.time.current() / 2.0
    }

    /// Time spent in the span
    pub fn elapsed(&self) -> f32 {
        self.time.elapsed()
    }

    /// Current span length
    pub fn current(&self) -> f32 {
        self.time.current()
    }

    /// Progress through the first half
    pub fn first_half_progress(&self) -> f32 {
        let half = self.half();
        if half <= 0.0 {
            return 1.0;
        }
        (self.elapsed() / half).clamp(0.0, 1.0)
    }

    /// Progress through the second half
    pub fn second_half_progress(&self) -> f32 {
        let half = self.half();
        if half <= 0.0 {
            return 1.0;
        }
        ((self.elapsed() - half) / half).clamp(0.0, 1.0)
    }

    /// Progress through the whole span
    pub fn total_progress(&self) -> f32 {
        self.time.progress()
    }

    /// Whether the halfway point has not been passed yet
    pub fn in_first_half(&self) -> bool {
        self.elapsed() <= self.half()
    }

    /// Whether the span has run out
    pub fn finished(&self) -> bool {
        self.time.finished()
    }

    /// Time left in the span
    pub fn time_remaining(&self) -> f32 {
        self.time.time_remaining()
    }

    /// Time left until the end of the current half
    pub fn time_remaining_in_half(&self) -> f32 {
        if self.in_first_half() {
            (self.half() - self.elapsed()).max(0.0)
        } else {
            self.time_remaining()
        }
    }

    /// Advance the span
    pub fn tick(&mut self, dt: f32) {
        self.time.tick(dt);
    }

    /// Restart the span, capped to `max_time` when positive
    pub fn reset(&mut self, max_time: f32, rng: &mut dyn RandomSource) {
        self.time.reset_with_max(max_time, rng);
    }

    /// Pick up configuration edits
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        self.time.resume(rng);
    }

    /// Persisted configuration
    pub fn config(&self) -> RandomizableConfig<f32> {
        self.time.config()
    }

    /// Build from persisted configuration
    pub fn from_config(config: RandomizableConfig<f32>) -> Self {
        Self {
            time: RandomizableTime::from_config(config),
        }
    }
}

impl Default for RandomDuration {
    fn default() -> Self {
        Self::new(1.0)
    }
}
