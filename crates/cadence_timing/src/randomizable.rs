// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scalars of the form "initial ± range", re-rolled every interval.

use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Slack subtracted from the interval before deciding to re-roll, so that
/// frame-delta jitter does not push a re-roll one frame late.
pub const INTERVAL_EPSILON: f32 = 0.009;

/// A value type that can be drawn from `[initial - range, initial + range]`
pub trait Randomizable: Copy + PartialEq + std::fmt::Debug {
    /// Draw a value around `initial`
    fn roll(initial: Self, range: Self, rng: &mut dyn RandomSource) -> Self;
}

impl Randomizable for f32 {
    fn roll(initial: f32, range: f32, rng: &mut dyn RandomSource) -> f32 {
        let range = range.abs();
        rng.random_float(initial - range, initial + range)
    }
}

impl Randomizable for i32 {
    fn roll(initial: i32, range: i32, rng: &mut dyn RandomSource) -> i32 {
        let range = range.abs();
        rng.random_int(initial.saturating_sub(range), initial.saturating_add(range))
    }
}

/// Persisted configuration of a randomizable value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizableConfig<T> {
    /// Center of the random range
    pub initial: T,
    /// Half-width of the random range
    pub range: T,
    /// Seconds between re-rolls, 0 to re-roll on every reset
    pub interval: f32,
}

impl<T: Default> Default for RandomizableConfig<T> {
    fn default() -> Self {
        Self {
            initial: T::default(),
            range: T::default(),
            interval: 0.0,
        }
    }
}

/// A value drawn from `[initial - range, initial + range]`.
///
/// `current` only changes when [`reset`](Self::reset) finds the interval
/// elapsed (or is forced), or when [`resume`](Self::resume) finds the
/// configuration edited since the last roll.
#[derive(Debug, Clone)]
pub struct RandomizableValue<T> {
    initial: T,
    range: T,
    interval: f32,
    current: T,
    elapsed: f32,
    total_elapsed: f32,
    dirty: bool,
}

/// Randomizable float
pub type RandomizableFloat = RandomizableValue<f32>;

impl<T: Randomizable> RandomizableValue<T> {
    /// Create a value; `current` starts at `initial` until the first roll
    pub fn new(initial: T, range: T, interval: f32) -> Self {
        Self {
            initial,
            range,
            interval: interval.max(0.0),
            current: initial,
            elapsed: 0.0,
            total_elapsed: 0.0,
            dirty: false,
        }
    }

    /// Create a value with no randomness
    pub fn fixed(value: T) -> Self
    where
        T: Default,
    {
        Self::new(value, T::default(), 0.0)
    }

    /// Center of the random range
    pub fn initial(&self) -> T {
        self.initial
    }

    /// Change the center; picked up by the next resume or re-roll
    pub fn set_initial(&mut self, initial: T) {
        if initial != self.initial {
            self.initial = initial;
            self.dirty = true;
        }
    }

    /// Half-width of the random range
    pub fn range(&self) -> T {
        self.range
    }

    /// Change the half-width; picked up by the next resume or re-roll
    pub fn set_range(&mut self, range: T) {
        if range != self.range {
            self.range = range;
            self.dirty = true;
        }
    }

    /// Configured re-roll interval
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Change the re-roll interval
    pub fn set_interval(&mut self, interval: f32) {
        let interval = interval.max(0.0);
        if interval != self.interval {
            self.interval = interval;
            self.dirty = true;
        }
    }

    /// Interval actually used to decide re-rolls
    pub fn actual_interval(&self) -> f32 {
        self.interval
    }

    /// Current rolled value
    pub fn current(&self) -> T {
        self.current
    }

    /// Override the current value without rolling
    pub fn set_current(&mut self, current: T) {
        self.current = current;
    }

    /// Time since the last reset
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Time since the last roll
    pub fn total_elapsed(&self) -> f32 {
        self.total_elapsed
    }

    /// Whether the configuration changed since the last roll
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Advance the timers
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
        self.total_elapsed += dt;
    }

    /// Restart `elapsed`, re-rolling when forced or when the interval ran out.
    ///
    /// Returns whether a new value was rolled.
    pub fn reset(&mut self, force: bool, rng: &mut dyn RandomSource) -> bool {
        self.elapsed = 0.0;
        if force || self.total_elapsed >= self.actual_interval() - INTERVAL_EPSILON {
            self.roll(rng);
            true
        } else {
            false
        }
    }

    /// Re-roll only if the configuration was edited since the last roll
    pub fn resume(&mut self, rng: &mut dyn RandomSource) -> bool {
        if self.dirty {
            self.roll(rng);
            true
        } else {
            false
        }
    }

    /// Draw a new value without storing it
    pub fn next(&self, rng: &mut dyn RandomSource) -> T {
        T::roll(self.initial, self.range, rng)
    }

    fn roll(&mut self, rng: &mut dyn RandomSource) {
        self.current = self.next(rng);
        self.total_elapsed = 0.0;
        self.dirty = false;
    }

    /// Persisted configuration
    pub fn config(&self) -> RandomizableConfig<T> {
        RandomizableConfig {
            initial: self.initial,
            range: self.range,
            interval: self.interval,
        }
    }

    /// Build from persisted configuration
    pub fn from_config(config: RandomizableConfig<T>) -> Self {
        Self::new(config.initial, config.range, config.interval)
    }
}

impl<T: Randomizable + Default> Default for RandomizableValue<T> {
    fn default() -> Self {
        Self::fixed(T::default())
    }
}

/// A randomizable span of time in seconds.
///
/// Rolled values are clamped to be non-negative. `elapsed` measures the
/// time spent in the current span.
#[derive(Debug, Clone, Default)]
pub struct RandomizableTime {
    value: RandomizableValue<f32>,
}

impl RandomizableTime {
    /// Create a randomizable time
    pub fn new(initial: f32, range: f32, interval: f32) -> Self {
        let mut value = RandomizableValue::new(initial, range, interval);
        value.set_current(initial.max(0.0));
        Self { value }
    }

    /// Create a fixed time
    pub fn fixed(seconds: f32) -> Self {
        Self::new(seconds, 0.0, 0.0)
    }

    /// Underlying randomizable value
    pub fn value(&self) -> &RandomizableValue<f32> {
        &self.value
    }

    /// Mutable access to the configuration
    pub fn value_mut(&mut self) -> &mut RandomizableValue<f32> {
        &mut self.value
    }

    /// Current span length
    pub fn current(&self) -> f32 {
        self.value.current()
    }

    /// Time spent in the current span
    pub fn elapsed(&self) -> f32 {
        self.value.elapsed()
    }

    /// Time since the last roll
    pub fn total_elapsed(&self) -> f32 {
        self.value.total_elapsed()
    }

    /// Whether the span has run out
    pub fn finished(&self) -> bool {
        self.elapsed() >= self.current()
    }

    /// Fraction of the span elapsed, clamped to `[0, 1]`
    pub fn progress(&self) -> f32 {
        let current = self.current();
        if current <= 0.0 {
            return 1.0;
        }
        (self.elapsed() / current).clamp(0.0, 1.0)
    }

    /// Time left in the span
    pub fn time_remaining(&self) -> f32 {
        (self.current() - self.elapsed()).max(0.0)
    }

    /// Advance the span
    pub fn tick(&mut self, dt: f32) {
        self.value.tick(dt);
    }

    /// Restart the span, see [`RandomizableValue::reset`]
    pub fn reset(&mut self, force: bool, rng: &mut dyn RandomSource) -> bool {
        let rolled = self.value.reset(force, rng);
        self.clamp_current();
        rolled
    }

    /// Restart the span and cap it so it ends within `max_time`.
    ///
    /// A `max_time` of zero or less means "no deadline".
    pub fn reset_with_max(&mut self, max_time: f32, rng: &mut dyn RandomSource) -> bool {
        let rolled = self.reset(false, rng);
        if max_time > 0.0 && self.current() > max_time {
            self.value.set_current(max_time);
        }
        rolled
    }

    /// Pick up configuration edits, see [`RandomizableValue::resume`]
    pub fn resume(&mut self, rng: &mut dyn RandomSource) -> bool {
        let rolled = self.value.resume(rng);
        self.clamp_current();
        rolled
    }

    fn clamp_current(&mut self) {
        let current = self.value.current();
        if current < 0.0 {
            self.value.set_current(0.0);
        }
    }

    /// Persisted configuration
    pub fn config(&self) -> RandomizableConfig<f32> {
        self.value.config()
    }

    /// Build from persisted configuration
    pub fn from_config(config: RandomizableConfig<f32>) -> Self {
        Self::new(config.initial, config.range, config.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, StdRandom};

    #[test]
    fn test_forced_reset_stays_in_range() {
        let mut rng = StdRandom::seeded(3);
        let mut value = RandomizableFloat::new(2.0, 0.5, 10.0);
        for _ in 0..200 {
            value.reset(true, &mut rng);
            assert!((1.5..=2.5).contains(&value.current()));
        }
    }

    #[test]
    fn test_reroll_waits_for_interval() {
        let mut rng = ScriptedRandom::sequence([0.0, 1.0]);
        let mut value = RandomizableFloat::new(1.0, 1.0, 1.0);

        value.tick(0.5);
        assert!(!value.reset(false, &mut rng));
        assert_eq!(value.current(), 1.0);
        assert_eq!(value.elapsed(), 0.0);

        // 0.995 total is within the jitter slack of the 1s interval
        value.tick(0.495);
        assert!(value.reset(false, &mut rng));
        assert_eq!(value.current(), 0.0);
        assert_eq!(value.total_elapsed(), 0.0);
    }

    #[test]
    fn test_zero_interval_rolls_every_reset() {
        let mut rng = ScriptedRandom::sequence([0.0, 1.0]);
        let mut value = RandomizableFloat::new(0.0, 2.0, 0.0);
        assert!(value.reset(false, &mut rng));
        assert_eq!(value.current(), -2.0);
        assert!(value.reset(false, &mut rng));
        assert_eq!(value.current(), 2.0);
    }

    #[test]
    fn test_resume_only_rolls_when_dirty() {
        let mut rng = ScriptedRandom::new();
        let mut value = RandomizableFloat::new(1.0, 0.0, 60.0);
        assert!(!value.resume(&mut rng));

        value.set_initial(3.0);
        assert!(value.is_dirty());
        assert!(value.resume(&mut rng));
        assert_eq!(value.current(), 3.0);
        assert!(!value.is_dirty());
    }

    #[test]
    fn test_time_progress_and_finish() {
        let mut time = RandomizableTime::fixed(2.0);
        time.tick(0.5);
        assert_eq!(time.progress(), 0.25);
        assert_eq!(time.time_remaining(), 1.5);
        assert!(!time.finished());
        time.tick(1.5);
        assert!(time.finished());
        assert_eq!(time.time_remaining(), 0.0);
    }

    #[test]
    fn test_time_never_negative() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut time = RandomizableTime::new(0.5, 2.0, 0.0);
        time.reset(true, &mut rng);
        assert_eq!(time.current(), 0.0);
        assert!(time.finished());
    }

    #[test]
    fn test_reset_with_max_caps_span() {
        let mut rng = ScriptedRandom::new();
        let mut time = RandomizableTime::fixed(3.0);
        time.reset_with_max(1.0, &mut rng);
        assert_eq!(time.current(), 1.0);
        time.reset_with_max(0.0, &mut rng);
        assert_eq!(time.current(), 3.0);
    }
}
