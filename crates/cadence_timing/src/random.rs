// SPDX-License-Identifier: MIT OR Apache-2.0
//! Swappable random number providers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of random numbers used whenever a value is re-rolled.
///
/// Passed explicitly to every operation that may draw, so a host can
/// share one provider and tests can substitute a deterministic one.
pub trait RandomSource {
    /// Uniform float in `[min, max]`. Returns `min` when the range is empty.
    fn random_float(&mut self, min: f32, max: f32) -> f32;

    /// Uniform integer in `[min, max]`, both ends inclusive.
    fn random_int(&mut self, min: i32, max: i32) -> i32;
}

/// Random source backed by [`StdRng`]
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Create a source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible source from a seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn random_float(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn random_int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Deterministic random source for tests.
///
/// Plays back queued unit values in `[0, 1]` and maps them onto the
/// requested range. Once the queue is empty the fallback is used, which
/// defaults to `0.5` (the midpoint of any range).
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRandom {
    /// Create a source that always returns the midpoint
    pub fn new() -> Self {
        Self {
            values: VecDeque::new(),
            fallback: 0.5,
        }
    }

    /// Create a source that always returns the given unit value
    pub fn constant(unit: f32) -> Self {
        Self {
            values: VecDeque::new(),
            fallback: unit.clamp(0.0, 1.0),
        }
    }

    /// Create a source playing back the given unit values
    pub fn sequence(values: impl IntoIterator<Item = f32>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect(),
            fallback: 0.5,
        }
    }

    /// Queue another unit value
    pub fn push(&mut self, unit: f32) {
        self.values.push_back(unit.clamp(0.0, 1.0));
    }

    fn next_unit(&mut self) -> f32 {
        self.values.pop_front().unwrap_or(self.fallback)
    }
}

impl Default for ScriptedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ScriptedRandom {
    fn random_float(&mut self, min: f32, max: f32) -> f32 {
        let unit = self.next_unit();
        if max <= min {
            return min;
        }
        min + (max - min) * unit
    }

    fn random_int(&mut self, min: i32, max: i32) -> i32 {
        let unit = self.next_unit();
        if max <= min {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as f64;
        let offset = (f64::from(unit) * span).floor() as i64;
        (i64::from(min) + offset).min(i64::from(max)) as i32
    }
}

/// Fisher-Yates shuffle driven by a [`RandomSource`]
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.random_int(0, i as i32) as usize;
        items.swap(i, j);
    }
}
