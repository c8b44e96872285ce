// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scheduling of steps: which step is driven each frame.

use crate::step::{Step, StepId};
use cadence_timing::persist::{self, LoadError};
use cadence_timing::{shuffle, Factory, RandomSource};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Ordered collection of steps owned by a manager
pub type Steps = IndexMap<StepId, Step>;

/// Walks the steps one at a time, bouncing at either end.
///
/// Reaching an end flips the direction and revisits the edge step, so
/// three steps are visited `0, 1, 2, 2, 1, 0, 0, 1, ...`. Disabled steps
/// are skipped.
#[derive(Debug, Clone)]
pub struct OrderedProgression {
    order: Vec<usize>,
    /// Position in `order` of the current step
    position: Option<usize>,
    forwards: bool,
    shuffle: bool,
}

impl OrderedProgression {
    /// Create an ordered progression; `shuffle` reorders on every turn
    pub fn new(shuffle: bool) -> Self {
        Self {
            order: Vec::new(),
            position: None,
            forwards: true,
            shuffle,
        }
    }

    /// Step indices in visiting order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Direction of the pass in progress
    pub fn forwards(&self) -> bool {
        self.forwards
    }

    /// Index of the current step
    pub fn current(&self) -> Option<usize> {
        self.position.and_then(|p| self.order.get(p).copied())
    }

    fn rebuild(&mut self, count: usize, rng: &mut dyn RandomSource) {
        self.order = (0..count).collect();
        if self.shuffle {
            shuffle(&mut self.order, rng);
        }
    }

    /// Forget the current step after the step list changed
    pub fn steps_changed(&mut self, count: usize, rng: &mut dyn RandomSource) {
        self.rebuild(count, rng);
        self.position = None;
        self.forwards = true;
    }

    /// Advance to the next enabled step
    pub fn next(&mut self, steps: &Steps, rng: &mut dyn RandomSource) -> Option<usize> {
        let count = steps.len();
        if self.order.len() != count {
            self.steps_changed(count, rng);
        }
        if count == 0 {
            self.position = None;
            return None;
        }

        let mut position = match self.position {
            Some(p) => p as isize,
            None if self.forwards => -1,
            None => count as isize,
        };
        let mut flips = 0;
        loop {
            position += if self.forwards { 1 } else { -1 };
            if position < 0 || position >= count as isize {
                flips += 1;
                if flips == 2 {
                    tracing::debug!("No enabled step to progress to");
                    self.position = None;
                    return None;
                }
                self.forwards = !self.forwards;
                if self.shuffle {
                    self.rebuild(count, rng);
                }
                position = if self.forwards { 0 } else { count as isize - 1 };
            }

            let index = self.order[position as usize];
            if steps.get_index(index).is_some_and(|(_, step)| step.enabled()) {
                self.position = Some(position as usize);
                return Some(index);
            }
        }
    }

    fn valid_current(&self, steps: &Steps) -> Option<usize> {
        if self.order.len() != steps.len() {
            return None;
        }
        self.current()
            .filter(|&i| steps.get_index(i).is_some_and(|(_, step)| step.enabled()))
    }

    fn tick(&mut self, steps: &mut Steps, rng: &mut dyn RandomSource, dt: f32) {
        let current = match self.valid_current(steps) {
            Some(current) => current,
            None => match self.next(steps, rng) {
                Some(current) => current,
                None => return,
            },
        };

        for (index, (_, step)) in steps.iter_mut().enumerate() {
            if index != current && step.enabled() {
                step.tick_paused(dt);
            }
        }

        let forwards = self.forwards;
        let running = steps
            .get_index_mut(current)
            .is_some_and(|(_, step)| step.tick(rng, dt, forwards));
        if !running {
            self.next(steps, rng);
        }
    }
}

/// Strategy deciding which steps run
#[derive(Debug, Clone)]
pub enum StepProgression {
    /// One step at a time, in list order
    Sequential(OrderedProgression),
    /// One step at a time, reshuffled every forwards pass
    Random(OrderedProgression),
    /// Every enabled step runs at once
    Concurrent,
}

impl StepProgression {
    /// Sequential tag
    pub const SEQUENTIAL: &'static str = "sequential";
    /// Random tag
    pub const RANDOM: &'static str = "random";
    /// Concurrent tag
    pub const CONCURRENT: &'static str = "concurrent";

    /// Sequential progression
    pub fn sequential() -> Self {
        Self::Sequential(OrderedProgression::new(false))
    }

    /// Random-order progression
    pub fn random() -> Self {
        Self::Random(OrderedProgression::new(true))
    }

    /// Stable type tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Sequential(_) => Self::SEQUENTIAL,
            Self::Random(_) => Self::RANDOM,
            Self::Concurrent => Self::CONCURRENT,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sequential(_) => "Sequential",
            Self::Random(_) => "Random",
            Self::Concurrent => "Concurrent",
        }
    }

    /// Registry of progression kinds keyed by tag
    pub fn factory() -> Factory<StepProgression> {
        Factory::new("step progression")
            .with(Self::SEQUENTIAL, StepProgression::sequential)
            .with(Self::RANDOM, StepProgression::random)
            .with(Self::CONCURRENT, || StepProgression::Concurrent)
    }

    /// Index of the step currently driven, `None` for concurrent
    pub fn current(&self) -> Option<usize> {
        match self {
            Self::Sequential(ordered) | Self::Random(ordered) => ordered.current(),
            Self::Concurrent => None,
        }
    }

    /// Drive the steps for one frame
    pub fn tick(&mut self, steps: &mut Steps, rng: &mut dyn RandomSource, dt: f32) {
        match self {
            Self::Sequential(ordered) | Self::Random(ordered) => ordered.tick(steps, rng, dt),
            Self::Concurrent => {
                for step in steps.values_mut().filter(|step| step.enabled()) {
                    if !step.tick(rng, dt, true) {
                        step.resume(rng);
                    }
                }
            }
        }
    }

    /// Forget the current position after the step list changed
    pub fn steps_changed(&mut self, count: usize, rng: &mut dyn RandomSource) {
        if let Self::Sequential(ordered) | Self::Random(ordered) = self {
            ordered.steps_changed(count, rng);
        }
    }

    /// Save with its type tag
    pub fn save(&self) -> Value {
        persist::to_tagged(self.type_tag(), &Map::new())
    }

    /// Load a saved progression
    pub fn try_load(value: &Value) -> Result<StepProgression, LoadError> {
        Ok(Self::factory().create(persist::type_tag(value)?)?)
    }

    /// Load a saved progression, falling back to sequential on bad data
    pub fn load(value: &Value) -> StepProgression {
        persist::or_default("step progression", Self::try_load(value), StepProgression::default)
    }
}

impl Default for StepProgression {
    fn default() -> Self {
        Self::sequential()
    }
}
