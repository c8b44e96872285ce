// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-level owner of steps and their progression.

use crate::modifier::ModifierFactory;
use crate::progression::{StepProgression, Steps};
use crate::step::{Step, StepId};
use cadence_timing::RandomSource;
use serde_json::{json, Value};

/// Owns the steps and drives them through a progression.
///
/// Hosts call [`Manager::tick`] then [`Manager::set`] once per frame.
#[derive(Debug, Default)]
pub struct Manager {
    steps: Steps,
    progression: StepProgression,
}

impl Manager {
    /// Create an empty manager with a sequential progression
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a progression
    pub fn with_progression(mut self, progression: StepProgression) -> Self {
        self.progression = progression;
        self
    }

    /// Add a step and return its ID
    pub fn add_step(&mut self, step: Step, rng: &mut dyn RandomSource) -> StepId {
        let id = step.id;
        self.steps.insert(id, step);
        self.progression.steps_changed(self.steps.len(), rng);
        id
    }

    /// Remove a step, handing it back
    pub fn remove_step(&mut self, step_id: StepId, rng: &mut dyn RandomSource) -> Option<Step> {
        let step = self.steps.get_mut(&step_id)?;
        step.about_to_be_removed();
        let mut step = self.steps.shift_remove(&step_id)?;
        step.removed();
        self.progression.steps_changed(self.steps.len(), rng);
        Some(step)
    }

    /// Move a step to a new position in the order
    pub fn move_step(&mut self, from: usize, to: usize, rng: &mut dyn RandomSource) -> bool {
        let count = self.steps.len();
        if from >= count || to >= count {
            return false;
        }
        self.steps.move_index(from, to);
        self.progression.steps_changed(count, rng);
        true
    }

    /// Get a step
    pub fn step(&self, step_id: StepId) -> Option<&Step> {
        self.steps.get(&step_id)
    }

    /// Get a mutable step
    pub fn step_mut(&mut self, step_id: StepId) -> Option<&mut Step> {
        self.steps.get_mut(&step_id)
    }

    /// Get all steps in order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    /// Get step count
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step currently driven by an ordered progression
    pub fn current_step(&self) -> Option<&Step> {
        let index = self.progression.current()?;
        self.steps.get_index(index).map(|(_, step)| step)
    }

    /// Progression
    pub fn progression(&self) -> &StepProgression {
        &self.progression
    }

    /// Replace the progression, handing back the previous one
    pub fn set_progression(
        &mut self,
        progression: StepProgression,
        rng: &mut dyn RandomSource,
    ) -> StepProgression {
        let previous = std::mem::replace(&mut self.progression, progression);
        self.progression.steps_changed(self.steps.len(), rng);
        tracing::info!(
            "Step progression changed: {} -> {}",
            previous.display_name(),
            self.progression.display_name()
        );
        previous
    }

    /// Advance every step by `dt` seconds
    pub fn tick(&mut self, rng: &mut dyn RandomSource, dt: f32) {
        self.progression.tick(&mut self.steps, rng, dt);
    }

    /// Apply modifier values to the host
    pub fn set(&mut self, paused: bool) {
        for step in self.steps.values_mut() {
            step.set(paused);
        }
    }

    /// Return every step to rest
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        for step in self.steps.values_mut() {
            step.reset(rng);
        }
        self.progression.steps_changed(self.steps.len(), rng);
    }

    /// Values currently applied by every enabled modifier, by step
    pub fn outputs(&self) -> Vec<(&str, &str, f32)> {
        self.steps
            .values()
            .filter(|step| step.enabled())
            .flat_map(|step| {
                step.modifiers()
                    .iter()
                    .filter(|slot| slot.enabled())
                    .flat_map(move |slot| {
                        slot.modifier()
                            .outputs()
                            .into_iter()
                            .map(move |(name, value)| (step.name.as_str(), name, value))
                    })
            })
            .collect()
    }

    /// Save the progression and every step
    pub fn save(&self) -> Value {
        json!({
            "progression": self.progression.save(),
            "steps": self.steps.values().map(Step::save).collect::<Vec<_>>(),
        })
    }

    /// Load a saved manager; malformed parts fall back to defaults
    pub fn load(value: &Value, factory: &ModifierFactory, rng: &mut dyn RandomSource) -> Manager {
        let mut manager = Manager::new();
        if let Some(saved) = value.get("progression") {
            manager.progression = StepProgression::load(saved);
        }
        match value.get("steps").and_then(Value::as_array) {
            Some(saved_steps) => {
                for saved in saved_steps {
                    let step = Step::load(saved, factory);
                    manager.steps.insert(step.id, step);
                }
            }
            None => tracing::warn!("Saved manager has no steps"),
        }
        manager.progression.steps_changed(manager.steps.len(), rng);
        tracing::info!(
            "Loaded {} steps with {} progression",
            manager.steps.len(),
            manager.progression.display_name()
        );
        manager
    }
}
