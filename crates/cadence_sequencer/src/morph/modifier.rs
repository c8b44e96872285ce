// SPDX-License-Identifier: MIT OR Apache-2.0
//! Modifier blending a set of morph weights.

use super::progression::MorphProgression;
use super::target::{MorphTarget, MorphTargetConfig};
use crate::modifier::{Modifier, ModifierError};
use cadence_timing::persist::{self, LoadError};
use cadence_timing::{Duration, RandomSource};
use serde_json::{Map, Value};

/// Drives morph target weights from a step's progress.
///
/// By default the weights follow the owning step. With its own duration
/// the modifier loops independently and only halts once the step asks it
/// to stop and the current loop completes. A natural progression ignores
/// both and oscillates each target on its own.
#[derive(Debug, Clone, Default)]
pub struct MorphModifier {
    targets: Vec<MorphTarget>,
    progression: MorphProgression,
    own_duration: Option<Duration>,
    stopping: bool,
    halted: bool,
}

impl MorphModifier {
    /// Type tag
    pub const TAG: &'static str = "morph";

    /// Create a modifier with no targets
    pub fn new(progression: MorphProgression) -> Self {
        Self {
            progression,
            ..Self::default()
        }
    }

    /// Add a target
    pub fn with_target(mut self, target: MorphTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Run on an independent duration instead of the step's progress
    pub fn with_own_duration(mut self, duration: impl Into<Duration>) -> Self {
        self.own_duration = Some(duration.into());
        self
    }

    /// Targets
    pub fn targets(&self) -> &[MorphTarget] {
        &self.targets
    }

    /// Mutable targets
    pub fn targets_mut(&mut self) -> &mut Vec<MorphTarget> {
        &mut self.targets
    }

    /// Progression strategy
    pub fn progression(&self) -> &MorphProgression {
        &self.progression
    }

    /// Replace the progression, handing back the previous one
    pub fn set_progression(&mut self, progression: MorphProgression) -> MorphProgression {
        std::mem::replace(&mut self.progression, progression)
    }

    /// Independent duration, if any
    pub fn own_duration(&self) -> Option<&Duration> {
        self.own_duration.as_ref()
    }

    /// Replace the independent duration, handing back the previous one
    pub fn set_own_duration(&mut self, duration: Option<Duration>) -> Option<Duration> {
        std::mem::replace(&mut self.own_duration, duration)
    }

    /// Whether the independent loop ended after a stop request
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn drive(&mut self, rng: &mut dyn RandomSource, dt: f32, progress: f32, forwards: bool) {
        if self.progression.is_independent() {
            self.progression.tick(&mut self.targets, rng, dt, 0.0, true);
            return;
        }
        match self.own_duration.as_mut() {
            Some(duration) => {
                if self.halted {
                    return;
                }
                duration.tick(dt);
                let (own_progress, own_forwards) = duration.half_progress();
                self.progression
                    .tick(&mut self.targets, rng, dt, own_progress, own_forwards);
                if duration.finished() {
                    if self.stopping {
                        self.halted = true;
                    } else {
                        duration.reset(0.0, rng);
                    }
                }
            }
            None => self.progression.tick(&mut self.targets, rng, dt, progress, forwards),
        }
    }
}

impl Modifier for MorphModifier {
    fn type_tag(&self) -> &'static str {
        Self::TAG
    }

    fn tick(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) -> Result<(), ModifierError> {
        self.drive(rng, dt, progress, forwards);
        Ok(())
    }

    fn tick_paused(&mut self, _dt: f32) -> Result<(), ModifierError> {
        Ok(())
    }

    fn tick_delayed(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) -> Result<(), ModifierError> {
        // Only timings of their own keep running through the step's delay
        if self.progression.is_independent() || self.own_duration.is_some() {
            self.drive(rng, dt, progress, forwards);
        }
        Ok(())
    }

    fn set(&mut self, paused: bool) -> Result<(), ModifierError> {
        if paused {
            return Ok(());
        }
        self.targets
            .iter_mut()
            .filter(|target| target.enabled())
            .try_for_each(MorphTarget::apply)
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        for target in &mut self.targets {
            target.reset(rng);
        }
        self.progression.reset();
        if let Some(duration) = self.own_duration.as_mut() {
            duration.reset(0.0, rng);
        }
        self.stopping = false;
        self.halted = false;
    }

    fn resume(&mut self, rng: &mut dyn RandomSource) {
        for target in &mut self.targets {
            target.resume(rng);
        }
        self.progression.resume(rng);
        if let Some(duration) = self.own_duration.as_mut() {
            if self.halted {
                duration.reset(0.0, rng);
            } else {
                duration.resume(rng);
            }
        }
        self.stopping = false;
        self.halted = false;
    }

    fn stop(&mut self, time_remaining: f32) {
        self.stopping = true;
        self.progression.stop(time_remaining);
    }

    fn finished(&self) -> bool {
        if self.progression.is_independent() {
            return self.progression.finished(&self.targets);
        }
        match &self.own_duration {
            Some(duration) => self.halted || duration.elapsed() <= 0.0,
            None => true,
        }
    }

    fn time_remaining(&self) -> f32 {
        if self.progression.is_independent() {
            return self.progression.time_remaining(&self.targets);
        }
        match &self.own_duration {
            Some(_) if self.halted => 0.0,
            Some(duration) => duration.time_remaining(),
            None => 0.0,
        }
    }

    fn outputs(&self) -> Vec<(&str, f32)> {
        self.targets
            .iter()
            .filter(|target| target.enabled())
            .map(|target| (target.name.as_str(), target.applied()))
            .collect()
    }

    fn save(&self) -> Value {
        let mut object = Map::new();
        let targets = self
            .targets
            .iter()
            .map(|target| persist::to_value(&target.config()))
            .collect();
        object.insert("targets".to_string(), Value::Array(targets));
        object.insert("progression".to_string(), self.progression.save());
        if let Some(duration) = &self.own_duration {
            object.insert("duration".to_string(), duration.save());
        }
        persist::to_tagged(Self::TAG, &object)
    }

    fn load(&mut self, value: &Value) {
        *self = persist::or_default(
            "morph modifier",
            Self::try_load(value),
            MorphModifier::default,
        );
    }
}

impl MorphModifier {
    /// Load a saved modifier
    pub fn try_load(value: &Value) -> Result<MorphModifier, LoadError> {
        let mut modifier = MorphModifier::default();
        if let Some(saved) = persist::field::<Vec<MorphTargetConfig>>(value, "targets")? {
            modifier.targets = saved.into_iter().map(MorphTarget::from_config).collect();
        }
        if let Some(saved) = value.get("progression") {
            modifier.progression = MorphProgression::load(saved);
        }
        if let Some(saved) = value.get("duration") {
            modifier.own_duration = Some(Duration::load(saved));
        }
        Ok(modifier)
    }
}
