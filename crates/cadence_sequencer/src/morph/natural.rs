// SPDX-License-Identifier: MIT OR Apache-2.0
//! Independent per-target oscillation.
//!
//! Each target runs its own copy of a template duration and delay, so
//! targets drift apart over time. When the owning step wants to end, the
//! progression converges every target towards rest within the grace period
//! it was given.

use super::target::MorphTarget;
use cadence_timing::persist::{self, LoadError};
use cadence_timing::{Delay, Duration, RandomSource};
use serde_json::{Map, Value};

/// Distance to rest below which a converging target counts as settled
const SETTLE_EPSILON: f32 = 1e-4;

/// Runtime state of one target's oscillation
#[derive(Debug, Clone)]
struct Oscillator {
    duration: Duration,
    delay: Delay,
    in_first_half: bool,
    settled: bool,
    /// Value written while converging, to detect outside edits
    written: Option<f32>,
}

impl Oscillator {
    fn new(duration: &Duration, delay: &Delay, rng: &mut dyn RandomSource) -> Self {
        let mut oscillator = Self {
            duration: duration.clone(),
            delay: delay.clone(),
            in_first_half: true,
            settled: false,
            written: None,
        };
        oscillator.restart(rng);
        oscillator
    }

    fn restart(&mut self, rng: &mut dyn RandomSource) {
        self.duration.reset(0.0, rng);
        self.in_first_half = true;
    }

    fn tick(&mut self, target: &mut MorphTarget, rng: &mut dyn RandomSource, dt: f32) {
        if self.delay.is_active() {
            if self.delay.tick(dt) && self.delay.reset_duration_after() {
                self.restart(rng);
            }
            return;
        }

        if !self.duration.finished() {
            self.duration.tick(dt);
        }
        let (progress, forwards) = self.duration.half_progress();
        target.tick(rng, dt, progress, forwards);

        if self.in_first_half != forwards {
            self.in_first_half = forwards;
            let triggers = self.delay.triggers;
            if !forwards && (triggers.halfway || triggers.end_forwards) {
                self.delay.activate(false, false, rng);
                return;
            }
        }

        if self.duration.finished() {
            if self.delay.triggers.end_backwards {
                self.delay.activate(false, true, rng);
            } else {
                self.restart(rng);
            }
        }
    }

    /// Move one frame's share of the way to rest
    fn converge(&mut self, target: &mut MorphTarget, frames: f32) {
        if self.settled {
            return;
        }
        if self.written.is_some_and(|written| written != target.value()) {
            tracing::debug!(morph = %target.name, "Morph target edited while stopping, leaving it");
            self.settled = true;
            return;
        }

        let rest = target.rest_value();
        let mut value = target.value() + (rest - target.value()) / frames;
        if (rest - value).abs() <= SETTLE_EPSILON {
            value = rest;
            self.settled = true;
        }
        target.set_value(value);
        self.written = Some(value);
    }
}

/// Every target oscillates on its own copy of a template duration
#[derive(Debug, Clone)]
pub struct NaturalProgression {
    duration: Duration,
    delay: Delay,
    oscillators: Vec<Oscillator>,
    /// Grace period left once a stop was requested
    stop_remaining: Option<f32>,
}

impl NaturalProgression {
    /// Type tag
    pub const TAG: &'static str = "natural";

    /// Create a progression from template timings
    pub fn new(duration: impl Into<Duration>, delay: Delay) -> Self {
        Self {
            duration: duration.into(),
            delay,
            oscillators: Vec::new(),
            stop_remaining: None,
        }
    }

    /// Template duration
    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    /// Replace the template duration, handing back the previous one.
    /// Oscillators pick it up on the next resume.
    pub fn set_duration(&mut self, duration: Duration) -> Duration {
        std::mem::replace(&mut self.duration, duration)
    }

    /// Template delay
    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    /// Replace the template delay, handing back the previous one
    pub fn set_delay(&mut self, delay: Delay) -> Delay {
        std::mem::replace(&mut self.delay, delay)
    }

    /// Whether a stop is in progress
    pub fn is_stopping(&self) -> bool {
        self.stop_remaining.is_some()
    }

    fn sync(&mut self, count: usize, rng: &mut dyn RandomSource) {
        if self.oscillators.len() != count {
            self.oscillators = (0..count)
                .map(|_| Oscillator::new(&self.duration, &self.delay, rng))
                .collect();
        }
    }

    pub(crate) fn tick(
        &mut self,
        targets: &mut [MorphTarget],
        rng: &mut dyn RandomSource,
        dt: f32,
    ) {
        self.sync(targets.len(), rng);

        if let Some(remaining) = self.stop_remaining {
            if dt <= 0.0 {
                return;
            }
            let frames = (remaining / dt).max(1.0);
            for (target, oscillator) in targets.iter_mut().zip(&mut self.oscillators) {
                if target.enabled() {
                    oscillator.converge(target, frames);
                }
            }
            self.stop_remaining = Some((remaining - dt).max(0.0));
            return;
        }

        for (target, oscillator) in targets.iter_mut().zip(&mut self.oscillators) {
            if target.enabled() {
                oscillator.tick(target, rng, dt);
            }
        }
    }

    pub(crate) fn finished(&self, targets: &[MorphTarget]) -> bool {
        let mut enabled = targets
            .iter()
            .zip(&self.oscillators)
            .filter(|(target, _)| target.enabled());
        if self.stop_remaining.is_some() {
            enabled.all(|(_, oscillator)| oscillator.settled)
        } else {
            enabled.all(|(target, _)| {
                (target.value() - target.rest_value()).abs() <= SETTLE_EPSILON
            })
        }
    }

    pub(crate) fn time_remaining(&self, targets: &[MorphTarget]) -> f32 {
        if let Some(remaining) = self.stop_remaining {
            return if self.finished(targets) { 0.0 } else { remaining };
        }
        targets
            .iter()
            .zip(&self.oscillators)
            .filter(|(target, _)| target.enabled())
            .map(|(_, oscillator)| oscillator.duration.time_remaining())
            .fold(0.0, f32::max)
    }

    pub(crate) fn stop(&mut self, time_remaining: f32) {
        self.stop_remaining = Some(time_remaining.max(0.0));
        for oscillator in &mut self.oscillators {
            oscillator.settled = false;
            oscillator.written = None;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.oscillators.clear();
        self.stop_remaining = None;
    }

    pub(crate) fn resume(&mut self, rng: &mut dyn RandomSource) {
        self.duration.resume(rng);
        self.delay.resume(rng);
        // Rebuilt from the template on the next tick
        self.reset();
    }

    pub(crate) fn save(&self) -> Value {
        let mut object = Map::new();
        object.insert("duration".to_string(), self.duration.save());
        object.insert("delay".to_string(), self.delay.save());
        persist::to_tagged(Self::TAG, &object)
    }

    pub(crate) fn try_load(value: &Value) -> Result<NaturalProgression, LoadError> {
        let duration = match value.get("duration") {
            Some(saved) => Duration::try_load(saved)?,
            None => Duration::default(),
        };
        let delay = match value.get("delay") {
            Some(saved) => Delay::try_load(saved)?,
            None => Delay::default(),
        };
        Ok(Self::new(duration, delay))
    }
}

impl Default for NaturalProgression {
    fn default() -> Self {
        Self::new(Duration::default(), Delay::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_timing::{Movement, RampDuration, RandomDuration, ScriptedRandom};

    const EPS: f32 = 1e-5;

    fn targets() -> Vec<MorphTarget> {
        vec![
            MorphTarget::new("a", Movement::new(0.0, 1.0)),
            MorphTarget::new("b", Movement::new(0.0, 2.0)),
        ]
    }

    #[test]
    fn test_targets_follow_their_own_duration() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets();
        let mut natural = NaturalProgression::new(RandomDuration::new(1.0), Delay::default());

        natural.tick(&mut targets, &mut rng, 0.25);
        assert!((targets[0].value() - 0.5).abs() < EPS);
        assert!((targets[1].value() - 1.0).abs() < EPS);
        assert!(!natural.finished(&targets));
        assert!((natural.time_remaining(&targets) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_oscillation_restarts() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets();
        let mut natural = NaturalProgression::new(RandomDuration::new(1.0), Delay::default());
        for _ in 0..4 {
            natural.tick(&mut targets, &mut rng, 0.25);
        }
        assert!(targets[0].value().abs() < EPS);
        natural.tick(&mut targets, &mut rng, 0.25);
        assert!((targets[0].value() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_halfway_delay_rearms_each_ramp_cycle() {
        let mut rng = ScriptedRandom::new();
        let mut target = MorphTarget::new("a", Movement::new(0.0, 1.0));
        let ramp = Duration::from(RampDuration::new(0.5, 0.2, 2.1, 1.9, 0.5));
        let delay = Delay::new(RandomDuration::new(0.01)).with_triggers(true, false, false);
        let mut oscillator = Oscillator::new(&ramp, &delay, &mut rng);

        let mut activations = 0;
        for _ in 0..300 {
            let was_delaying = oscillator.delay.is_active();
            oscillator.tick(&mut target, &mut rng, 0.01);
            if !was_delaying && oscillator.delay.is_active() {
                activations += 1;
            }
        }
        assert!(activations >= 4);
    }

    #[test]
    fn test_stop_converges_within_grace_period() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets();
        let mut natural = NaturalProgression::new(RandomDuration::new(4.0), Delay::default());
        natural.tick(&mut targets, &mut rng, 1.0);
        assert!((targets[1].value() - 1.0).abs() < EPS);

        natural.stop(0.5);
        natural.tick(&mut targets, &mut rng, 0.25);
        assert!((targets[1].value() - 0.5).abs() < EPS);
        assert!(!natural.finished(&targets));

        natural.tick(&mut targets, &mut rng, 0.25);
        assert_eq!(targets[0].value(), 0.0);
        assert_eq!(targets[1].value(), 0.0);
        assert!(natural.finished(&targets));
        assert_eq!(natural.time_remaining(&targets), 0.0);
    }

    #[test]
    fn test_outside_edit_abandons_convergence() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets();
        let mut natural = NaturalProgression::new(RandomDuration::new(4.0), Delay::default());
        natural.tick(&mut targets, &mut rng, 1.0);

        natural.stop(1.0);
        natural.tick(&mut targets, &mut rng, 0.25);
        targets[1].set_value(3.0);
        natural.tick(&mut targets, &mut rng, 0.25);
        assert_eq!(targets[1].value(), 3.0);
    }

    #[test]
    fn test_resume_restarts_oscillators() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets();
        let mut natural = NaturalProgression::new(RandomDuration::new(1.0), Delay::default());
        natural.tick(&mut targets, &mut rng, 0.25);
        natural.stop(0.0);
        natural.tick(&mut targets, &mut rng, 0.25);
        assert!(natural.finished(&targets));

        natural.resume(&mut rng);
        assert!(!natural.is_stopping());
        natural.tick(&mut targets, &mut rng, 0.25);
        assert!((targets[0].value() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_round_trip() {
        let natural = NaturalProgression::new(
            RandomDuration::with_range(2.0, 0.5, 1.0),
            Delay::new(RandomDuration::new(0.3)).with_triggers(true, false, false),
        );
        let saved = natural.save();
        assert_eq!(saved["type"], "natural");
        let loaded = NaturalProgression::try_load(&saved).unwrap();
        assert_eq!(loaded.save(), saved);
    }
}
