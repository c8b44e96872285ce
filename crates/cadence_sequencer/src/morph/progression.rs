// SPDX-License-Identifier: MIT OR Apache-2.0
//! How a morph modifier spreads one progress value across its targets.

use super::natural::NaturalProgression;
use super::target::MorphTarget;
use cadence_timing::persist::{self, LoadError};
use cadence_timing::{shuffle, Factory, RandomSource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Position inside one target's slice of the overall progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceProgress {
    /// Index into the active order
    pub slice: usize,
    /// Progress within the slice's current half
    pub progress: f32,
    /// Whether the target is moving away from rest
    pub first_half: bool,
}

/// Map a progress value onto `count` consecutive slices.
///
/// With `hold_halfway` each slice spans one `1 / count` of the progress
/// and keeps the direction of the caller, so a forwards pass raises the
/// targets one after another and a backwards pass lowers them.
///
/// Without it a full cycle (forwards then backwards) is divided into
/// `count` slices and each target rises and falls within its own slice.
pub fn map_progress(
    progress: f32,
    forwards: bool,
    count: usize,
    hold_halfway: bool,
) -> Option<SliceProgress> {
    if count == 0 {
        return None;
    }
    let progress = progress.clamp(0.0, 1.0);
    let global = match (hold_halfway, forwards) {
        (true, _) => progress,
        (false, true) => progress / 2.0,
        (false, false) => 0.5 + progress / 2.0,
    };
    let scaled = global * count as f32;
    let slice = (scaled.floor() as usize).min(count - 1);
    let local = (scaled - slice as f32).clamp(0.0, 1.0);

    let mapped = if hold_halfway {
        SliceProgress {
            slice,
            progress: local,
            first_half: forwards,
        }
    } else if local <= 0.5 {
        SliceProgress {
            slice,
            progress: local * 2.0,
            first_half: true,
        }
    } else {
        SliceProgress {
            slice,
            progress: (local - 0.5) * 2.0,
            first_half: false,
        }
    };
    Some(mapped)
}

/// Persisted configuration of an ordered progression
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderedMorphConfig {
    /// Keep each target raised until the backwards pass
    pub hold_halfway: bool,
}

/// Drives one target at a time in a fixed or shuffled order
#[derive(Debug, Clone)]
pub struct OrderedMorph {
    hold_halfway: bool,
    shuffle: bool,
    order: Vec<usize>,
    /// Target being driven and the half it was in
    active: Option<(usize, bool)>,
    last_forwards: Option<bool>,
}

impl OrderedMorph {
    /// Create an ordered progression; `shuffle` reorders every cycle
    pub fn new(hold_halfway: bool, shuffle: bool) -> Self {
        Self {
            hold_halfway,
            shuffle,
            order: Vec::new(),
            active: None,
            last_forwards: None,
        }
    }

    /// Whether targets stay raised until the backwards pass
    pub fn hold_halfway(&self) -> bool {
        self.hold_halfway
    }

    /// Change the halfway hold
    pub fn set_hold_halfway(&mut self, hold_halfway: bool) {
        self.hold_halfway = hold_halfway;
    }

    /// Target indices in the order they are driven
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Target currently driven
    pub fn active(&self) -> Option<usize> {
        self.active.map(|(target, _)| target)
    }

    fn is_stale(&self, targets: &[MorphTarget]) -> bool {
        let enabled = targets.iter().filter(|t| t.enabled()).count();
        enabled != self.order.len()
            || self
                .order
                .iter()
                .any(|&i| !targets.get(i).is_some_and(MorphTarget::enabled))
    }

    fn rebuild(&mut self, targets: &[MorphTarget], rng: &mut dyn RandomSource) {
        self.order = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.enabled())
            .map(|(i, _)| i)
            .collect();
        if self.shuffle {
            shuffle(&mut self.order, rng);
        }
        if self.active.is_some_and(|(i, _)| i >= targets.len()) {
            self.active = None;
        }
    }

    fn tick(
        &mut self,
        targets: &mut [MorphTarget],
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) {
        let new_cycle = self.last_forwards == Some(false) && forwards;
        self.last_forwards = Some(forwards);
        if new_cycle || self.is_stale(targets) {
            self.rebuild(targets, rng);
        }

        let count = self.order.len();
        let Some(mapped) = map_progress(progress, forwards, count, self.hold_halfway) else {
            return;
        };
        let target = self.order[mapped.slice];

        if let Some((previous, previous_half)) = self.active {
            if previous != target {
                // Leave the previous target where its slice ends
                let end_half = self.hold_halfway && previous_half;
                targets[previous].tick(rng, dt, 1.0, end_half);
            }
        }

        targets[target].tick(rng, dt, mapped.progress, mapped.first_half);
        self.active = Some((target, mapped.first_half));
    }

    fn reset(&mut self) {
        self.order.clear();
        self.active = None;
        self.last_forwards = None;
    }

    fn config(&self) -> OrderedMorphConfig {
        OrderedMorphConfig {
            hold_halfway: self.hold_halfway,
        }
    }
}

/// Strategy distributing progress across morph targets
#[derive(Debug, Clone)]
pub enum MorphProgression {
    /// Every target follows the same progress
    Concurrent,
    /// One target at a time, in list order
    Sequential(OrderedMorph),
    /// One target at a time, reshuffled every cycle
    Random(OrderedMorph),
    /// Every target oscillates on its own duration
    Natural(NaturalProgression),
}

impl MorphProgression {
    /// Concurrent tag
    pub const CONCURRENT: &'static str = "concurrent";
    /// Sequential tag
    pub const SEQUENTIAL: &'static str = "sequential";
    /// Random tag
    pub const RANDOM: &'static str = "random";

    /// Sequential progression
    pub fn sequential(hold_halfway: bool) -> Self {
        Self::Sequential(OrderedMorph::new(hold_halfway, false))
    }

    /// Random-order progression
    pub fn random(hold_halfway: bool) -> Self {
        Self::Random(OrderedMorph::new(hold_halfway, true))
    }

    /// Stable type tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Concurrent => Self::CONCURRENT,
            Self::Sequential(_) => Self::SEQUENTIAL,
            Self::Random(_) => Self::RANDOM,
            Self::Natural(_) => NaturalProgression::TAG,
        }
    }

    /// Registry of progression kinds keyed by tag
    pub fn factory() -> Factory<MorphProgression> {
        Factory::new("morph progression")
            .with(Self::CONCURRENT, || MorphProgression::Concurrent)
            .with(Self::SEQUENTIAL, || MorphProgression::sequential(false))
            .with(Self::RANDOM, || MorphProgression::random(false))
            .with(NaturalProgression::TAG, || {
                MorphProgression::Natural(NaturalProgression::default())
            })
    }

    /// Whether target values ignore the step's progress
    pub fn is_independent(&self) -> bool {
        matches!(self, Self::Natural(_))
    }

    /// Drive the targets for one frame
    pub fn tick(
        &mut self,
        targets: &mut [MorphTarget],
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) {
        match self {
            Self::Concurrent => {
                for target in targets.iter_mut().filter(|t| t.enabled()) {
                    target.tick(rng, dt, progress, forwards);
                }
            }
            Self::Sequential(ordered) | Self::Random(ordered) => {
                ordered.tick(targets, rng, dt, progress, forwards);
            }
            Self::Natural(natural) => natural.tick(targets, rng, dt),
        }
    }

    /// Whether the targets are at a point where the step may end
    pub fn finished(&self, targets: &[MorphTarget]) -> bool {
        match self {
            Self::Natural(natural) => natural.finished(targets),
            _ => true,
        }
    }

    /// Time the targets still need
    pub fn time_remaining(&self, targets: &[MorphTarget]) -> f32 {
        match self {
            Self::Natural(natural) => natural.time_remaining(targets),
            _ => 0.0,
        }
    }

    /// Converge within `time_remaining`
    pub fn stop(&mut self, time_remaining: f32) {
        if let Self::Natural(natural) = self {
            natural.stop(time_remaining);
        }
    }

    /// Forget runtime state
    pub fn reset(&mut self) {
        match self {
            Self::Concurrent => {}
            Self::Sequential(ordered) | Self::Random(ordered) => ordered.reset(),
            Self::Natural(natural) => natural.reset(),
        }
    }

    /// Continue after an activation
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        if let Self::Natural(natural) = self {
            natural.resume(rng);
        }
    }

    /// Save configuration with its type tag
    pub fn save(&self) -> Value {
        match self {
            Self::Concurrent => persist::to_tagged(Self::CONCURRENT, &Map::new()),
            Self::Sequential(ordered) | Self::Random(ordered) => {
                persist::to_tagged(self.type_tag(), &ordered.config())
            }
            Self::Natural(natural) => natural.save(),
        }
    }

    /// Load a saved progression
    pub fn try_load(value: &Value) -> Result<MorphProgression, LoadError> {
        let progression = match Self::factory().create(persist::type_tag(value)?)? {
            Self::Concurrent => Self::Concurrent,
            Self::Sequential(_) => {
                let config: OrderedMorphConfig = persist::from_value(value)?;
                Self::sequential(config.hold_halfway)
            }
            Self::Random(_) => {
                let config: OrderedMorphConfig = persist::from_value(value)?;
                Self::random(config.hold_halfway)
            }
            Self::Natural(_) => Self::Natural(NaturalProgression::try_load(value)?),
        };
        Ok(progression)
    }

    /// Load a saved progression, falling back to concurrent on bad data
    pub fn load(value: &Value) -> MorphProgression {
        persist::or_default("morph progression", Self::try_load(value), MorphProgression::default)
    }
}

impl Default for MorphProgression {
    fn default() -> Self {
        Self::Concurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_timing::{Movement, ScriptedRandom, StdRandom};

    const EPS: f32 = 1e-5;

    fn targets(count: usize) -> Vec<MorphTarget> {
        (0..count)
            .map(|i| MorphTarget::new(format!("t{i}"), Movement::new(0.0, 1.0)))
            .collect()
    }

    #[test]
    fn test_map_progress_without_hold() {
        let mapped = map_progress(0.25, true, 2, false).unwrap();
        assert_eq!(mapped.slice, 0);
        assert!((mapped.progress - 0.5).abs() < EPS);
        assert!(mapped.first_half);

        let peak = map_progress(0.5, true, 2, false).unwrap();
        assert_eq!((peak.slice, peak.first_half), (0, true));
        assert!((peak.progress - 1.0).abs() < EPS);

        let falling = map_progress(0.75, true, 2, false).unwrap();
        assert_eq!((falling.slice, falling.first_half), (0, false));
        assert!((falling.progress - 0.5).abs() < EPS);

        let last = map_progress(1.0, false, 2, false).unwrap();
        assert_eq!((last.slice, last.first_half), (1, false));
        assert!((last.progress - 1.0).abs() < EPS);
    }

    #[test]
    fn test_map_progress_with_hold() {
        let mapped = map_progress(0.5, true, 3, true).unwrap();
        assert_eq!(mapped.slice, 1);
        assert!((mapped.progress - 0.5).abs() < EPS);
        assert!(mapped.first_half);

        let end = map_progress(1.0, false, 3, true).unwrap();
        assert_eq!(end.slice, 2);
        assert_eq!(end.progress, 1.0);
        assert!(!end.first_half);

        assert_eq!(map_progress(0.5, true, 0, true), None);
    }

    #[test]
    fn test_concurrent_moves_every_enabled_target() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets(3);
        targets[1].set_enabled(false);
        let mut progression = MorphProgression::Concurrent;
        progression.tick(&mut targets, &mut rng, 0.1, 0.5, true);
        assert_eq!(targets[0].value(), 0.5);
        assert_eq!(targets[1].value(), 0.0);
        assert_eq!(targets[2].value(), 0.5);
    }

    #[test]
    fn test_sequential_finishes_previous_target() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets(2);
        let mut progression = MorphProgression::sequential(false);

        progression.tick(&mut targets, &mut rng, 0.1, 0.5, true);
        assert!((targets[0].value() - 1.0).abs() < EPS);
        assert_eq!(targets[1].value(), 0.0);

        // Backwards half belongs to the second target
        progression.tick(&mut targets, &mut rng, 0.1, 0.5, false);
        assert_eq!(targets[0].value(), 0.0);
        assert!((targets[1].value() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_sequential_hold_keeps_targets_raised() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets(2);
        let mut progression = MorphProgression::sequential(true);

        progression.tick(&mut targets, &mut rng, 0.1, 0.25, true);
        progression.tick(&mut targets, &mut rng, 0.1, 0.75, true);
        assert_eq!(targets[0].value(), 1.0);
        assert!((targets[1].value() - 0.5).abs() < EPS);

        progression.tick(&mut targets, &mut rng, 0.1, 0.25, false);
        assert!((targets[0].value() - 0.5).abs() < EPS);
        progression.tick(&mut targets, &mut rng, 0.1, 0.75, false);
        assert_eq!(targets[0].value(), 0.0);
        assert!((targets[1].value() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_random_order_covers_every_enabled_target() {
        let mut rng = StdRandom::seeded(11);
        let mut targets = targets(4);
        targets[2].set_enabled(false);
        let mut progression = MorphProgression::random(true);
        progression.tick(&mut targets, &mut rng, 0.1, 0.1, true);

        let MorphProgression::Random(ordered) = &progression else {
            panic!("expected random progression");
        };
        let mut order = ordered.order().to_vec();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 3]);
    }

    #[test]
    fn test_disabling_a_target_rebuilds_order() {
        let mut rng = ScriptedRandom::new();
        let mut targets = targets(3);
        let mut progression = MorphProgression::sequential(true);
        progression.tick(&mut targets, &mut rng, 0.1, 0.1, true);
        targets[0].set_enabled(false);
        progression.tick(&mut targets, &mut rng, 0.1, 0.1, true);

        let MorphProgression::Sequential(ordered) = &progression else {
            panic!("expected sequential progression");
        };
        assert_eq!(ordered.order(), &[1, 2]);
        assert_eq!(ordered.active(), Some(1));
    }

    #[test]
    fn test_round_trip() {
        for progression in [
            MorphProgression::Concurrent,
            MorphProgression::sequential(true),
            MorphProgression::random(false),
        ] {
            let saved = progression.save();
            let loaded = MorphProgression::load(&saved);
            assert_eq!(loaded.type_tag(), progression.type_tag());
            assert_eq!(loaded.save(), saved);
        }
    }
}
