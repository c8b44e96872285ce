// SPDX-License-Identifier: MIT OR Apache-2.0
//! Steps: the schedulable unit of the sequencer.
//!
//! A step owns a duration, a repeat timer, a delay and an ordered list of
//! modifiers. Each frame it advances its duration and feeds the progress
//! of the current half to every enabled modifier.
//!
//! ## Activation
//!
//! - Full move: the duration runs forwards through its first half and
//!   backwards through its second half, repeating until the repeat timer
//!   runs out. The activation ends once every modifier has finished.
//! - Half move: once the repeat timer has run out, activations alternate
//!   between the forwards half and the backwards half, so a sequential
//!   progression raises each step in turn and lowers them on the way back.

use crate::modifier::{Modifier, ModifierError, ModifierFactory};
use cadence_timing::persist::{self, LoadError};
use cadence_timing::{Delay, Duration, RandomSource, RandomizableConfig, RandomizableTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Unique identifier for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub Uuid);

impl StepId {
    /// Create a new random step ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

/// A modifier owned by a step
#[derive(Debug)]
pub struct ModifierSlot {
    /// Display name
    pub name: String,
    enabled: bool,
    modifier: Box<dyn Modifier>,
}

impl ModifierSlot {
    /// Whether the step drives this modifier
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The modifier
    pub fn modifier(&self) -> &dyn Modifier {
        self.modifier.as_ref()
    }

    /// Mutable modifier
    pub fn modifier_mut(&mut self) -> &mut dyn Modifier {
        self.modifier.as_mut()
    }
}

/// Which kind of activation end is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Full,
    HalfForward,
    HalfBackward,
}

/// Grace period granted to modifiers that are not finished yet
#[derive(Debug, Clone, Copy)]
struct Wait {
    modifier: usize,
    grace_period: f32,
    ending: Ending,
}

/// Persisted scalar settings of a step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StepConfig {
    name: String,
    enabled: bool,
    half_move: bool,
    repeat: RandomizableConfig<f32>,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            name: "Step".to_string(),
            enabled: true,
            half_move: false,
            repeat: RandomizableConfig::default(),
        }
    }
}

/// A schedulable unit driving a list of modifiers
#[derive(Debug)]
pub struct Step {
    /// Unique step ID
    pub id: StepId,
    /// Step name
    pub name: String,
    enabled: bool,
    half_move: bool,
    duration: Duration,
    repeat: RandomizableTime,
    delay: Delay,
    modifiers: Vec<ModifierSlot>,
    /// Indices of enabled modifiers, refreshed on structural change
    enabled_modifiers: Vec<usize>,
    in_first_half: bool,
    half_forward_next: bool,
    progress: f32,
    forwards: bool,
    wait: Option<Wait>,
}

impl Step {
    /// Create a step with a one second duration and no repeat
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StepId::new(),
            name: name.into(),
            enabled: true,
            half_move: false,
            duration: Duration::default(),
            repeat: RandomizableTime::fixed(0.0),
            delay: Delay::default(),
            modifiers: Vec::new(),
            enabled_modifiers: Vec::new(),
            in_first_half: true,
            half_forward_next: true,
            progress: 0.0,
            forwards: true,
            wait: None,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: impl Into<Duration>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Set the repeat timer
    pub fn with_repeat(mut self, repeat: RandomizableTime) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the delay
    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    /// Enable half moves
    pub fn with_half_move(mut self, half_move: bool) -> Self {
        self.half_move = half_move;
        self
    }

    /// Add a modifier
    pub fn with_modifier(mut self, name: impl Into<String>, modifier: Box<dyn Modifier>) -> Self {
        self.add_modifier(name, modifier);
        self
    }

    /// Whether the step is scheduled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the step
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether activations are half moves
    pub fn half_move(&self) -> bool {
        self.half_move
    }

    /// Enable or disable half moves
    pub fn set_half_move(&mut self, half_move: bool) {
        self.half_move = half_move;
    }

    /// Main duration
    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    /// Mutable main duration
    pub fn duration_mut(&mut self) -> &mut Duration {
        &mut self.duration
    }

    /// Replace the main duration, handing back the previous one
    pub fn set_duration(&mut self, duration: Duration) -> Duration {
        std::mem::replace(&mut self.duration, duration)
    }

    /// Repeat timer
    pub fn repeat(&self) -> &RandomizableTime {
        &self.repeat
    }

    /// Mutable repeat timer
    pub fn repeat_mut(&mut self) -> &mut RandomizableTime {
        &mut self.repeat
    }

    /// Delay
    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    /// Mutable delay
    pub fn delay_mut(&mut self) -> &mut Delay {
        &mut self.delay
    }

    /// Replace the delay, handing back the previous one
    pub fn set_delay(&mut self, delay: Delay) -> Delay {
        std::mem::replace(&mut self.delay, delay)
    }

    /// All modifier slots in order
    pub fn modifiers(&self) -> &[ModifierSlot] {
        &self.modifiers
    }

    /// Mutable modifier slot
    pub fn modifier_mut(&mut self, index: usize) -> Option<&mut ModifierSlot> {
        self.modifiers.get_mut(index)
    }

    /// Indices of enabled modifiers
    pub fn enabled_modifiers(&self) -> &[usize] {
        &self.enabled_modifiers
    }

    /// Append a modifier, returning its index
    pub fn add_modifier(&mut self, name: impl Into<String>, modifier: Box<dyn Modifier>) -> usize {
        self.modifiers.push(ModifierSlot {
            name: name.into(),
            enabled: true,
            modifier,
        });
        self.refresh_enabled_modifiers();
        self.modifiers.len() - 1
    }

    /// Detach a modifier and hand it back
    pub fn remove_modifier(&mut self, index: usize) -> Option<Box<dyn Modifier>> {
        if index >= self.modifiers.len() {
            return None;
        }
        self.modifiers[index].modifier.about_to_be_removed();
        let mut slot = self.modifiers.remove(index);
        slot.modifier.removed();
        self.wait = None;
        self.refresh_enabled_modifiers();
        Some(slot.modifier)
    }

    /// Enable or disable a modifier
    pub fn set_modifier_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.modifiers.get_mut(index) {
            if slot.enabled != enabled {
                slot.enabled = enabled;
                self.wait = None;
                self.refresh_enabled_modifiers();
            }
        }
    }

    fn refresh_enabled_modifiers(&mut self) {
        self.enabled_modifiers = self
            .modifiers
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.enabled)
            .map(|(i, _)| i)
            .collect();
    }

    /// Progress last fed to the modifiers
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Direction last fed to the modifiers
    pub fn forwards(&self) -> bool {
        self.forwards
    }

    /// Whether the delay is holding the step
    pub fn is_delaying(&self) -> bool {
        self.delay.is_active()
    }

    /// Modifier the step is granting a grace period to
    pub fn waiting_for(&self) -> Option<usize> {
        self.wait.map(|w| w.modifier)
    }

    /// Grace period left, zero when not waiting
    pub fn grace_period(&self) -> f32 {
        self.wait.map_or(0.0, |w| w.grace_period)
    }

    /// Advance the step.
    ///
    /// Returns `false` when the activation is complete and the scheduler
    /// should move on, `true` while it is still running. A modifier fault
    /// disables the step and ends the activation.
    pub fn tick(&mut self, rng: &mut dyn RandomSource, dt: f32, step_forwards: bool) -> bool {
        if !self.enabled {
            return false;
        }
        match self.try_tick(rng, dt, step_forwards) {
            Ok(running) => running,
            Err(e) => {
                self.fault(&e);
                false
            }
        }
    }

    fn try_tick(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        step_forwards: bool,
    ) -> Result<bool, ModifierError> {
        if self.delay.is_active() {
            return self.tick_delay(rng, dt);
        }
        if self.wait.is_some() {
            return self.tick_waiting(rng, dt);
        }
        if self.half_move && self.repeat.finished() {
            self.tick_half_move(rng, dt, step_forwards)
        } else {
            self.tick_full_move(rng, dt)
        }
    }

    fn tick_delay(&mut self, rng: &mut dyn RandomSource, dt: f32) -> Result<bool, ModifierError> {
        let ended = self.delay.tick(dt);
        let (progress, forwards) = (self.progress, self.forwards);
        for &i in &self.enabled_modifiers {
            self.modifiers[i]
                .modifier
                .tick_delayed(rng, dt, progress, forwards)?;
        }

        if ended {
            tracing::debug!(step = %self.name, "Delay ended");
            if self.delay.reset_duration_after() {
                self.end_activation(rng);
            }
            if self.delay.stop_after() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn tick_full_move(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
    ) -> Result<bool, ModifierError> {
        // A halfway delay armed on the final tick leaves the duration finished
        if !self.duration.finished() {
            self.duration.tick(dt);
        }
        self.repeat.tick(dt);

        let (progress, forwards) = self.duration.half_progress();
        self.feed(rng, dt, progress, forwards)?;

        // Ramps run several cycles per activation, each with its own halfway
        if self.in_first_half != forwards {
            self.in_first_half = forwards;
            let triggers = self.delay.triggers;
            if !forwards && (triggers.halfway || triggers.end_forwards) {
                tracing::debug!(step = %self.name, "Halfway delay");
                self.delay.activate(false, false, rng);
                return Ok(true);
            }
        }

        if !self.duration.finished() {
            return Ok(true);
        }

        if !self.repeat.finished() {
            self.duration.reset(0.0, rng);
            self.in_first_half = true;
            if self.delay.triggers.end_backwards {
                self.delay.activate(false, false, rng);
            }
            return Ok(true);
        }

        self.begin_ending(rng, Ending::Full)
    }

    fn tick_half_move(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        step_forwards: bool,
    ) -> Result<bool, ModifierError> {
        if self.half_forward_next {
            if !step_forwards && self.duration.elapsed() <= 0.0 {
                // At rest already, nothing to bring back
                return Ok(false);
            }

            self.duration.tick(dt);
            let progress = self.duration.first_half_progress();
            self.feed(rng, dt, progress, true)?;
            if progress < 1.0 {
                return Ok(true);
            }

            self.half_forward_next = false;
            self.in_first_half = false;
            self.complete(rng, Ending::HalfForward)
        } else {
            self.duration.tick(dt);
            let progress = self.duration.second_half_progress();
            self.feed(rng, dt, progress, false)?;
            if !self.duration.finished() {
                return Ok(true);
            }

            self.half_forward_next = true;
            self.begin_ending(rng, Ending::HalfBackward)
        }
    }

    fn tick_waiting(&mut self, rng: &mut dyn RandomSource, dt: f32) -> Result<bool, ModifierError> {
        let (progress, forwards) = (self.progress, self.forwards);
        self.feed(rng, dt, progress, forwards)?;

        let Some(wait) = self.wait.as_mut() else {
            return Ok(true);
        };
        wait.grace_period -= dt;
        let expired = wait.grace_period <= 0.0;
        let ending = wait.ending;

        let settled = self.enabled_modifiers.iter().all(|&i| {
            let modifier = &self.modifiers[i].modifier;
            modifier.finished() || modifier.time_remaining() <= 0.0
        });

        if settled || expired {
            tracing::debug!(step = %self.name, expired, "Grace period over");
            self.wait = None;
            return self.complete(rng, ending);
        }
        Ok(true)
    }

    fn feed(
        &mut self,
        rng: &mut dyn RandomSource,
        dt: f32,
        progress: f32,
        forwards: bool,
    ) -> Result<(), ModifierError> {
        self.progress = progress;
        self.forwards = forwards;
        for &i in &self.enabled_modifiers {
            self.modifiers[i].modifier.tick(rng, dt, progress, forwards)?;
        }
        Ok(())
    }

    fn begin_ending(
        &mut self,
        rng: &mut dyn RandomSource,
        ending: Ending,
    ) -> Result<bool, ModifierError> {
        if let Some((modifier, grace_period)) = self.has_unfinished_modifiers() {
            tracing::debug!(
                step = %self.name,
                modifier,
                grace_period,
                "Waiting for modifier"
            );
            self.wait = Some(Wait {
                modifier,
                grace_period,
                ending,
            });
            return Ok(true);
        }
        self.complete(rng, ending)
    }

    /// Find the enabled modifier needing the most time and ask every
    /// enabled modifier to stop within that time.
    ///
    /// Returns the modifier index and the grace period, or `None` when no
    /// unfinished modifier needs more time.
    pub fn has_unfinished_modifiers(&mut self) -> Option<(usize, f32)> {
        let mut longest: Option<(usize, f32)> = None;
        for &i in &self.enabled_modifiers {
            let modifier = &self.modifiers[i].modifier;
            if modifier.finished() {
                continue;
            }
            let remaining = modifier.time_remaining();
            if remaining > 0.0 && longest.map_or(true, |(_, r)| remaining > r) {
                longest = Some((i, remaining));
            }
        }

        let (_, grace_period) = longest?;
        for &i in &self.enabled_modifiers {
            self.modifiers[i].modifier.stop(grace_period);
        }
        longest
    }

    fn complete(
        &mut self,
        rng: &mut dyn RandomSource,
        ending: Ending,
    ) -> Result<bool, ModifierError> {
        let triggers = self.delay.triggers;
        match ending {
            Ending::Full => {
                if triggers.end_backwards {
                    self.delay.activate(true, true, rng);
                    return Ok(true);
                }
                self.end_activation(rng);
            }
            Ending::HalfForward => {
                if triggers.halfway || triggers.end_forwards {
                    self.delay.activate(true, false, rng);
                    return Ok(true);
                }
            }
            Ending::HalfBackward => {
                if triggers.end_backwards {
                    self.delay.activate(true, true, rng);
                    return Ok(true);
                }
                self.end_activation(rng);
            }
        }
        tracing::debug!(step = %self.name, ?ending, "Activation complete");
        Ok(false)
    }

    fn end_activation(&mut self, rng: &mut dyn RandomSource) {
        self.duration.reset(0.0, rng);
        self.repeat.reset(false, rng);
        self.in_first_half = true;
        self.half_forward_next = true;
        self.wait = None;
        for &i in &self.enabled_modifiers {
            self.modifiers[i].modifier.resume(rng);
        }
    }

    fn fault(&mut self, error: &ModifierError) {
        tracing::error!(step = %self.name, "Modifier faulted, disabling step: {error}");
        self.enabled = false;
        self.wait = None;
    }

    /// Advance while another step is current; modifiers hold their values
    pub fn tick_paused(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }
        let result = self
            .enabled_modifiers
            .iter()
            .try_for_each(|&i| self.modifiers[i].modifier.tick_paused(dt));
        if let Err(e) = result {
            self.fault(&e);
        }
    }

    /// Apply modifier values to the host
    pub fn set(&mut self, paused: bool) {
        if !self.enabled {
            return;
        }
        let mut result = Ok(());
        for &i in &self.enabled_modifiers {
            result = self.modifiers[i].modifier.set(paused);
            if result.is_err() {
                break;
            }
        }
        if let Err(e) = result {
            self.fault(&e);
        }
    }

    /// Return to rest, forcing new random values and aborting any delay
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.duration.reset(0.0, rng);
        self.repeat.reset(true, rng);
        self.delay.reset(rng);
        self.in_first_half = true;
        self.half_forward_next = true;
        self.progress = 0.0;
        self.forwards = true;
        self.wait = None;
        for slot in &mut self.modifiers {
            slot.modifier.reset(rng);
        }
    }

    /// Continue after an activation, picking up configuration edits
    pub fn resume(&mut self, rng: &mut dyn RandomSource) {
        self.duration.resume(rng);
        self.repeat.resume(rng);
        self.delay.resume(rng);
        for &i in &self.enabled_modifiers {
            self.modifiers[i].modifier.resume(rng);
        }
    }

    /// The owner is about to drop this step
    pub fn about_to_be_removed(&mut self) {
        for slot in &mut self.modifiers {
            slot.modifier.about_to_be_removed();
        }
    }

    /// The owner dropped this step
    pub fn removed(&mut self) {
        for slot in &mut self.modifiers {
            slot.modifier.removed();
        }
        self.wait = None;
    }

    /// Save configuration and children
    pub fn save(&self) -> Value {
        let config = StepConfig {
            name: self.name.clone(),
            enabled: self.enabled,
            half_move: self.half_move,
            repeat: self.repeat.config(),
        };
        let mut value = persist::to_value(&config);
        if let Value::Object(object) = &mut value {
            object.insert("duration".to_string(), self.duration.save());
            object.insert("delay".to_string(), self.delay.save());
            let modifiers = self
                .modifiers
                .iter()
                .map(|slot| {
                    json!({
                        "name": slot.name,
                        "enabled": slot.enabled,
                        "modifier": slot.modifier.save(),
                    })
                })
                .collect();
            object.insert("modifiers".to_string(), Value::Array(modifiers));
        }
        value
    }

    /// Load a saved step, logging and skipping anything malformed
    pub fn load(value: &Value, factory: &ModifierFactory) -> Step {
        let config = persist::or_default(
            "step",
            persist::from_value::<StepConfig>(value),
            StepConfig::default,
        );
        let mut step = Step::new(config.name)
            .with_half_move(config.half_move)
            .with_repeat(RandomizableTime::from_config(config.repeat));
        step.enabled = config.enabled;

        if let Some(saved) = value.get("duration") {
            step.duration = Duration::load(saved);
        }
        if let Some(saved) = value.get("delay") {
            step.delay = Delay::load(saved);
        }

        let saved_modifiers = value
            .get("modifiers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for saved in saved_modifiers {
            match Self::load_modifier(saved, factory) {
                Ok((name, enabled, modifier)) => {
                    let index = step.add_modifier(name, modifier);
                    step.set_modifier_enabled(index, enabled);
                }
                Err(e) => {
                    tracing::warn!(step = %step.name, "Skipping modifier that failed to load: {e}");
                }
            }
        }
        step
    }

    fn load_modifier(
        saved: &Value,
        factory: &ModifierFactory,
    ) -> Result<(String, bool, Box<dyn Modifier>), LoadError> {
        let name = persist::field::<String>(saved, "name")?
            .unwrap_or_else(|| "Modifier".to_string());
        let enabled = persist::field::<bool>(saved, "enabled")?.unwrap_or(true);
        let body = saved.get("modifier").ok_or(LoadError::MissingType)?;
        let mut modifier = factory.create(persist::type_tag(body)?)?;
        modifier.load(body);
        Ok((name, enabled, modifier))
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new("Step")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cadence_timing::{RampDuration, RandomDuration, ScriptedRandom};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Everything a recorder modifier observed
    #[derive(Debug, Default)]
    pub(crate) struct RecorderLog {
        pub ticks: Vec<(f32, bool)>,
        pub paused_ticks: usize,
        pub delayed_ticks: usize,
        pub sets: usize,
        pub stops: Vec<f32>,
        pub resets: usize,
        pub resumes: usize,
        pub removed: bool,
    }

    /// Modifier recording its calls, optionally with its own timing
    #[derive(Debug)]
    pub(crate) struct Recorder {
        pub log: Rc<RefCell<RecorderLog>>,
        /// Time this recorder still needs before it is finished
        pub remaining: f32,
        /// Fail on this tick number
        pub fail_on: Option<usize>,
    }

    impl Recorder {
        pub fn new() -> (Self, Rc<RefCell<RecorderLog>>) {
            let log = Rc::new(RefCell::new(RecorderLog::default()));
            (
                Self {
                    log: Rc::clone(&log),
                    remaining: 0.0,
                    fail_on: None,
                },
                log,
            )
        }
    }

    impl Modifier for Recorder {
        fn type_tag(&self) -> &'static str {
            "recorder"
        }

        fn tick(
            &mut self,
            _rng: &mut dyn RandomSource,
            dt: f32,
            progress: f32,
            forwards: bool,
        ) -> Result<(), ModifierError> {
            let mut log = self.log.borrow_mut();
            log.ticks.push((progress, forwards));
            if self.fail_on == Some(log.ticks.len()) {
                return Err(ModifierError::Custom("recorder failure".to_string()));
            }
            self.remaining = (self.remaining - dt).max(0.0);
            Ok(())
        }

        fn tick_paused(&mut self, _dt: f32) -> Result<(), ModifierError> {
            self.log.borrow_mut().paused_ticks += 1;
            Ok(())
        }

        fn tick_delayed(
            &mut self,
            _rng: &mut dyn RandomSource,
            _dt: f32,
            _progress: f32,
            _forwards: bool,
        ) -> Result<(), ModifierError> {
            self.log.borrow_mut().delayed_ticks += 1;
            Ok(())
        }

        fn set(&mut self, _paused: bool) -> Result<(), ModifierError> {
            self.log.borrow_mut().sets += 1;
            Ok(())
        }

        fn reset(&mut self, _rng: &mut dyn RandomSource) {
            self.log.borrow_mut().resets += 1;
        }

        fn resume(&mut self, _rng: &mut dyn RandomSource) {
            self.log.borrow_mut().resumes += 1;
        }

        fn stop(&mut self, time_remaining: f32) {
            self.log.borrow_mut().stops.push(time_remaining);
        }

        fn finished(&self) -> bool {
            self.remaining <= 0.0
        }

        fn time_remaining(&self) -> f32 {
            self.remaining
        }

        fn removed(&mut self) {
            self.log.borrow_mut().removed = true;
        }

        fn save(&self) -> Value {
            json!({ "type": "recorder" })
        }

        fn load(&mut self, _value: &Value) {}
    }

    fn one_second_step() -> Step {
        Step::new("test").with_duration(RandomDuration::new(1.0))
    }

    /// Tick until the step reports completion, returning the tick count
    fn run_until_done(
        step: &mut Step,
        rng: &mut ScriptedRandom,
        dt: f32,
        limit: usize,
    ) -> Option<usize> {
        (1..=limit).find(|_| !step.tick(rng, dt, true))
    }

    #[test]
    fn test_full_move_feeds_both_halves() {
        let mut rng = ScriptedRandom::new();
        let (recorder, log) = Recorder::new();
        let mut step = one_second_step().with_modifier("recorder", Box::new(recorder));

        let done = run_until_done(&mut step, &mut rng, 0.25, 10);
        assert_eq!(done, Some(4));

        let ticks = &log.borrow().ticks;
        assert_eq!(ticks[0], (0.5, true));
        assert_eq!(ticks[1], (1.0, true));
        assert_eq!(ticks[2], (0.5, false));
        assert_eq!(ticks[3], (1.0, false));
    }

    #[test]
    fn test_completes_once_per_cycle() {
        let mut rng = ScriptedRandom::new();
        let mut step = one_second_step();
        let completions = (0..40).filter(|_| !step.tick(&mut rng, 0.25, true)).count();
        assert_eq!(completions, 10);
    }

    #[test]
    fn test_repeat_extends_activation() {
        let mut rng = ScriptedRandom::new();
        let mut step = one_second_step().with_repeat(RandomizableTime::fixed(2.5));
        let done = run_until_done(&mut step, &mut rng, 0.25, 40);
        // Two full cycles leave repeat unfinished, the third ends it
        assert_eq!(done, Some(12));
    }

    #[test]
    fn test_halfway_delay_freezes_progress() {
        let mut rng = ScriptedRandom::new();
        let (recorder, log) = Recorder::new();
        let delay = Delay::new(RandomDuration::new(0.5)).with_triggers(true, false, false);
        let mut step = one_second_step()
            .with_delay(delay)
            .with_modifier("recorder", Box::new(recorder));

        // 0.25, 0.5, then 0.75 crosses halfway and arms the delay
        for _ in 0..3 {
            assert!(step.tick(&mut rng, 0.25, true));
        }
        assert!(step.is_delaying());
        let elapsed = step.duration().elapsed();

        assert!(step.tick(&mut rng, 0.25, true));
        assert!(step.tick(&mut rng, 0.25, true));
        assert!(!step.is_delaying());
        assert_eq!(step.duration().elapsed(), elapsed);
        assert_eq!(log.borrow().delayed_ticks, 2);

        // Normal progress resumes where it stopped
        assert!(!step.tick(&mut rng, 0.25, true));
    }

    #[test]
    fn test_halfway_delay_arms_on_every_ramp_cycle() {
        let mut rng = ScriptedRandom::new();
        let (recorder, log) = Recorder::new();
        let delay = Delay::new(RandomDuration::new(0.01)).with_triggers(true, false, false);
        let mut step = Step::new("ramp")
            .with_duration(RampDuration::new(0.5, 0.2, 2.1, 1.9, 0.5))
            .with_delay(delay)
            .with_modifier("recorder", Box::new(recorder));

        let mut activations = 0;
        let mut done = false;
        for _ in 0..1000 {
            let was_delaying = step.is_delaying();
            let running = step.tick(&mut rng, 0.01, true);
            if !was_delaying && step.is_delaying() {
                activations += 1;
            }
            if !running {
                done = true;
                break;
            }
        }
        assert!(done);

        let crossings = log
            .borrow()
            .ticks
            .windows(2)
            .filter(|pair| pair[0].1 && !pair[1].1)
            .count();
        assert!(crossings >= 4);
        assert_eq!(activations, crossings);
    }

    #[test]
    fn test_end_forwards_delay_in_full_move() {
        let mut rng = ScriptedRandom::new();
        let (recorder, log) = Recorder::new();
        let delay = Delay::new(RandomDuration::new(0.5)).with_triggers(false, true, false);
        let mut step = one_second_step()
            .with_delay(delay)
            .with_modifier("recorder", Box::new(recorder));

        // The forwards half completes on the third tick
        for _ in 0..3 {
            assert!(step.tick(&mut rng, 0.25, true));
        }
        assert!(step.is_delaying());
        assert!(step.tick(&mut rng, 0.25, true));
        assert!(step.tick(&mut rng, 0.25, true));
        assert_eq!(log.borrow().delayed_ticks, 2);
        assert!(!step.tick(&mut rng, 0.25, true));
    }

    #[test]
    fn test_end_delay_stops_after() {
        let mut rng = ScriptedRandom::new();
        let delay = Delay::new(RandomDuration::new(0.5)).with_triggers(false, false, true);
        let mut step = one_second_step().with_delay(delay);

        let done = run_until_done(&mut step, &mut rng, 0.25, 20);
        // Four ticks of movement, then two ticks of delay
        assert_eq!(done, Some(6));
        assert_eq!(step.duration().elapsed(), 0.0);
    }

    #[test]
    fn test_half_move_alternates() {
        let mut rng = ScriptedRandom::new();
        let (recorder, log) = Recorder::new();
        let mut step = one_second_step()
            .with_half_move(true)
            .with_modifier("recorder", Box::new(recorder));

        assert_eq!(run_until_done(&mut step, &mut rng, 0.25, 10), Some(2));
        assert!(log.borrow().ticks.iter().all(|&(_, forwards)| forwards));
        assert_eq!(log.borrow().ticks.last(), Some(&(1.0, true)));

        log.borrow_mut().ticks.clear();
        let backwards_done = (1..=10).find(|_| !step.tick(&mut rng, 0.25, false));
        assert_eq!(backwards_done, Some(2));
        assert!(log.borrow().ticks.iter().all(|&(_, forwards)| !forwards));
        assert_eq!(step.duration().elapsed(), 0.0);
    }

    #[test]
    fn test_half_move_at_rest_skips_backwards() {
        let mut rng = ScriptedRandom::new();
        let mut step = one_second_step().with_half_move(true);
        assert!(!step.tick(&mut rng, 0.25, false));
        assert_eq!(step.duration().elapsed(), 0.0);
    }

    #[test]
    fn test_waits_for_slowest_modifier() {
        let mut rng = ScriptedRandom::new();
        let (mut slow, slow_log) = Recorder::new();
        slow.remaining = 1.5;
        let (mut slower, slower_log) = Recorder::new();
        slower.remaining = 2.0;
        let mut step = one_second_step()
            .with_modifier("slow", Box::new(slow))
            .with_modifier("slower", Box::new(slower));

        for _ in 0..4 {
            assert!(step.tick(&mut rng, 0.25, true));
        }
        assert_eq!(step.waiting_for(), Some(1));
        assert_eq!(step.grace_period(), 1.0);
        assert_eq!(slow_log.borrow().stops, vec![1.0]);
        assert_eq!(slower_log.borrow().stops, vec![1.0]);

        let done = run_until_done(&mut step, &mut rng, 0.25, 10);
        assert_eq!(done, Some(4));
        assert_eq!(step.waiting_for(), None);
    }

    #[test]
    fn test_finished_modifiers_do_not_hold_the_step() {
        let mut rng = ScriptedRandom::new();
        let (recorder, log) = Recorder::new();
        let mut step = one_second_step().with_modifier("recorder", Box::new(recorder));
        assert_eq!(run_until_done(&mut step, &mut rng, 0.25, 10), Some(4));
        assert!(log.borrow().stops.is_empty());
    }

    #[test]
    fn test_fault_disables_step() {
        let mut rng = ScriptedRandom::new();
        let (mut recorder, _log) = Recorder::new();
        recorder.fail_on = Some(2);
        let mut step = one_second_step().with_modifier("recorder", Box::new(recorder));

        assert!(step.tick(&mut rng, 0.25, true));
        assert!(!step.tick(&mut rng, 0.25, true));
        assert!(!step.enabled());
        assert!(!step.tick(&mut rng, 0.25, true));
    }

    #[test]
    fn test_enabled_cache_follows_toggles() {
        let (a, a_log) = Recorder::new();
        let (b, _) = Recorder::new();
        let mut step = one_second_step()
            .with_modifier("a", Box::new(a))
            .with_modifier("b", Box::new(b));
        assert_eq!(step.enabled_modifiers(), &[0, 1]);

        step.set_modifier_enabled(0, false);
        assert_eq!(step.enabled_modifiers(), &[1]);

        let mut rng = ScriptedRandom::new();
        step.tick(&mut rng, 0.1, true);
        assert!(a_log.borrow().ticks.is_empty());

        let removed = step.remove_modifier(0);
        assert!(removed.is_some());
        assert!(a_log.borrow().removed);
        assert_eq!(step.enabled_modifiers(), &[0]);
    }

    #[test]
    fn test_paused_and_set_reach_modifiers() {
        let (recorder, log) = Recorder::new();
        let mut step = one_second_step().with_modifier("recorder", Box::new(recorder));
        step.tick_paused(0.1);
        step.set(false);
        assert_eq!(log.borrow().paused_ticks, 1);
        assert_eq!(log.borrow().sets, 1);
    }

    #[test]
    fn test_set_duration_hands_back_previous() {
        let mut step = one_second_step();
        let previous = step.set_duration(Duration::from(RandomDuration::new(3.0)));
        assert_eq!(previous.current(), 1.0);
        assert_eq!(step.duration().current(), 3.0);
    }

    #[test]
    fn test_reset_aborts_delay() {
        let mut rng = ScriptedRandom::new();
        let delay = Delay::new(RandomDuration::new(5.0)).with_triggers(true, false, false);
        let mut step = one_second_step().with_delay(delay);
        for _ in 0..3 {
            step.tick(&mut rng, 0.25, true);
        }
        assert!(step.is_delaying());
        step.reset(&mut rng);
        assert!(!step.is_delaying());
        assert_eq!(step.duration().elapsed(), 0.0);
    }

    #[test]
    fn test_round_trip_skips_unknown_modifiers() {
        let (recorder, _) = Recorder::new();
        let step = Step::new("saved")
            .with_half_move(true)
            .with_repeat(RandomizableTime::new(2.0, 1.0, 0.0))
            .with_modifier("recorder", Box::new(recorder));
        let saved = step.save();

        let factory = crate::modifier::default_modifier_factory();
        let loaded = Step::load(&saved, &factory);
        assert_eq!(loaded.name, "saved");
        assert!(loaded.half_move());
        assert_eq!(loaded.repeat().config(), step.repeat().config());
        assert_eq!(loaded.duration().save(), step.duration().save());
        // "recorder" is not registered in the default factory
        assert!(loaded.modifiers().is_empty());
    }
}
