// SPDX-License-Identifier: MIT OR Apache-2.0
//! Duration whose cycle length ramps between two bounds.
//!
//! A ramp repeatedly runs cycles of length `current`. Over `time_up`
//! seconds the cycle length moves from `minimum` to `maximum`, stays at
//! `maximum` for `hold` seconds, then moves back over `time_down`
//! seconds. The ramp as a whole is the span reported as finished.

use crate::easing::Easing;
use serde::{Deserialize, Serialize};

/// Phase of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    /// Moving from minimum to maximum
    RampingUp,
    /// Staying at maximum
    Holding,
    /// Moving from maximum back to minimum
    RampingDown,
    /// Ramp complete; the next tick starts a new ramp
    Finished,
}

/// Persisted configuration of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RampConfig {
    /// Cycle length at the start and end of the ramp
    pub minimum: f32,
    /// Cycle length while holding
    pub maximum: f32,
    /// Seconds spent ramping up
    pub time_up: f32,
    /// Seconds spent ramping down
    pub time_down: f32,
    /// Seconds spent holding
    pub hold: f32,
    /// Interpolate while ramping up instead of snapping to maximum
    pub ramp_up: bool,
    /// Interpolate while ramping down instead of snapping to minimum
    pub ramp_down: bool,
    /// Curve used to interpolate the cycle length
    pub easing: Easing,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            minimum: 1.0,
            maximum: 0.2,
            time_up: 5.0,
            time_down: 5.0,
            hold: 2.0,
            ramp_up: true,
            ramp_down: true,
            easing: Easing::Linear,
        }
    }
}

/// Asymmetric up/hold/down ramp state machine
#[derive(Debug, Clone)]
pub struct RampDuration {
    config: RampConfig,
    state: RampState,
    /// Time spent in the current cycle
    elapsed: f32,
    /// Position along the active ramp; counts down while ramping down
    total_elapsed: f32,
    holding_elapsed: f32,
    current: f32,
    finished: bool,
    /// Set when a deadline was too short for a full ramp
    starved: bool,
    dirty: bool,
}

impl RampDuration {
    /// Type tag
    pub const TAG: &'static str = "ramp";

    /// Create a ramp with linear easing
    pub fn new(minimum: f32, maximum: f32, time_up: f32, time_down: f32, hold: f32) -> Self {
        Self::from_config(RampConfig {
            minimum,
            maximum,
            time_up,
            time_down,
            hold,
            ..RampConfig::default()
        })
    }

    /// Build from persisted configuration
    pub fn from_config(config: RampConfig) -> Self {
        let mut ramp = Self {
            config,
            state: RampState::RampingUp,
            elapsed: 0.0,
            total_elapsed: 0.0,
            holding_elapsed: 0.0,
            current: 0.0,
            finished: false,
            starved: false,
            dirty: false,
        };
        ramp.restart();
        ramp
    }

    /// Persisted configuration
    pub fn config(&self) -> RampConfig {
        self.config
    }

    /// Replace the configuration; takes effect on the next resume or cycle
    pub fn set_config(&mut self, config: RampConfig) {
        if config != self.config {
            self.config = config;
            self.dirty = true;
        }
    }

    /// Set the easing curve
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.config.easing = easing;
        self.current = self.ramp_value();
        self
    }

    /// Enable or disable interpolation in both directions
    pub fn with_ramps(mut self, ramp_up: bool, ramp_down: bool) -> Self {
        self.config.ramp_up = ramp_up;
        self.config.ramp_down = ramp_down;
        self.restart();
        self
    }

    /// Current phase
    pub fn state(&self) -> RampState {
        self.state
    }

    /// Time spent in the current cycle
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Position along the active ramp phase
    pub fn total_elapsed(&self) -> f32 {
        self.total_elapsed
    }

    /// Time spent holding
    pub fn holding_elapsed(&self) -> f32 {
        self.holding_elapsed
    }

    /// Current cycle length
    pub fn current(&self) -> f32 {
        self.current
    }

    fn up_time(&self) -> f32 {
        if self.config.ramp_up {
            self.config.time_up.max(0.0)
        } else {
            0.0
        }
    }

    fn down_time(&self) -> f32 {
        if self.config.ramp_down {
            self.config.time_down.max(0.0)
        } else {
            0.0
        }
    }

    fn hold_time(&self) -> f32 {
        self.config.hold.max(0.0)
    }

    /// Length of a whole ramp
    pub fn total_time(&self) -> f32 {
        self.up_time() + self.hold_time() + self.down_time()
    }

    fn half(&self) -> f32 {
        self.current / 2.0
    }

    /// Progress through the first half of the current cycle
    pub fn first_half_progress(&self) -> f32 {
        if self.finished {
            return 1.0;
        }
        let half = self.half();
        if half <= 0.0 {
            return 1.0;
        }
        (self.elapsed / half).clamp(0.0, 1.0)
    }

    /// Progress through the second half of the current cycle
    pub fn second_half_progress(&self) -> f32 {
        if self.finished {
            return 1.0;
        }
        let half = self.half();
        if half <= 0.0 {
            return 1.0;
        }
        ((self.elapsed - half) / half).clamp(0.0, 1.0)
    }

    /// Progress through the whole ramp
    pub fn total_progress(&self) -> f32 {
        let total = self.total_time();
        if total <= 0.0 {
            return 1.0;
        }
        (1.0 - self.time_remaining() / total).clamp(0.0, 1.0)
    }

    /// Whether the current cycle has not passed its halfway point
    pub fn in_first_half(&self) -> bool {
        !self.finished && self.elapsed <= self.half()
    }

    /// Whether the ramp is complete
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Time left until the whole ramp completes
    pub fn time_remaining(&self) -> f32 {
        let remaining = match self.state {
            RampState::RampingUp => {
                (self.up_time() - self.total_elapsed) + self.hold_time() + self.down_time()
            }
            RampState::Holding => {
                (self.hold_time() - self.holding_elapsed).max(0.0) + self.down_time()
            }
            RampState::RampingDown => self.total_elapsed,
            RampState::Finished => 0.0,
        };
        remaining.max(0.0)
    }

    /// Time left in the current half cycle
    pub fn time_remaining_in_half(&self) -> f32 {
        if self.finished {
            0.0
        } else if self.in_first_half() {
            (self.half() - self.elapsed).max(0.0)
        } else {
            (self.current - self.elapsed).max(0.0)
        }
    }

    /// Cycle length for the current phase and position
    fn ramp_value(&self) -> f32 {
        match self.state {
            RampState::RampingUp => {
                let up = self.up_time();
                if up > 0.0 {
                    self.interpolate(self.total_elapsed / up)
                } else {
                    self.config.maximum
                }
            }
            RampState::Holding => self.config.maximum,
            RampState::RampingDown => {
                let down = self.down_time();
                if down > 0.0 {
                    self.interpolate(self.total_elapsed / down)
                } else {
                    self.config.minimum
                }
            }
            RampState::Finished => self.config.minimum,
        }
    }

    /// `minimum ± easing(progress) · distance`, heading towards `maximum`
    fn interpolate(&self, progress: f32) -> f32 {
        let RampConfig {
            minimum, maximum, ..
        } = self.config;
        let distance = (maximum - minimum).abs();
        let eased = self.config.easing.apply(progress);
        if maximum >= minimum {
            minimum + eased * distance
        } else {
            minimum - eased * distance
        }
    }

    fn restart(&mut self) {
        self.state = RampState::RampingUp;
        self.elapsed = 0.0;
        self.total_elapsed = 0.0;
        self.holding_elapsed = 0.0;
        self.finished = false;
        self.current = self.ramp_value();
    }

    fn enter_holding(&mut self) {
        self.state = RampState::Holding;
        self.total_elapsed = self.up_time();
        self.holding_elapsed = 0.0;
        self.current = self.ramp_value();
    }

    fn enter_finished(&mut self) {
        self.state = RampState::Finished;
        self.total_elapsed = 0.0;
        self.finished = true;
        self.elapsed = self.current;
    }

    /// Advance the ramp.
    ///
    /// Leftover time carries from one phase into the next, so a single
    /// long tick can walk through several phases.
    pub fn tick(&mut self, dt: f32) {
        if self.starved {
            return;
        }
        if self.state == RampState::Finished {
            self.restart();
        }

        let was_first = self.in_first_half();
        self.elapsed += dt;
        let crossed_half = self.current <= 0.0
            || dt >= self.current
            || (was_first && !self.in_first_half());

        let mut left = dt;

        if self.state == RampState::RampingUp {
            let room = (self.up_time() - self.total_elapsed).max(0.0);
            if left >= room {
                left -= room;
                self.enter_holding();
            } else {
                self.total_elapsed += left;
                left = 0.0;
            }
        }

        if self.state == RampState::Holding {
            self.holding_elapsed += left;
            let hold = self.hold_time();
            if self.holding_elapsed >= hold && crossed_half {
                left = left.min(self.holding_elapsed - hold);
                self.state = RampState::RampingDown;
                self.total_elapsed = self.down_time();
            } else {
                left = 0.0;
            }
        }

        if self.state == RampState::RampingDown {
            self.total_elapsed -= left;
            if self.total_elapsed <= 0.0 {
                self.enter_finished();
                return;
            }
        }

        if self.current > 0.0 && self.elapsed >= self.current {
            self.elapsed = 0.0;
            self.current = self.ramp_value();
        }
    }

    /// Start a new ramp.
    ///
    /// When `max_time` is positive and shorter than a whole ramp, the ramp
    /// is starved: `current` drops to zero and it stays finished until the
    /// next reset without a deadline.
    pub fn reset(&mut self, max_time: f32) {
        self.starved = false;
        self.dirty = false;
        self.restart();
        if max_time > 0.0 && self.total_time() > max_time {
            self.starved = true;
            self.state = RampState::Finished;
            self.finished = true;
            self.current = 0.0;
            self.elapsed = 0.0;
        }
    }

    /// Pick up configuration edits without restarting the ramp
    pub fn resume(&mut self) {
        if self.dirty && !self.starved {
            self.dirty = false;
            self.current = self.ramp_value();
        }
    }

    /// Whether the last deadline was too short for a whole ramp
    pub fn is_starved(&self) -> bool {
        self.starved
    }
}

impl Default for RampDuration {
    fn default() -> Self {
        Self::from_config(RampConfig::default())
    }
}
