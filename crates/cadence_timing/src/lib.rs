// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timing primitives for the Cadence step sequencer.
//!
//! This crate provides the leaf layer of the sequencer:
//! - Easing curves (progress to magnitude)
//! - Randomized scalars re-rolled on a fixed interval
//! - Durations: randomized spans and asymmetric ramps
//! - Movements between two randomized bounds
//! - Delays injected at halfway and end points
//!
//! ## Architecture
//!
//! Everything here is frame-driven and single-threaded. Owners call
//! `tick(dt)` once per frame and read derived progress afterwards.
//! Operations that may re-roll a random value take an explicit
//! [`RandomSource`] so hosts and tests choose the provider.

pub mod delay;
pub mod duration;
pub mod easing;
pub mod factory;
pub mod movement;
pub mod persist;
pub mod random;
pub mod randomizable;

pub use delay::{Delay, DelayTriggers};
pub use duration::{Duration, RampConfig, RampDuration, RampState, RandomDuration};
pub use easing::Easing;
pub use factory::{Factory, FactoryError};
pub use movement::{Movement, MovementConfig};
pub use persist::LoadError;
pub use random::{shuffle, RandomSource, ScriptedRandom, StdRandom};
pub use randomizable::{
    Randomizable, RandomizableConfig, RandomizableFloat, RandomizableTime, RandomizableValue,
    INTERVAL_EPSILON,
};
