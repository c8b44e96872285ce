// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step sequencer for procedural animation.
//!
//! This crate builds on `cadence_timing`:
//! - Steps driving modifiers through a duration, repeat and delay
//! - Progressions scheduling steps sequentially, randomly or concurrently
//! - Morph modifiers blending named weights
//! - A manager owning everything and persisting it as JSON
//!
//! ## Architecture
//!
//! A frame is two passes: [`Manager::tick`] advances all timing and
//! computes modifier values, then [`Manager::set`] commits them to the
//! host. A modifier fault disables its step and leaves the rest running.

pub mod manager;
pub mod modifier;
pub mod morph;
pub mod progression;
pub mod step;

pub use manager::Manager;
pub use modifier::{default_modifier_factory, Modifier, ModifierError, ModifierFactory};
pub use morph::{
    map_progress, MorphModifier, MorphProgression, MorphTarget, MorphTargetConfig,
    NaturalProgression, OrderedMorph, SliceProgress,
};
pub use progression::{OrderedProgression, StepProgression, Steps};
pub use step::{ModifierSlot, Step, StepId};
