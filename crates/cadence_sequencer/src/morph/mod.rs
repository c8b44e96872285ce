// SPDX-License-Identifier: MIT OR Apache-2.0
//! Morph target blending.
//!
//! A [`MorphModifier`] owns named weights ([`MorphTarget`]) and a
//! [`MorphProgression`] deciding which of them the current progress moves.

mod modifier;
mod natural;
mod progression;
mod target;

pub use modifier::MorphModifier;
pub use natural::NaturalProgression;
pub use progression::{
    map_progress, MorphProgression, OrderedMorph, OrderedMorphConfig, SliceProgress,
};
pub use target::{MorphTarget, MorphTargetConfig};
