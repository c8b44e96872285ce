// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves mapping linear progress to eased magnitude.

use crate::factory::Factory;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Easing curve.
///
/// Every curve maps `0 -> 0` and `1 -> 1`; Back and Elastic overshoot in
/// between. Input outside `[0, 1]` is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum Easing {
    #[default]
    Linear,
    SineIn,
    SineOut,
    SineInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    CircIn,
    CircOut,
    CircInOut,
    BackIn,
    BackOut,
    BackInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

impl Easing {
    /// Every curve, in registry order
    pub const ALL: [Easing; 31] = [
        Easing::Linear,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::QuintIn,
        Easing::QuintOut,
        Easing::QuintInOut,
        Easing::ExpoIn,
        Easing::ExpoOut,
        Easing::ExpoInOut,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::ElasticInOut,
        Easing::BounceIn,
        Easing::BounceOut,
        Easing::BounceInOut,
    ];

    /// Stable type tag used for persistence
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::SineIn => "sineIn",
            Self::SineOut => "sineOut",
            Self::SineInOut => "sineInOut",
            Self::QuadIn => "quadIn",
            Self::QuadOut => "quadOut",
            Self::QuadInOut => "quadInOut",
            Self::CubicIn => "cubicIn",
            Self::CubicOut => "cubicOut",
            Self::CubicInOut => "cubicInOut",
            Self::QuartIn => "quartIn",
            Self::QuartOut => "quartOut",
            Self::QuartInOut => "quartInOut",
            Self::QuintIn => "quintIn",
            Self::QuintOut => "quintOut",
            Self::QuintInOut => "quintInOut",
            Self::ExpoIn => "expoIn",
            Self::ExpoOut => "expoOut",
            Self::ExpoInOut => "expoInOut",
            Self::CircIn => "circIn",
            Self::CircOut => "circOut",
            Self::CircInOut => "circInOut",
            Self::BackIn => "backIn",
            Self::BackOut => "backOut",
            Self::BackInOut => "backInOut",
            Self::ElasticIn => "elasticIn",
            Self::ElasticOut => "elasticOut",
            Self::ElasticInOut => "elasticInOut",
            Self::BounceIn => "bounceIn",
            Self::BounceOut => "bounceOut",
            Self::BounceInOut => "bounceInOut",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::SineIn => "Sine in",
            Self::SineOut => "Sine out",
            Self::SineInOut => "Sine in-out",
            Self::QuadIn => "Quadratic in",
            Self::QuadOut => "Quadratic out",
            Self::QuadInOut => "Quadratic in-out",
            Self::CubicIn => "Cubic in",
            Self::CubicOut => "Cubic out",
            Self::CubicInOut => "Cubic in-out",
            Self::QuartIn => "Quartic in",
            Self::QuartOut => "Quartic out",
            Self::QuartInOut => "Quartic in-out",
            Self::QuintIn => "Quintic in",
            Self::QuintOut => "Quintic out",
            Self::QuintInOut => "Quintic in-out",
            Self::ExpoIn => "Exponential in",
            Self::ExpoOut => "Exponential out",
            Self::ExpoInOut => "Exponential in-out",
            Self::CircIn => "Circular in",
            Self::CircOut => "Circular out",
            Self::CircInOut => "Circular in-out",
            Self::BackIn => "Back in",
            Self::BackOut => "Back out",
            Self::BackInOut => "Back in-out",
            Self::ElasticIn => "Elastic in",
            Self::ElasticOut => "Elastic out",
            Self::ElasticInOut => "Elastic in-out",
            Self::BounceIn => "Bounce in",
            Self::BounceOut => "Bounce out",
            Self::BounceInOut => "Bounce in-out",
        }
    }

    /// Look up a curve by its tag
    pub fn from_tag(tag: &str) -> Option<Easing> {
        Self::ALL.iter().copied().find(|e| e.tag() == tag)
    }

    /// Registry of every curve keyed by tag
    pub fn factory() -> Factory<Easing> {
        let mut factory = Factory::new("easing");
        factory
            .register("linear", || Easing::Linear)
            .register("sineIn", || Easing::SineIn)
            .register("sineOut", || Easing::SineOut)
            .register("sineInOut", || Easing::SineInOut)
            .register("quadIn", || Easing::QuadIn)
            .register("quadOut", || Easing::QuadOut)
            .register("quadInOut", || Easing::QuadInOut)
            .register("cubicIn", || Easing::CubicIn)
            .register("cubicOut", || Easing::CubicOut)
            .register("cubicInOut", || Easing::CubicInOut)
            .register("quartIn", || Easing::QuartIn)
            .register("quartOut", || Easing::QuartOut)
            .register("quartInOut", || Easing::QuartInOut)
            .register("quintIn", || Easing::QuintIn)
            .register("quintOut", || Easing::QuintOut)
            .register("quintInOut", || Easing::QuintInOut)
            .register("expoIn", || Easing::ExpoIn)
            .register("expoOut", || Easing::ExpoOut)
            .register("expoInOut", || Easing::ExpoInOut)
            .register("circIn", || Easing::CircIn)
            .register("circOut", || Easing::CircOut)
            .register("circInOut", || Easing::CircInOut)
            .register("backIn", || Easing::BackIn)
            .register("backOut", || Easing::BackOut)
            .register("backInOut", || Easing::BackInOut)
            .register("elasticIn", || Easing::ElasticIn)
            .register("elasticOut", || Easing::ElasticOut)
            .register("elasticInOut", || Easing::ElasticInOut)
            .register("bounceIn", || Easing::BounceIn)
            .register("bounceOut", || Easing::BounceOut)
            .register("bounceInOut", || Easing::BounceInOut);
        factory
    }

    /// Apply the curve to a progress value
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,

            Self::SineIn => 1.0 - ((t * PI) / 2.0).cos(),
            Self::SineOut => ((t * PI) / 2.0).sin(),
            Self::SineInOut => -((PI * t).cos() - 1.0) / 2.0,

            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadInOut => in_out(t, 2),

            Self::CubicIn => t.powi(3),
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
            Self::CubicInOut => in_out(t, 3),

            Self::QuartIn => t.powi(4),
            Self::QuartOut => 1.0 - (1.0 - t).powi(4),
            Self::QuartInOut => in_out(t, 4),

            Self::QuintIn => t.powi(5),
            Self::QuintOut => 1.0 - (1.0 - t).powi(5),
            Self::QuintInOut => in_out(t, 5),

            Self::ExpoIn => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Self::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Self::ExpoInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }

            Self::CircIn => 1.0 - (1.0 - t * t).sqrt(),
            Self::CircOut => (1.0 - (t - 1.0) * (t - 1.0)).sqrt(),
            Self::CircInOut => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }

            Self::BackIn => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::BackOut => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Self::BackInOut => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }

            Self::ElasticIn => {
                if t <= 0.0 || t >= 1.0 {
                    t
                } else {
                    -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Self::ElasticOut => {
                if t <= 0.0 || t >= 1.0 {
                    t
                } else {
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Self::ElasticInOut => {
                if t <= 0.0 || t >= 1.0 {
                    t
                } else if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                } else {
                    (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                        + 1.0
                }
            }

            Self::BounceIn => 1.0 - bounce_out(1.0 - t),
            Self::BounceOut => bounce_out(t),
            Self::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}

fn in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_endpoints() {
        for easing in Easing::ALL {
            assert!(easing.apply(0.0).abs() < EPS, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < EPS, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_symmetric_midpoints() {
        for easing in [
            Easing::Linear,
            Easing::SineInOut,
            Easing::QuadInOut,
            Easing::CubicInOut,
            Easing::CircInOut,
        ] {
            assert!((easing.apply(0.5) - 0.5).abs() < EPS, "{easing:?}");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Easing::QuadIn.apply(2.0), 1.0);
        assert_eq!(Easing::QuadIn.apply(-1.0), 0.0);
    }

    #[test]
    fn test_tags_match_serde_and_factory() {
        let factory = Easing::factory();
        for easing in Easing::ALL {
            assert_eq!(Easing::from_tag(easing.tag()), Some(easing));
            assert_eq!(factory.create(easing.tag()).unwrap(), easing);
            let json = serde_json::to_value(easing).unwrap();
            assert_eq!(json, serde_json::Value::String(easing.tag().to_string()));
        }
        assert_eq!(factory.tags().count(), Easing::ALL.len());
    }

    #[test]
    fn test_back_overshoots() {
        assert!(Easing::BackIn.apply(0.2) < 0.0);
        assert!(Easing::BackOut.apply(0.8) > 1.0);
    }
}
