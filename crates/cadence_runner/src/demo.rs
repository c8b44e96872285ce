// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in preset used when no preset file is configured.

use cadence_sequencer::{
    Manager, MorphModifier, MorphProgression, MorphTarget, NaturalProgression, Step,
    StepProgression,
};
use cadence_timing::{
    Delay, Easing, Movement, RampDuration, RandomDuration, RandomSource, RandomizableFloat,
    RandomizableTime,
};

/// A small face rig: breathing, a smile and idle blinks
pub fn demo_manager(rng: &mut dyn RandomSource) -> Manager {
    let mut manager = Manager::new().with_progression(StepProgression::sequential());

    let breathe = MorphModifier::new(MorphProgression::Concurrent).with_target(MorphTarget::new(
        "chest",
        Movement::new(0.0, 0.6).with_easing(Easing::SineInOut),
    ));
    manager.add_step(
        Step::new("Breathe")
            .with_duration(
                RampDuration::new(3.0, 1.5, 4.0, 4.0, 2.0).with_easing(Easing::QuadInOut),
            )
            .with_modifier("Chest", Box::new(breathe)),
        rng,
    );

    let smile = MorphModifier::new(MorphProgression::sequential(true))
        .with_target(MorphTarget::new(
            "mouth_left",
            Movement::from_bounds(
                RandomizableFloat::fixed(0.0),
                RandomizableFloat::new(0.7, 0.2, 2.0),
                Easing::CubicOut,
            ),
        ))
        .with_target(MorphTarget::new(
            "mouth_right",
            Movement::from_bounds(
                RandomizableFloat::fixed(0.0),
                RandomizableFloat::new(0.7, 0.2, 2.0),
                Easing::CubicOut,
            ),
        ));
    manager.add_step(
        Step::new("Smile")
            .with_duration(RandomDuration::with_range(2.0, 0.5, 0.0))
            .with_half_move(true)
            .with_delay(
                Delay::new(RandomDuration::with_range(1.0, 0.5, 0.0))
                    .with_triggers(false, true, false),
            )
            .with_modifier("Mouth", Box::new(smile)),
        rng,
    );

    let blink = MorphModifier::new(MorphProgression::Natural(NaturalProgression::new(
        RandomDuration::with_range(0.3, 0.05, 0.0),
        Delay::new(RandomDuration::with_range(3.0, 1.5, 0.0)).with_triggers(false, false, true),
    )))
    .with_target(MorphTarget::new("eyelid_left", Movement::new(0.0, 1.0)))
    .with_target(MorphTarget::new("eyelid_right", Movement::new(0.0, 1.0)));
    manager.add_step(
        Step::new("Blink")
            .with_duration(RandomDuration::new(1.0))
            .with_repeat(RandomizableTime::new(4.0, 2.0, 0.0))
            .with_modifier("Eyelids", Box::new(blink)),
        rng,
    );

    manager
}
