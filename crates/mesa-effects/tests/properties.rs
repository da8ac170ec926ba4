//! Property-based tests for the send effects.
//!
//! Every unit must produce finite, bounded output for any input in [-1, 1]
//! and any wet/dry levels, and a reset must leave no audible tail.

use proptest::prelude::*;

use mesa_effects::{Chorus, Delay, EffectUnit, Reverb};

fn all_units(sample_rate: f32) -> Vec<Box<dyn EffectUnit>> {
    vec![
        Box::new(Reverb::new(sample_rate)),
        Box::new(Delay::new(sample_rate)),
        Box::new(Chorus::new(sample_rate)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For any input in [-1, 1] and any mix levels, output stays finite
    /// and within a loose bound.
    #[test]
    fn units_finite_bounded_output(
        input in prop::array::uniform32(-1.0f32..=1.0f32),
        wet in 0.0f32..=1.0f32,
        dry in 0.0f32..=1.0f32,
        unit_idx in 0usize..3,
    ) {
        let mut units = all_units(48000.0);
        let unit = &mut units[unit_idx];
        unit.set_wet(wet);
        unit.set_dry(dry);

        // Warm up so delay lines and convolution blocks fill
        for _ in 0..2048 {
            unit.process_stereo(0.0, 0.0);
        }

        for &sample in &input {
            let (l, r) = unit.process_stereo(sample, sample);
            prop_assert!(l.is_finite() && r.is_finite());
            prop_assert!(l.abs() < 10.0 && r.abs() < 10.0);
        }
    }

    /// Levels outside [0, 1] are clamped on write.
    #[test]
    fn unit_levels_clamped(level in -5.0f32..=5.0f32, unit_idx in 0usize..3) {
        let mut units = all_units(48000.0);
        let unit = &mut units[unit_idx];
        unit.set_wet(level);
        unit.set_dry(level);
        prop_assert!((0.0..=1.0).contains(&unit.wet()));
        prop_assert!((0.0..=1.0).contains(&unit.dry()));
    }
}

#[test]
fn reset_silences_every_unit() {
    for mut unit in all_units(48000.0) {
        unit.set_dry(0.0);
        unit.set_wet(1.0);
        for _ in 0..8192 {
            unit.process_stereo(0.7, -0.7);
        }
        unit.reset();
        for _ in 0..8192 {
            let (l, r) = unit.process_stereo(0.0, 0.0);
            assert_eq!((l, r), (0.0, 0.0));
        }
    }
}

#[test]
fn default_mix_is_transparent() {
    for mut unit in all_units(48000.0) {
        for i in 0..4096 {
            let x = ((i % 113) as f32) / 113.0 - 0.5;
            let (l, r) = unit.process_stereo(x, x * 0.25);
            assert_eq!((l, r), (x, x * 0.25));
        }
    }
}
