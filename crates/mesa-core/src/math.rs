//! Scalar math helpers shared across the signal chain.

use core::f32::consts::FRAC_PI_4;
use libm::{cosf, log10f, powf, sinf};

/// Converts decibels to a linear gain factor.
///
/// 0 dB = 1.0, +6 dB ≈ 2.0, -6 dB ≈ 0.5.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Converts a linear gain factor to decibels.
///
/// Gains at or below zero clamp to -120 dB.
#[inline]
pub fn linear_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        -120.0
    } else {
        20.0 * log10f(gain)
    }
}

/// Equal-power stereo pan law.
///
/// `pan` is clamped to [-1, 1]; -1 is hard left, 0 is center, +1 is hard
/// right. Returns `(left_gain, right_gain)`. At center both gains are
/// `cos(π/4) ≈ 0.707`, keeping total power constant across the sweep.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    let angle = (pan + 1.0) * FRAC_PI_4;
    (cosf(angle), sinf(angle))
}

/// Flushes denormal numbers to zero.
///
/// Denormals in feedback paths (delay lines) cause severe CPU spikes on
/// some architectures.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
