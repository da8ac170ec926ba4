//! Biquad (bi-quadratic) filter structure.
//!
//! Provides a generic second-order IIR filter plus the coefficient formulas
//! the channel-strip EQ needs: low shelf, peaking, and high shelf.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients (normalized by a0)
    a1: f32,
    a2: f32,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    ///
    /// Initial state: `y[n] = x[n]` (no filtering)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the biquad coefficients, normalizing by `a0` internally.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample through the filter.
    ///
    /// Uses Direct Form I for numerical stability.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state (delay lines) without changing coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates low-shelf filter coefficients using the RBJ cookbook formula.
///
/// A low shelf boosts or cuts everything below the corner frequency by
/// `gain_db`, with a shelf slope of 1.
///
/// # Arguments
///
/// * `frequency` - Shelf corner frequency in Hz
/// * `gain_db` - Shelf gain in decibels (positive = boost, negative = cut)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn low_shelf_coefficients(
    frequency: f32,
    gain_db: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    // Shelf slope S = 1
    let alpha = sin_omega / 2.0 * sqrtf(2.0);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates high-shelf filter coefficients using the RBJ cookbook formula.
///
/// Mirror image of [`low_shelf_coefficients`]: affects everything above the
/// corner frequency.
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn high_shelf_coefficients(
    frequency: f32,
    gain_db: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / 2.0 * sqrtf(2.0);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates peaking EQ filter coefficients using the RBJ cookbook formula.
///
/// A peaking EQ boosts or cuts around a center frequency with a specified
/// bandwidth.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `q` - Q factor (bandwidth = frequency / Q)
/// * `gain_db` - Gain in decibels (positive = boost, negative = cut)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0); // sqrt(10^(dB/20))
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnitude_at(filter: &mut Biquad, freq: f32, sample_rate: f32) -> f32 {
        // Feed a sine, measure steady-state peak after the transient settles
        let mut peak = 0.0f32;
        for i in 0..8192 {
            let x = sinf(2.0 * PI * freq * i as f32 / sample_rate);
            let y = filter.process(x);
            if i > 4096 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn passthrough_by_default() {
        let mut f = Biquad::new();
        assert_eq!(f.process(0.5), 0.5);
        assert_eq!(f.process(-0.25), -0.25);
    }

    #[test]
    fn low_shelf_boosts_low_frequencies() {
        let mut f = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = low_shelf_coefficients(200.0, 12.0, 48000.0);
        f.set_coefficients(b0, b1, b2, a0, a1, a2);

        let low = magnitude_at(&mut f, 50.0, 48000.0);
        f.clear();
        let high = magnitude_at(&mut f, 5000.0, 48000.0);

        assert!(low > 2.0, "50 Hz should be boosted ~12 dB, got {low}");
        assert!(high < 1.2, "5 kHz should be near unity, got {high}");
    }

    #[test]
    fn high_shelf_cuts_high_frequencies() {
        let mut f = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = high_shelf_coefficients(5000.0, -12.0, 48000.0);
        f.set_coefficients(b0, b1, b2, a0, a1, a2);

        let high = magnitude_at(&mut f, 12000.0, 48000.0);
        f.clear();
        let low = magnitude_at(&mut f, 100.0, 48000.0);

        assert!(high < 0.5, "12 kHz should be cut ~12 dB, got {high}");
        assert!(low > 0.8, "100 Hz should be near unity, got {low}");
    }

    #[test]
    fn peaking_at_zero_gain_is_transparent() {
        let mut f = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(1000.0, 1.0, 0.0, 48000.0);
        f.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mag = magnitude_at(&mut f, 1000.0, 48000.0);
        assert!((mag - 1.0).abs() < 0.05, "0 dB peaking should pass through, got {mag}");
    }

    #[test]
    fn clear_resets_state() {
        let mut f = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(1000.0, 1.0, 6.0, 48000.0);
        f.set_coefficients(b0, b1, b2, a0, a1, a2);
        f.process(1.0);
        f.clear();
        assert_eq!(f.process(0.0), 0.0);
    }
}
