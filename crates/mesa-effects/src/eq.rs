//! Three-band channel equalizer.

use mesa_core::{
    Biquad, high_shelf_coefficients, low_shelf_coefficients, peaking_eq_coefficients,
};

/// Low-shelf corner frequency in Hz.
const LOW_FREQ: f32 = 200.0;
/// Mid peaking-band centre frequency in Hz.
const MID_FREQ: f32 = 1000.0;
/// High-shelf corner frequency in Hz.
const HIGH_FREQ: f32 = 5000.0;
/// Mid band Q.
const MID_Q: f32 = 1.0;
/// Band gains are clamped to this range in dB.
const GAIN_RANGE_DB: f32 = 15.0;

/// Three-band EQ: low shelf at 200 Hz, peaking at 1 kHz, high shelf at 5 kHz.
///
/// Always inline in the channel strip, unlike the send effects there is no
/// wet/dry mix. Gain writes take effect on the next processed frame.
#[derive(Debug, Clone)]
pub struct ThreeBandEq {
    // One filter per band per channel, cascaded low -> mid -> high.
    bands: [[Biquad; 3]; 2],
    gains_db: [f32; 3],
    sample_rate: f32,
}

impl ThreeBandEq {
    /// Create a flat EQ for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            bands: [
                [Biquad::new(), Biquad::new(), Biquad::new()],
                [Biquad::new(), Biquad::new(), Biquad::new()],
            ],
            gains_db: [0.0; 3],
            sample_rate,
        };
        eq.update_coefficients();
        eq
    }

    /// Set the low-shelf gain in dB, clamped to ±15.
    pub fn set_low_gain(&mut self, gain_db: f32) {
        self.gains_db[0] = gain_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB);
        self.update_coefficients();
    }

    /// Set the mid peaking gain in dB, clamped to ±15.
    pub fn set_mid_gain(&mut self, gain_db: f32) {
        self.gains_db[1] = gain_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB);
        self.update_coefficients();
    }

    /// Set the high-shelf gain in dB, clamped to ±15.
    pub fn set_high_gain(&mut self, gain_db: f32) {
        self.gains_db[2] = gain_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB);
        self.update_coefficients();
    }

    /// Current band gains in dB as (low, mid, high).
    pub fn gains(&self) -> (f32, f32, f32) {
        (self.gains_db[0], self.gains_db[1], self.gains_db[2])
    }

    fn update_coefficients(&mut self) {
        let low = low_shelf_coefficients(LOW_FREQ, self.gains_db[0], self.sample_rate);
        let mid = peaking_eq_coefficients(MID_FREQ, MID_Q, self.gains_db[1], self.sample_rate);
        let high = high_shelf_coefficients(HIGH_FREQ, self.gains_db[2], self.sample_rate);
        for channel in &mut self.bands {
            channel[0].set_coefficients(low.0, low.1, low.2, low.3, low.4, low.5);
            channel[1].set_coefficients(mid.0, mid.1, mid.2, mid.3, mid.4, mid.5);
            channel[2].set_coefficients(high.0, high.1, high.2, high.3, high.4, high.5);
        }
    }

    /// Process one stereo frame through all three bands.
    #[inline]
    pub fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut l = left;
        for band in &mut self.bands[0] {
            l = band.process(l);
        }
        let mut r = right;
        for band in &mut self.bands[1] {
            r = band.process(r);
        }
        (l, r)
    }

    /// Update the sample rate, keeping the configured gains.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
        self.reset();
    }

    /// Clear filter memory without touching the gains.
    pub fn reset(&mut self) {
        for channel in &mut self.bands {
            for band in channel {
                band.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    /// Steady-state magnitude of the EQ at one frequency.
    ///
    /// Measured as RMS times sqrt(2) over the settled half of the sweep,
    /// which recovers the sine amplitude regardless of where the samples
    /// land on the waveform.
    fn magnitude_at(eq: &mut ThreeBandEq, frequency: f32, sample_rate: f32) -> f32 {
        eq.reset();
        let total = (sample_rate as usize) / 2;
        let settle = total / 2;
        let mut sum_squares = 0.0f64;
        for n in 0..total {
            let x = (TAU * frequency * n as f32 / sample_rate).sin();
            let (l, _) = eq.process_stereo(x, x);
            if n >= settle {
                sum_squares += f64::from(l * l);
            }
        }
        ((sum_squares / (total - settle) as f64).sqrt() * std::f64::consts::SQRT_2) as f32
    }

    #[test]
    fn test_flat_eq_is_transparent() {
        let mut eq = ThreeBandEq::new(48000.0);
        for &freq in &[100.0, 1000.0, 8000.0] {
            let mag = magnitude_at(&mut eq, freq, 48000.0);
            assert!((mag - 1.0).abs() < 0.05, "{freq} Hz: {mag}");
        }
    }

    #[test]
    fn test_low_shelf_boosts_lows_only() {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_low_gain(12.0);
        let low = magnitude_at(&mut eq, 60.0, 48000.0);
        let high = magnitude_at(&mut eq, 8000.0, 48000.0);
        assert!(low > 3.0, "60 Hz should be boosted, got {low}");
        assert!((high - 1.0).abs() < 0.1, "8 kHz should be untouched, got {high}");
    }

    #[test]
    fn test_mid_cut_notches_centre() {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_mid_gain(-12.0);
        let mid = magnitude_at(&mut eq, 1000.0, 48000.0);
        let low = magnitude_at(&mut eq, 80.0, 48000.0);
        assert!(mid < 0.4, "1 kHz should be cut, got {mid}");
        assert!((low - 1.0).abs() < 0.1, "80 Hz should be untouched, got {low}");
    }

    #[test]
    fn test_high_shelf_boosts_highs() {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_high_gain(12.0);
        let high = magnitude_at(&mut eq, 10000.0, 48000.0);
        assert!(high > 3.0, "10 kHz should be boosted, got {high}");
    }

    #[test]
    fn test_gains_clamped() {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_low_gain(40.0);
        eq.set_mid_gain(-99.0);
        eq.set_high_gain(15.0);
        assert_eq!(eq.gains(), (15.0, -15.0, 15.0));
    }
}
