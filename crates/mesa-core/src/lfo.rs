//! Low-frequency oscillator for modulation.
//!
//! The chorus runs a slow sine over its delay time; that is the only
//! modulation source the mixer needs, so only the sine shape is provided.

use core::f32::consts::PI;
use libm::sinf;

/// Sine low-frequency oscillator using phase accumulation.
///
/// Output is in [-1.0, 1.0].
///
/// # Example
///
/// ```rust
/// use mesa_core::Lfo;
///
/// let mut lfo = Lfo::new(48000.0, 0.1); // 0.1 Hz
/// let value = lfo.advance();
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    /// Sample rate in Hz
    sample_rate: f32,
}

impl Lfo {
    /// Create a new LFO with the given sample rate and frequency.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz / sample_rate,
            sample_rate,
        }
    }

    /// Set frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz / self.sample_rate;
    }

    /// Get current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Update the sample rate, preserving the configured frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.phase_inc = freq / sample_rate;
    }

    /// Advance one sample and return the oscillator value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let value = sinf(2.0 * PI * self.phase);
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    /// Reset phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_crossing() {
        let mut lfo = Lfo::new(48000.0, 1.0);
        assert!(lfo.advance().abs() < 1e-6);
    }

    #[test]
    fn completes_cycle_at_rate() {
        // 1 Hz at 48 kHz: after 12000 samples we are at the positive peak
        let mut lfo = Lfo::new(48000.0, 1.0);
        let mut last = 0.0;
        for _ in 0..12001 {
            last = lfo.advance();
        }
        assert!((last - 1.0).abs() < 1e-3, "expected peak, got {last}");
    }

    #[test]
    fn output_stays_bounded() {
        let mut lfo = Lfo::new(48000.0, 7.3);
        for _ in 0..100_000 {
            let v = lfo.advance();
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn sample_rate_change_keeps_frequency() {
        let mut lfo = Lfo::new(48000.0, 2.0);
        lfo.set_sample_rate(44100.0);
        assert!((lfo.frequency() - 2.0).abs() < 1e-4);
    }
}
