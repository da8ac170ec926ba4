//! Circular-buffer delay line with fractional read positions.
//!
//! The chorus modulates its delay time continuously, so reads interpolate
//! linearly between adjacent samples to avoid zipper noise.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Interpolated delay line using a circular buffer (heap-allocated).
///
/// The buffer is allocated during construction and never reallocates; no
/// allocations occur during audio processing.
///
/// # Example
///
/// ```rust
/// use mesa_core::InterpolatedDelay;
///
/// // 50 ms max delay at 48 kHz
/// let mut delay = InterpolatedDelay::new((0.05 * 48000.0) as usize);
/// let out = delay.read(10.5); // fractional delay in samples
/// delay.write(1.0);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    /// Circular buffer storage
    buffer: Vec<f32>,
    /// Write position in buffer
    write_pos: usize,
}

impl InterpolatedDelay {
    /// Creates a new delay line with the given maximum delay in samples.
    ///
    /// # Panics
    ///
    /// Panics if `max_delay_samples` is 0.
    pub fn new(max_delay_samples: usize) -> Self {
        assert!(max_delay_samples > 0, "Delay size must be > 0");

        Self {
            buffer: vec![0.0; max_delay_samples],
            write_pos: 0,
        }
    }

    /// Creates a delay line from sample rate and max delay time in seconds.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let max_samples = (sample_rate * max_seconds) as usize + 1;
        Self::new(max_samples)
    }

    /// Reads a delayed sample with linear interpolation.
    ///
    /// `delay_samples` may be fractional and is clamped to the buffer length.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        debug_assert!(delay_samples >= 0.0);

        let len = self.buffer.len();
        let delay_clamped = delay_samples.min((len - 1) as f32);

        let delay_int = delay_clamped as usize;
        let frac = delay_clamped - delay_int as f32;

        // read_pos points to the sample `delay_int` samples before the last
        // written one.
        let read_pos = (self.write_pos + len - delay_int - 1) % len;
        let next_pos = (read_pos + len - 1) % len;

        let a = self.buffer[read_pos];
        let b = self.buffer[next_pos];
        a + (b - a) * frac
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Clears the delay line (sets all samples to 0).
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Returns the maximum delay capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_delay_returns_written_sample() {
        let mut delay = InterpolatedDelay::new(64);
        delay.write(1.0);
        for _ in 0..9 {
            delay.write(0.0);
        }
        // The 1.0 was written 10 samples ago; read(9.0) addresses it
        assert!((delay.read(9.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fractional_delay_interpolates() {
        let mut delay = InterpolatedDelay::new(16);
        delay.write(0.0);
        delay.write(1.0);
        // Halfway between the last two writes
        let v = delay.read(0.5);
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clear_zeroes_buffer() {
        let mut delay = InterpolatedDelay::new(8);
        delay.write(0.7);
        delay.clear();
        assert_eq!(delay.read(0.0), 0.0);
        assert_eq!(delay.capacity(), 8);
    }
}
