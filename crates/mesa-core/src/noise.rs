//! Deterministic pseudo-random noise.
//!
//! Used to synthesize the reverb impulse response: a burst of uniform noise
//! shaped by an exponential decay. A seeded xorshift generator keeps IR
//! generation reproducible without pulling in an RNG crate.

/// Xorshift32 noise generator producing uniform samples in [-1, 1].
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    state: u32,
}

impl NoiseGenerator {
    /// Create a generator from a non-zero seed.
    ///
    /// A zero seed would lock xorshift at zero forever, so it is remapped.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9e3779b9 } else { seed },
        }
    }

    /// Next uniform sample in [-1.0, 1.0].
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        // Simple xorshift PRNG
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;

        (x as i32 as f32) / (i32::MAX as f32)
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new(0x2545f491)
    }
}
