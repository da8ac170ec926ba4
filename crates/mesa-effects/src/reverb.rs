//! Convolution reverb with a generated exponential-noise impulse response.

use libm::{expf, sqrtf};
use mesa_core::NoiseGenerator;

use crate::convolver::FftConvolver;
use crate::unit::{EffectUnit, MixLevels};

/// Impulse response length in seconds.
const IR_SECONDS: f32 = 2.0;
/// Exponential decay time constant in seconds.
const DECAY_TAU: f32 = 0.5;

const LEFT_SEED: u32 = 0x3c6e_f372;
const RIGHT_SEED: u32 = 0xa54f_f53a;

/// Convolution reverb.
///
/// The impulse response is two seconds of white noise under an exponential
/// decay envelope, generated per channel from a fixed seed and normalized to
/// unit energy so the wet tail lands at a usable level. Left and right use
/// decorrelated noise for stereo width.
pub struct Reverb {
    left: FftConvolver,
    right: FftConvolver,
    mix: MixLevels,
    sample_rate: f32,
}

impl Reverb {
    /// Create a reverb for the given sample rate, defaulting to bypass.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: FftConvolver::new(&generate_impulse(sample_rate, LEFT_SEED)),
            right: FftConvolver::new(&generate_impulse(sample_rate, RIGHT_SEED)),
            mix: MixLevels::bypass(),
            sample_rate,
        }
    }

    /// Impulse-response length in samples at the current sample rate.
    pub fn tail_len(&self) -> usize {
        self.left.tail_len()
    }
}

/// Generate one channel of the impulse response: seeded noise with an
/// exponential decay, scaled to unit energy.
fn generate_impulse(sample_rate: f32, seed: u32) -> Vec<f32> {
    let len = (IR_SECONDS * sample_rate) as usize;
    let mut noise = NoiseGenerator::new(seed);
    let mut impulse = Vec::with_capacity(len);
    for i in 0..len {
        let envelope = expf(-(i as f32) / (sample_rate * DECAY_TAU));
        impulse.push(noise.next_sample() * envelope);
    }

    let energy: f32 = impulse.iter().map(|&h| h * h).sum();
    if energy > 0.0 {
        let scale = 1.0 / sqrtf(energy);
        for h in &mut impulse {
            *h *= scale;
        }
    }
    impulse
}

impl EffectUnit for Reverb {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let wet = (self.left.process(left), self.right.process(right));
        self.mix.mix((left, right), wet)
    }

    fn set_wet(&mut self, level: f32) {
        self.mix.set_wet(level);
    }

    fn set_dry(&mut self, level: f32) {
        self.mix.set_dry(level);
    }

    fn wet(&self) -> f32 {
        self.mix.wet()
    }

    fn dry(&self) -> f32 {
        self.mix.dry()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        if (sample_rate - self.sample_rate).abs() < f32::EPSILON {
            return;
        }
        self.sample_rate = sample_rate;
        self.left = FftConvolver::new(&generate_impulse(sample_rate, LEFT_SEED));
        self.right = FftConvolver::new(&generate_impulse(sample_rate, RIGHT_SEED));
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl std::fmt::Debug for Reverb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reverb")
            .field("sample_rate", &self.sample_rate)
            .field("mix", &self.mix)
            .finish_non_exhaustive()
    }
}
