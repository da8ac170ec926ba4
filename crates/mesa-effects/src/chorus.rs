//! Slow-sweep chorus effect.

use mesa_core::{InterpolatedDelay, Lfo};

use crate::unit::{EffectUnit, MixLevels};

/// Centre delay time in seconds.
const BASE_DELAY_SECONDS: f32 = 0.03;
/// Peak delay-time deviation in seconds.
const MOD_DEPTH_SECONDS: f32 = 0.005;
/// LFO sweep rate in Hz.
const LFO_RATE_HZ: f32 = 0.1;

/// Chorus with a single slow LFO sweeping a 30 ms delay by ±5 ms.
///
/// Both channels share the one LFO so the sweep stays phase-coherent
/// across the stereo image.
#[derive(Debug, Clone)]
pub struct Chorus {
    left: InterpolatedDelay,
    right: InterpolatedDelay,
    lfo: Lfo,
    base_delay_samples: f32,
    mod_depth_samples: f32,
    mix: MixLevels,
    sample_rate: f32,
}

impl Chorus {
    /// Create a chorus for the given sample rate, defaulting to bypass.
    pub fn new(sample_rate: f32) -> Self {
        let max_seconds = BASE_DELAY_SECONDS + MOD_DEPTH_SECONDS;
        Self {
            left: InterpolatedDelay::from_time(sample_rate, max_seconds),
            right: InterpolatedDelay::from_time(sample_rate, max_seconds),
            lfo: Lfo::new(sample_rate, LFO_RATE_HZ),
            base_delay_samples: BASE_DELAY_SECONDS * sample_rate,
            mod_depth_samples: MOD_DEPTH_SECONDS * sample_rate,
            mix: MixLevels::bypass(),
            sample_rate,
        }
    }
}

impl EffectUnit for Chorus {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        // One LFO step per frame, shared by both channels.
        let sweep = self.lfo.advance();
        let delay_samples = self.base_delay_samples + sweep * self.mod_depth_samples;

        let wet_l = self.left.read(delay_samples);
        let wet_r = self.right.read(delay_samples);
        self.left.write(left);
        self.right.write(right);

        self.mix.mix((left, right), (wet_l, wet_r))
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
        let max_seconds = BASE_DELAY_SECONDS + MOD_DEPTH_SECONDS;
        self.left = InterpolatedDelay::from_time(sample_rate, max_seconds);
        self.right = InterpolatedDelay::from_time(sample_rate, max_seconds);
        self.base_delay_samples = BASE_DELAY_SECONDS * sample_rate;
        self.mod_depth_samples = MOD_DEPTH_SECONDS * sample_rate;
        self.lfo.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.lfo.reset();
    }
}
