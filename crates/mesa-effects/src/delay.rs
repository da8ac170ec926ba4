//! Feedback delay effect.

use mesa_core::{InterpolatedDelay, flush_denormal};

use crate::unit::{EffectUnit, MixLevels};

/// Delay time in seconds.
const DELAY_SECONDS: f32 = 0.3;
/// Feedback amount fed from the delayed signal back into the line.
const FEEDBACK: f32 = 0.4;
/// Feedback stays below unity so echoes always die out.
const MAX_FEEDBACK: f32 = 0.95;

/// Stereo feedback delay.
///
/// Fixed 300 ms delay with 40% feedback, one independent line per channel.
#[derive(Debug, Clone)]
pub struct Delay {
    left: InterpolatedDelay,
    right: InterpolatedDelay,
    delay_samples: f32,
    feedback: f32,
    mix: MixLevels,
    sample_rate: f32,
}

impl Delay {
    /// Create a delay for the given sample rate, defaulting to bypass.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: InterpolatedDelay::from_time(sample_rate, DELAY_SECONDS),
            right: InterpolatedDelay::from_time(sample_rate, DELAY_SECONDS),
            delay_samples: DELAY_SECONDS * sample_rate,
            feedback: FEEDBACK,
            mix: MixLevels::bypass(),
            sample_rate,
        }
    }

    /// Set the feedback amount, clamped to keep the loop stable.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    /// Current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    #[inline]
    fn process_channel(line: &mut InterpolatedDelay, delay_samples: f32, feedback: f32, input: f32) -> f32 {
        let delayed = line.read(delay_samples);
        line.write(flush_denormal(input + delayed * feedback));
        delayed
    }
}

impl EffectUnit for Delay {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let wet_l = Self::process_channel(&mut self.left, self.delay_samples, self.feedback, left);
        let wet_r = Self::process_channel(&mut self.right, self.delay_samples, self.feedback, right);
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
        self.delay_samples = DELAY_SECONDS * sample_rate;
        self.left = InterpolatedDelay::from_time(sample_rate, DELAY_SECONDS);
        self.right = InterpolatedDelay::from_time(sample_rate, DELAY_SECONDS);
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypass_is_exact_passthrough() {
        let mut delay = Delay::new(48000.0);
        for i in 0..20000 {
            let x = ((i % 97) as f32) / 97.0 - 0.5;
            let (l, r) = delay.process_stereo(x, x * 0.5);
            assert_eq!((l, r), (x, x * 0.5));
        }
    }

    #[test]
    fn test_first_echo_lands_at_delay_time() {
        let sample_rate = 48000.0;
        let mut delay = Delay::new(sample_rate);
        delay.set_dry(0.0);
        delay.set_wet(1.0);

        let expected = (DELAY_SECONDS * sample_rate) as usize;
        let mut first_echo = None;
        let (l, _) = delay.process_stereo(1.0, 0.0);
        assert_eq!(l, 0.0);
        for n in 1..(expected * 2) {
            let (l, _) = delay.process_stereo(0.0, 0.0);
            if l.abs() > 0.5 {
                first_echo = Some(n);
                break;
            }
        }
        let n = first_echo.unwrap();
        assert!(
            n.abs_diff(expected) <= 2,
            "echo at {n}, expected near {expected}"
        );
    }

    #[test]
    fn test_feedback_produces_decaying_echoes() {
        let sample_rate = 48000.0;
        let mut delay = Delay::new(sample_rate);
        delay.set_dry(0.0);
        delay.set_wet(1.0);

        let mut out = vec![0.0f32];
        delay.process_stereo(1.0, 1.0);
        for _ in 1..60000 {
            let (l, _) = delay.process_stereo(0.0, 0.0);
            out.push(l);
        }

        let period = out
            .iter()
            .position(|x| x.abs() > 0.5)
            .expect("first echo present");
        assert!((out[period] - 1.0).abs() < 0.05, "first echo near unity");
        assert!(
            (out[2 * period] - FEEDBACK).abs() < 0.05,
            "second echo scaled by feedback"
        );
        assert!(
            (out[3 * period] - FEEDBACK * FEEDBACK).abs() < 0.05,
            "third echo scaled again"
        );
    }

    #[test]
    fn test_feedback_clamped_below_unity() {
        let mut delay = Delay::new(48000.0);
        delay.set_feedback(1.5);
        assert_eq!(delay.feedback(), MAX_FEEDBACK);
    }
}
