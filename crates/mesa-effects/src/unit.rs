//! Common trait for channel-strip effect units.

/// A stereo effect unit with an independent dry and wet level.
///
/// Every unit runs the incoming signal through its wet path each frame
/// regardless of levels, so that delay lines and convolution tails keep
/// filling while a unit is mixed out. The output of a unit is always
/// `dry * input + wet * processed`, with both levels clamped to `[0, 1]`.
///
/// Units default to a bypass mix (dry 1.0, wet 0.0).
pub trait EffectUnit {
    /// Process one stereo frame and return the mixed output frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Set the wet level (clamped to 0-1).
    fn set_wet(&mut self, level: f32);

    /// Set the dry level (clamped to 0-1).
    fn set_dry(&mut self, level: f32);

    /// Current wet level.
    fn wet(&self) -> f32;

    /// Current dry level.
    fn dry(&self) -> f32;

    /// Update the sample rate, rebuilding internal state as needed.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear all internal state (delay lines, filter memory, tails).
    fn reset(&mut self);
}

/// Dry/wet levels shared by the concrete units.
///
/// Levels are independent gains, not a crossfade: raising wet does not
/// lower dry.
#[derive(Debug, Clone, Copy)]
pub struct MixLevels {
    dry: f32,
    wet: f32,
}

impl MixLevels {
    /// Bypass mix: full dry, no wet.
    pub const fn bypass() -> Self {
        Self { dry: 1.0, wet: 0.0 }
    }

    /// Set the dry gain, clamped to 0-1.
    pub fn set_dry(&mut self, level: f32) {
        self.dry = level.clamp(0.0, 1.0);
    }

    /// Set the wet gain, clamped to 0-1.
    pub fn set_wet(&mut self, level: f32) {
        self.wet = level.clamp(0.0, 1.0);
    }

    /// Current dry gain.
    pub fn dry(&self) -> f32 {
        self.dry
    }

    /// Current wet gain.
    pub fn wet(&self) -> f32 {
        self.wet
    }

    /// Combine a dry and a wet frame.
    #[inline]
    pub fn mix(&self, dry: (f32, f32), wet: (f32, f32)) -> (f32, f32) {
        (
            dry.0 * self.dry + wet.0 * self.wet,
            dry.1 * self.dry + wet.1 * self.wet,
        )
    }
}

impl Default for MixLevels {
    fn default() -> Self {
        Self::bypass()
    }
}
