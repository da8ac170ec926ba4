//! Mesa Effects - send effects and channel EQ for the mesa mixer
//!
//! Each channel strip routes its signal through a fixed chain:
//! EQ, then the three send effects (reverb, delay, chorus), then pan and
//! gain. The send effects implement [`EffectUnit`], mixing an independent
//! dry and wet level per unit; the [`ThreeBandEq`] is always inline.
//!
//! # Effects
//!
//! - [`Reverb`] - Partitioned FFT convolution against a generated two-second
//!   exponential-noise impulse response
//! - [`Delay`] - 300 ms feedback delay
//! - [`Chorus`] - 30 ms delay swept ±5 ms by a 0.1 Hz LFO
//! - [`ThreeBandEq`] - Low shelf 200 Hz, peaking 1 kHz, high shelf 5 kHz,
//!   each ±15 dB
//!
//! # Example
//!
//! ```rust
//! use mesa_effects::{Delay, EffectUnit};
//!
//! let mut delay = Delay::new(48000.0);
//! delay.set_wet(0.5);
//!
//! let (left, right) = delay.process_stereo(0.25, 0.25);
//! assert!(left.is_finite() && right.is_finite());
//! ```

pub mod chorus;
pub mod convolver;
pub mod delay;
pub mod eq;
pub mod reverb;
pub mod unit;

pub use chorus::Chorus;
pub use convolver::{BLOCK_SIZE, FftConvolver};
pub use delay::Delay;
pub use eq::ThreeBandEq;
pub use reverb::Reverb;
pub use unit::{EffectUnit, MixLevels};
