//! Mesa Core - DSP primitives for the mesa studio-rack mixer
//!
//! This crate provides the building blocks the channel-strip signal chain is
//! assembled from, designed for real-time processing with zero allocation in
//! the audio path.
//!
//! # Core Abstractions
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//!   (low-shelf, peaking, and high-shelf variants for the channel EQ)
//!
//! ## Delay Lines & Modulation
//!
//! - [`InterpolatedDelay`] - Variable-length delay with linear interpolation
//! - [`Lfo`] - Sine low-frequency oscillator for the chorus delay modulation
//!
//! ## Observation
//!
//! - [`AnalyserTap`] - Lock-free-style ring buffer exposing the most recent
//!   time-domain samples of a bus for metering
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`pan_gains`], [`flush_denormal`]
//! - [`NoiseGenerator`] - Deterministic xorshift noise (reverb IR synthesis)
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! mesa-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Directly settable parameters**: Mixer controls write straight to the
//!   live parameter; there is no command queue between UI and DSP

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod analyser;
pub mod biquad;
pub mod delay_line;
pub mod lfo;
pub mod math;
pub mod noise;

pub use analyser::AnalyserTap;
pub use biquad::{
    Biquad, high_shelf_coefficients, low_shelf_coefficients, peaking_eq_coefficients,
};
pub use delay_line::InterpolatedDelay;
pub use lfo::Lfo;
pub use math::{db_to_linear, flush_denormal, linear_to_db, pan_gains};
pub use noise::NoiseGenerator;
