//! Mesa Engine - the studio-rack mixer
//!
//! This crate ties the rack together: channel strips with their fixed
//! signal chain, the transport and decoded-buffer cache, VU metering,
//! MIDI learn and dispatch, and persisted state. The [`Mixer`] is the
//! single entry point; rendering is pull-based, so the same engine runs
//! under a cpal output stream or fully headless in tests.
//!
//! # Example
//!
//! ```rust
//! use mesa_engine::{Mixer, MixerOptions};
//!
//! let mut mixer = Mixer::new(MixerOptions::default());
//! mixer.handle_user_gesture();
//! let id = mixer.add_channel();
//!
//! let mut frames = [0.0f32; 256];
//! mixer.render(&mut frames);
//! assert!(mixer.current_time() > 0.0);
//! # let _ = id;
//! ```

use thiserror::Error;

pub mod channel;
pub mod io;
pub mod meter;
pub mod midi;
pub mod mixer;
pub mod notice;
pub mod source;
pub mod transport;

pub use channel::{ChannelStrip, PlayState};
pub use meter::{ACTIVE_THRESHOLD, MeterBank, MeterReading, MeterScale, TimeDomainData};
pub use midi::{ALL_DEVICES, MidiAction, MidiPortInfo, MidiRouter, MidiState};
pub use mixer::{LatencyHint, MeterFrame, Mixer, MixerOptions};
pub use notice::{Notice, NoticeCenter, Severity};
pub use source::{
    InputBackend, InputDeviceInfo, InputKind, LiveSource, NullInputBackend, Source,
    StreamConstraints,
};
pub use transport::{AudioBuffer, BufferCache, FileId, Voice, format_time};

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be brought up at all.
    #[error("engine initialization failed: {0}")]
    Init(String),

    /// The platform refused access to a capture device.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No usable device was found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// An imported file could not be decoded.
    #[error("failed to decode '{name}': {reason}")]
    Decode {
        /// File name as imported.
        name: String,
        /// What the decoder reported.
        reason: String,
    },

    /// An operation referenced a channel that does not exist.
    #[error("no such channel: {0}")]
    ChannelNotFound(String),

    /// MIDI access is unavailable on this platform.
    #[error("MIDI unavailable: {0}")]
    MidiUnavailable(String),

    /// Persisted state could not be read or written.
    #[error(transparent)]
    Config(#[from] mesa_config::ConfigError),

    /// An audio stream could not be built or started.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
