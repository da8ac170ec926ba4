//! Mesa Config - persisted state for the mesa studio-rack mixer
//!
//! Saved mixer state is a small camelCase JSON document holding the master
//! volume and each channel strip's EQ, pan, fader, effect sends, and learned
//! MIDI assignment. It lives in a [`KvStore`] alongside the preferred MIDI
//! input device, mirroring the two keys the mixer has always used:
//! [`CONFIG_KEY`] and [`MIDI_DEVICE_KEY`].
//!
//! # Example
//!
//! ```rust
//! use mesa_config::{ChannelConfig, MixerConfig};
//!
//! let mut config = MixerConfig::default();
//! config.channels.push(ChannelConfig::default());
//!
//! let json = config.to_json().unwrap();
//! let restored = MixerConfig::from_json(&json).unwrap();
//! assert_eq!(restored, config);
//! ```

pub mod error;
pub mod mixer_config;
pub mod store;

pub use error::ConfigError;
pub use mixer_config::{
    CONFIG_KEY, ChannelConfig, DEFAULT_CHANNEL_VOLUME, DEFAULT_MASTER_VOLUME, MIDI_DEVICE_KEY,
    MappingKind,
    MidiChannelFilter, MidiMapping, MixerConfig,
};
pub use store::{FileKvStore, KvStore, MemoryKvStore};
