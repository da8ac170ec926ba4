//! Serialized mixer state.
//!
//! The wire format is a camelCase JSON document so saved state stays
//! readable and hand-editable:
//!
//! ```json
//! {
//!   "masterVolume": 0.8,
//!   "channels": [
//!     {
//!       "eqLow": 0.0, "eqMid": 0.0, "eqHigh": 0.0,
//!       "pan": 0.0, "volume": 0.75,
//!       "reverbSend": 0.0, "delaySend": 0.0, "chorusSend": 0.0,
//!       "midiMapping": { "controller": 7, "midiChannel": "any", "kind": "cc" }
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Store key for the serialized [`MixerConfig`].
pub const CONFIG_KEY: &str = "audioMixerConfig";

/// Store key for the preferred MIDI input device id.
pub const MIDI_DEVICE_KEY: &str = "mixerSelectedMidiDevice";

/// Default master volume applied when no saved state exists.
pub const DEFAULT_MASTER_VOLUME: f32 = 0.8;

/// Default channel fader level.
pub const DEFAULT_CHANNEL_VOLUME: f32 = 0.75;

/// Which MIDI channel a mapping listens on.
///
/// On the wire an exact channel is a bare number and the wildcard is the
/// string `"any"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiChannelFilter {
    /// Match one channel (0-15).
    Exact(u8),
    /// Match any channel.
    Any,
}

impl Serialize for MidiChannelFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exact(channel) => serializer.serialize_u8(*channel),
            Self::Any => serializer.serialize_str("any"),
        }
    }
}

impl<'de> Deserialize<'de> for MidiChannelFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u8),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(channel) if channel < 16 => Ok(Self::Exact(channel)),
            Repr::Number(channel) => Err(D::Error::custom(format!(
                "MIDI channel out of range: {channel}"
            ))),
            Repr::Text(text) if text == "any" => Ok(Self::Any),
            Repr::Text(text) => Err(D::Error::custom(format!(
                "expected a channel number or \"any\", got \"{text}\""
            ))),
        }
    }
}

/// Kind of MIDI message a mapping reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingKind {
    /// Control change.
    #[serde(rename = "cc")]
    ControlChange,
}

/// A learned MIDI assignment for one channel's volume fader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiMapping {
    /// Controller number (0-127).
    pub controller: u8,
    /// Channel filter the mapping listens on.
    pub midi_channel: MidiChannelFilter,
    /// Message kind.
    pub kind: MappingKind,
}

impl MidiMapping {
    /// A control-change mapping matching any MIDI channel.
    pub fn control_change(controller: u8) -> Self {
        Self {
            controller,
            midi_channel: MidiChannelFilter::Any,
            kind: MappingKind::ControlChange,
        }
    }

    /// Whether an incoming control-change on `channel`/`controller` matches.
    pub fn matches(&self, channel: u8, controller: u8) -> bool {
        if self.controller != controller {
            return false;
        }
        match self.midi_channel {
            MidiChannelFilter::Any => true,
            MidiChannelFilter::Exact(wanted) => wanted == channel,
        }
    }
}

/// Persisted settings for one channel strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    /// Low-shelf gain in dB.
    pub eq_low: f32,
    /// Mid-band gain in dB.
    pub eq_mid: f32,
    /// High-shelf gain in dB.
    pub eq_high: f32,
    /// Stereo position, -1 (left) to 1 (right).
    pub pan: f32,
    /// Fader level, 0 to 1.
    pub volume: f32,
    /// Reverb send level, 0 to 1.
    #[serde(default)]
    pub reverb_send: f32,
    /// Delay send level, 0 to 1.
    #[serde(default)]
    pub delay_send: f32,
    /// Chorus send level, 0 to 1.
    #[serde(default)]
    pub chorus_send: f32,
    /// Learned MIDI assignment, if any.
    #[serde(default)]
    pub midi_mapping: Option<MidiMapping>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            eq_low: 0.0,
            eq_mid: 0.0,
            eq_high: 0.0,
            pan: 0.0,
            volume: DEFAULT_CHANNEL_VOLUME,
            reverb_send: 0.0,
            delay_send: 0.0,
            chorus_send: 0.0,
            midi_mapping: None,
        }
    }
}

impl ChannelConfig {
    /// Copy of this config with every field clamped to its valid range.
    pub fn sanitized(&self) -> Self {
        Self {
            eq_low: self.eq_low.clamp(-15.0, 15.0),
            eq_mid: self.eq_mid.clamp(-15.0, 15.0),
            eq_high: self.eq_high.clamp(-15.0, 15.0),
            pan: self.pan.clamp(-1.0, 1.0),
            volume: self.volume.clamp(0.0, 1.0),
            reverb_send: self.reverb_send.clamp(0.0, 1.0),
            delay_send: self.delay_send.clamp(0.0, 1.0),
            chorus_send: self.chorus_send.clamp(0.0, 1.0),
            midi_mapping: self.midi_mapping,
        }
    }
}

/// The complete persisted mixer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerConfig {
    /// Master output level, 0 to 1.
    pub master_volume: f32,
    /// Per-strip settings, in rack order.
    pub channels: Vec<ChannelConfig>,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            master_volume: DEFAULT_MASTER_VOLUME,
            channels: Vec::new(),
        }
    }
}

impl MixerConfig {
    /// Parse a config from its JSON wire form.
    pub fn from_json(text: &str) -> Result<Self, crate::ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<String, crate::ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Copy with the master volume and every channel clamped to range.
    pub fn sanitized(&self) -> Self {
        Self {
            master_volume: self.master_volume.clamp(0.0, 1.0),
            channels: self.channels.iter().map(ChannelConfig::sanitized).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_camel_case_keys() {
        let mut config = MixerConfig::default();
        config.channels.push(ChannelConfig {
            eq_low: -3.0,
            midi_mapping: Some(MidiMapping::control_change(7)),
            ..ChannelConfig::default()
        });

        let json = config.to_json().unwrap();
        assert!(json.contains("\"masterVolume\""), "got: {json}");
        assert!(json.contains("\"eqLow\""), "got: {json}");
        assert!(json.contains("\"midiMapping\""), "got: {json}");
        assert!(json.contains("\"midiChannel\":\"any\""), "got: {json}");
        assert!(json.contains("\"kind\":\"cc\""), "got: {json}");
        assert!(!json.contains("master_volume"), "got: {json}");
    }

    #[test]
    fn missing_sends_default_to_zero() {
        let json = r#"{
            "masterVolume": 0.5,
            "channels": [
                {"eqLow": 1.0, "eqMid": 0.0, "eqHigh": -2.0, "pan": 0.25, "volume": 0.9}
            ]
        }"#;
        let config = MixerConfig::from_json(json).unwrap();
        let ch = &config.channels[0];
        assert_eq!(ch.reverb_send, 0.0);
        assert_eq!(ch.delay_send, 0.0);
        assert_eq!(ch.chorus_send, 0.0);
        assert!(ch.midi_mapping.is_none());
    }

    #[test]
    fn exact_midi_channel_round_trips_as_number() {
        let mapping = MidiMapping {
            controller: 20,
            midi_channel: MidiChannelFilter::Exact(3),
            kind: MappingKind::ControlChange,
        };
        let json = serde_json::to_string(&mapping).unwrap();
        assert!(json.contains("\"midiChannel\":3"), "got: {json}");
        let back: MidiMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }

    #[test]
    fn mapping_matches_respects_channel_filter() {
        let any = MidiMapping::control_change(7);
        assert!(any.matches(0, 7));
        assert!(any.matches(15, 7));
        assert!(!any.matches(0, 8));

        let exact = MidiMapping {
            controller: 7,
            midi_channel: MidiChannelFilter::Exact(2),
            kind: MappingKind::ControlChange,
        };
        assert!(exact.matches(2, 7));
        assert!(!exact.matches(3, 7));
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = MixerConfig {
            master_volume: 4.0,
            channels: vec![ChannelConfig {
                eq_low: 99.0,
                eq_mid: -99.0,
                eq_high: 0.0,
                pan: -2.0,
                volume: 1.5,
                reverb_send: -0.5,
                delay_send: 2.0,
                chorus_send: 0.5,
                midi_mapping: None,
            }],
        };
        let clean = config.sanitized();
        assert_eq!(clean.master_volume, 1.0);
        let ch = &clean.channels[0];
        assert_eq!((ch.eq_low, ch.eq_mid), (15.0, -15.0));
        assert_eq!(ch.pan, -1.0);
        assert_eq!(ch.volume, 1.0);
        assert_eq!((ch.reverb_send, ch.delay_send, ch.chorus_send), (0.0, 1.0, 0.5));
    }
}
