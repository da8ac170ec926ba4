//! MIDI control routing: device selection, learn mode, and dispatch.
//!
//! One router serves the whole rack. Learn mode is a single global slot:
//! arming a second channel transfers the pending learn rather than queueing,
//! and the next control-change message binds whichever channel is armed.

use std::collections::HashMap;

use mesa_config::{MappingKind, MidiChannelFilter, MidiMapping};

/// Device filter value meaning "listen to every input".
pub const ALL_DEVICES: &str = "all";

/// Control-change status nibble.
const STATUS_CONTROL_CHANGE: u8 = 0xB0;

/// Connection state of the MIDI subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiState {
    /// No connection attempted yet.
    Idle,
    /// Waiting for the platform to grant access.
    Connecting,
    /// Access granted, ports enumerated.
    Connected,
    /// Access denied or unsupported.
    Unavailable(String),
}

/// One enumerable MIDI input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    /// Platform port identifier.
    pub id: String,
    /// Human-readable port name.
    pub name: String,
}

/// What the engine should do in response to an incoming message.
#[derive(Debug, Clone, PartialEq)]
pub enum MidiAction {
    /// Learn mode captured a controller for a channel. The captured value
    /// is applied immediately so the fader snaps to the hardware position.
    MappingLearned {
        /// Channel that was armed.
        channel_id: String,
        /// The new mapping.
        mapping: MidiMapping,
        /// Normalized controller value in [0, 1].
        value: f32,
    },
    /// A mapped controller moved; set the channel's volume fader.
    SetVolume {
        /// Mapped channel.
        channel_id: String,
        /// Normalized controller value in [0, 1].
        value: f32,
    },
}

/// Routes control-change messages to channel faders.
#[derive(Debug)]
pub struct MidiRouter {
    state: MidiState,
    ports: Vec<MidiPortInfo>,
    mappings: HashMap<String, MidiMapping>,
    pending_learn: Option<String>,
    device_filter: String,
}

impl MidiRouter {
    /// Create a router listening to all devices.
    pub fn new() -> Self {
        Self {
            state: MidiState::Idle,
            ports: Vec::new(),
            mappings: HashMap::new(),
            pending_learn: None,
            device_filter: ALL_DEVICES.to_owned(),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> &MidiState {
        &self.state
    }

    /// Enumerated input ports, empty until connected.
    pub fn ports(&self) -> &[MidiPortInfo] {
        &self.ports
    }

    /// Mark a connection attempt as started.
    pub fn begin_connect(&mut self) {
        self.state = MidiState::Connecting;
    }

    /// Record a granted connection and its ports.
    pub fn connection_ready(&mut self, ports: Vec<MidiPortInfo>) {
        tracing::info!(ports = ports.len(), "MIDI connected");
        self.ports = ports;
        self.state = MidiState::Connected;
        self.reconcile_filter();
    }

    /// Record a failed connection attempt.
    pub fn connection_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(reason = %reason, "MIDI unavailable");
        self.state = MidiState::Unavailable(reason);
        self.ports.clear();
    }

    /// Replace the port list after a hot-plug event.
    ///
    /// Returns `true` if the device filter had to fall back to all devices
    /// because its port disappeared.
    pub fn ports_changed(&mut self, ports: Vec<MidiPortInfo>) -> bool {
        self.ports = ports;
        self.reconcile_filter()
    }

    fn reconcile_filter(&mut self) -> bool {
        if self.device_filter != ALL_DEVICES
            && !self.ports.iter().any(|p| p.id == self.device_filter)
        {
            tracing::info!(
                device = %self.device_filter,
                "selected MIDI device disappeared, listening to all"
            );
            self.device_filter = ALL_DEVICES.to_owned();
            return true;
        }
        false
    }

    /// Restrict dispatch to one port id, or [`ALL_DEVICES`].
    pub fn set_device_filter(&mut self, device_id: impl Into<String>) {
        self.device_filter = device_id.into();
    }

    /// Current device filter.
    pub fn device_filter(&self) -> &str {
        &self.device_filter
    }

    /// Arm or disarm learn mode for a channel.
    ///
    /// Arming the already-armed channel disarms it; arming a different
    /// channel transfers the single learn slot. Returns the channel now
    /// armed, if any.
    pub fn start_learn(&mut self, channel_id: &str) -> Option<&str> {
        if self.pending_learn.as_deref() == Some(channel_id) {
            self.pending_learn = None;
        } else {
            self.pending_learn = Some(channel_id.to_owned());
        }
        self.pending_learn.as_deref()
    }

    /// Channel currently armed for learn, if any.
    pub fn pending_learn(&self) -> Option<&str> {
        self.pending_learn.as_deref()
    }

    /// Disarm learn mode if `channel_id` is the armed channel.
    pub fn cancel_learn_for(&mut self, channel_id: &str) {
        if self.pending_learn.as_deref() == Some(channel_id) {
            self.pending_learn = None;
        }
    }

    /// The mapping bound to a channel, if any.
    pub fn mapping_for(&self, channel_id: &str) -> Option<&MidiMapping> {
        self.mappings.get(channel_id)
    }

    /// Bind a mapping to a channel, as when restoring saved state.
    pub fn restore_mapping(&mut self, channel_id: &str, mapping: MidiMapping) {
        self.mappings.insert(channel_id.to_owned(), mapping);
    }

    /// Remove the mapping and any pending learn for a channel.
    pub fn remove_channel(&mut self, channel_id: &str) {
        self.mappings.remove(channel_id);
        self.cancel_learn_for(channel_id);
    }

    /// Handle a raw message from `port_id`.
    ///
    /// Only control-change messages pass; everything else, and messages
    /// from filtered-out ports, produce no actions.
    pub fn handle_message(&mut self, port_id: &str, message: &[u8]) -> Vec<MidiAction> {
        if self.device_filter != ALL_DEVICES && self.device_filter != port_id {
            return Vec::new();
        }
        let [status, controller, data2] = *message else {
            return Vec::new();
        };
        if status & 0xF0 != STATUS_CONTROL_CHANGE {
            return Vec::new();
        }
        let channel = status & 0x0F;
        let value = (f32::from(data2) / 127.0).clamp(0.0, 1.0);

        if let Some(armed) = self.pending_learn.take() {
            // Learn binds the message's exact MIDI channel; the wildcard
            // filter only enters via restored configs.
            let mapping = MidiMapping {
                controller,
                midi_channel: MidiChannelFilter::Exact(channel),
                kind: MappingKind::ControlChange,
            };
            self.mappings.insert(armed.clone(), mapping);
            tracing::info!(
                channel_id = %armed,
                controller,
                midi_channel = channel,
                "MIDI mapping learned"
            );
            return vec![MidiAction::MappingLearned {
                channel_id: armed,
                mapping,
                value,
            }];
        }

        self.mappings
            .iter()
            .filter(|(_, mapping)| mapping.matches(channel, controller))
            .map(|(channel_id, _)| MidiAction::SetVolume {
                channel_id: channel_id.clone(),
                value,
            })
            .collect()
    }
}

impl Default for MidiRouter {
    fn default() -> Self {
        Self::new()
    }
}
