//! Channel input sources: decoded files and live inputs.

use crate::transport::Voice;
use crate::{EngineError, Result};

/// What a channel strip takes its signal from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A decoded audio file played by the transport.
    File,
    /// A microphone, with the platform's voice processing left on.
    Mic,
    /// A USB interface, captured clean and low-latency.
    Usb,
}

impl InputKind {
    /// Stable identifier used in saved state and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Mic => "mic",
            Self::Usb => "usb",
        }
    }

    /// Parse the identifier form back to a kind.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "file" => Some(Self::File),
            "mic" => Some(Self::Mic),
            "usb" => Some(Self::Usb),
            _ => None,
        }
    }
}

/// Capture settings requested when opening a live input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConstraints {
    /// Echo cancellation.
    pub echo_cancellation: bool,
    /// Noise suppression.
    pub noise_suppression: bool,
    /// Automatic gain control.
    pub auto_gain_control: bool,
    /// Requested capture latency in seconds, if any.
    pub latency: Option<f32>,
}

impl StreamConstraints {
    /// Constraints appropriate for a given live input kind.
    ///
    /// USB interfaces get a clean signal path with voice processing off and
    /// a 10 ms latency request; microphones keep the platform defaults.
    pub fn for_kind(kind: InputKind) -> Self {
        match kind {
            InputKind::Usb => Self {
                echo_cancellation: false,
                noise_suppression: false,
                auto_gain_control: false,
                latency: Some(0.01),
            },
            InputKind::File | InputKind::Mic => Self {
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain_control: true,
                latency: None,
            },
        }
    }
}

/// One enumerable capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    /// Platform device identifier.
    pub device_id: String,
    /// Human-readable name, empty until permission is granted.
    pub label: String,
}

/// A running live capture feeding one channel strip.
pub trait LiveSource: Send {
    /// Pull the next stereo frame. Returns silence when no data is buffered.
    fn next_frame(&mut self) -> (f32, f32);

    /// Device the capture is attached to, if known.
    fn device_label(&self) -> Option<&str> {
        None
    }
}

/// Platform capture layer.
///
/// The engine only talks to live inputs through this trait, so tests can
/// drive channels from scripted sources and the cpal implementation stays
/// at the edge.
pub trait InputBackend: Send {
    /// Enumerate available capture devices.
    fn list_devices(&self) -> Result<Vec<InputDeviceInfo>>;

    /// Open a capture stream with the given constraints.
    fn open(&mut self, kind: InputKind, constraints: &StreamConstraints)
    -> Result<Box<dyn LiveSource>>;
}

/// Backend for builds with no capture hardware. Enumerates nothing and
/// refuses to open anything.
#[derive(Debug, Default)]
pub struct NullInputBackend;

impl InputBackend for NullInputBackend {
    fn list_devices(&self) -> Result<Vec<InputDeviceInfo>> {
        Ok(Vec::new())
    }

    fn open(
        &mut self,
        kind: InputKind,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveSource>> {
        Err(EngineError::DeviceNotFound(format!(
            "no capture backend for {} input",
            kind.as_str()
        )))
    }
}

/// What is currently feeding a channel strip.
pub enum Source {
    /// Nothing loaded.
    Silent,
    /// A transport voice playing a decoded buffer.
    File(Voice),
    /// A live capture stream.
    Live(Box<dyn LiveSource>),
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Silent => f.write_str("Source::Silent"),
            Self::File(voice) => f.debug_tuple("Source::File").field(voice).finish(),
            Self::Live(_) => f.write_str("Source::Live"),
        }
    }
}
