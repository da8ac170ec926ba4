//! cpal-backed audio I/O for the mixer.
//!
//! Everything platform-specific lives here: output streaming pulls frames
//! from the shared [`Mixer`], and [`CpalInputBackend`] turns capture
//! devices into [`LiveSource`]s for live channel strips. The rest of the
//! engine never sees a cpal type.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::mixer::{LatencyHint, Mixer};
use crate::source::{InputBackend, InputDeviceInfo, InputKind, LiveSource, StreamConstraints};
use crate::{EngineError, Result};

/// Output buffer size per latency preference, in frames.
fn buffer_size_for(hint: LatencyHint) -> u32 {
    match hint {
        LatencyHint::Interactive => 256,
        LatencyHint::Balanced => 1024,
        LatencyHint::Playback => 4096,
    }
}

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Keeps a running stream alive; dropping it stops the stream.
///
/// The inner value is `Box<dyn Send>`, keeping backend types out of
/// engine code.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap any stream object in a handle.
    pub fn new(stream: impl Send + 'static) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Start an output stream that renders the mixer to the default device.
///
/// The stream runs until the returned handle is dropped. The mixer lock is
/// held only for the duration of each render callback.
pub fn run_output_stream(mixer: Arc<Mutex<Mixer>>) -> Result<StreamHandle> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| EngineError::DeviceNotFound("no default output device".to_owned()))?;

    let options = mixer
        .lock()
        .map_err(|_| EngineError::Init("mixer lock poisoned".to_owned()))?
        .options();
    let stream_config = cpal::StreamConfig {
        channels: 2,
        sample_rate: options.sample_rate,
        buffer_size: cpal::BufferSize::Fixed(buffer_size_for(options.latency_hint)),
    };

    let render_mixer = Arc::clone(&mixer);
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| match render_mixer.lock() {
                Ok(mut mixer) => mixer.render(data),
                Err(_) => data.fill(0.0),
            },
            move |err| {
                tracing::error!(error = %err, "output stream error");
            },
            None,
        )
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    stream.play().map_err(|e| EngineError::Stream(e.to_string()))?;
    tracing::info!(
        sample_rate = options.sample_rate,
        "output stream started"
    );

    Ok(StreamHandle::new(stream))
}

/// A live source fed by a cpal input stream.
///
/// The capture callback pushes blocks over a bounded channel; the render
/// thread drains them into a small queue and hands out frames. If capture
/// outruns rendering the oldest frames are dropped, if it stalls the
/// source reads as silence.
struct CaptureSource {
    rx: mpsc::Receiver<Vec<f32>>,
    queue: VecDeque<(f32, f32)>,
    channels: u16,
    label: String,
    _stream: StreamHandle,
}

/// Upper bound on buffered frames before old ones are dropped.
const MAX_QUEUED_FRAMES: usize = 48000;

impl CaptureSource {
    fn refill(&mut self) {
        while let Ok(block) = self.rx.try_recv() {
            match self.channels {
                1 => {
                    for &s in &block {
                        self.queue.push_back((s, s));
                    }
                }
                _ => {
                    for frame in block.chunks_exact(usize::from(self.channels)) {
                        self.queue.push_back((frame[0], frame[1]));
                    }
                }
            }
        }
        while self.queue.len() > MAX_QUEUED_FRAMES {
            self.queue.pop_front();
        }
    }
}

impl LiveSource for CaptureSource {
    fn next_frame(&mut self) -> (f32, f32) {
        if self.queue.is_empty() {
            self.refill();
        }
        self.queue.pop_front().unwrap_or((0.0, 0.0))
    }

    fn device_label(&self) -> Option<&str> {
        Some(&self.label)
    }
}

/// Capture backend over the platform's default cpal host.
pub struct CpalInputBackend {
    host: Host,
}

impl CpalInputBackend {
    /// Create a backend on the default host.
    pub fn new() -> Self {
        tracing::info!(
            host = cpal::default_host().id().name(),
            "cpal input backend initialized"
        );
        Self {
            host: cpal::default_host(),
        }
    }
}

impl Default for CpalInputBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for CpalInputBackend {
    fn list_devices(&self) -> Result<Vec<InputDeviceInfo>> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        let mut infos = Vec::new();
        for device in devices {
            if let Ok(name) = device_name(&device) {
                infos.push(InputDeviceInfo {
                    device_id: name.clone(),
                    label: name,
                });
            }
        }
        Ok(infos)
    }

    fn open(
        &mut self,
        kind: InputKind,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveSource>> {
        let device = self.host.default_input_device().ok_or_else(|| {
            EngineError::DeviceNotFound(format!("no capture device for {} input", kind.as_str()))
        })?;
        let label = device_name(&device).unwrap_or_default();

        let default_config = device
            .default_input_config()
            .map_err(|e| EngineError::Stream(e.to_string()))?;
        let channels = default_config.channels();

        // cpal has no voice-processing toggles; the constraints only shape
        // the requested buffer size here.
        let buffer_size = match constraints.latency {
            Some(latency) => {
                let frames = (latency * default_config.sample_rate() as f32) as u32;
                cpal::BufferSize::Fixed(frames.max(64))
            }
            None => cpal::BufferSize::Default,
        };
        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: default_config.sample_rate(),
            buffer_size,
        };

        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(8);
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.try_send(data.to_vec());
                },
                move |err| {
                    tracing::error!(error = %err, "input stream error");
                },
                None,
            )
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        stream.play().map_err(|e| EngineError::Stream(e.to_string()))?;
        tracing::info!(
            kind = kind.as_str(),
            device = %label,
            channels,
            "capture stream started"
        );

        Ok(Box::new(CaptureSource {
            rx,
            queue: VecDeque::new(),
            channels,
            label,
            _stream: StreamHandle::new(stream),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        let debug_str = format!("{handle:?}");
        assert!(debug_str.contains("StreamHandle"));
    }

    #[test]
    fn capture_source_reads_silence_when_starved() {
        let (_tx, rx) = mpsc::sync_channel::<Vec<f32>>(1);
        let mut source = CaptureSource {
            rx,
            queue: VecDeque::new(),
            channels: 2,
            label: "test".to_owned(),
            _stream: StreamHandle::new(()),
        };
        assert_eq!(source.next_frame(), (0.0, 0.0));
    }

    #[test]
    fn capture_source_deinterleaves_and_duplicates_mono() {
        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(4);
        let mut stereo = CaptureSource {
            rx,
            queue: VecDeque::new(),
            channels: 2,
            label: "test".to_owned(),
            _stream: StreamHandle::new(()),
        };
        tx.try_send(vec![0.1, -0.1, 0.2, -0.2]).unwrap();
        assert_eq!(stereo.next_frame(), (0.1, -0.1));
        assert_eq!(stereo.next_frame(), (0.2, -0.2));

        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(4);
        let mut mono = CaptureSource {
            rx,
            queue: VecDeque::new(),
            channels: 1,
            label: "test".to_owned(),
            _stream: StreamHandle::new(()),
        };
        tx.try_send(vec![0.5]).unwrap();
        assert_eq!(mono.next_frame(), (0.5, 0.5));
    }
}
