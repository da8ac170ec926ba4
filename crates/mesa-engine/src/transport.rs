//! File playback: decoding, buffer caching, and voices.
//!
//! Decoded audio is cached by file identity so re-loading the same file
//! into another channel never decodes twice. Playback itself is done by
//! short-lived [`Voice`]s; pausing tears the voice down and resuming
//! builds a new one at the saved offset, so a voice is always a one-shot.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use crate::{EngineError, Result};

/// Identity of an imported file: name, byte size, and modification time.
///
/// Two imports with the same identity share one decoded buffer, whatever
/// path they arrived by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    /// File name as presented by the importer.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification timestamp in milliseconds since the epoch.
    pub modified: u64,
}

impl FileId {
    /// Cache key string for this identity.
    pub fn cache_key(&self) -> String {
        format!("{}_{}_{}", self.name, self.size, self.modified)
    }
}

/// A decoded stereo buffer.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
    /// Native sample rate of the decoded data.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Decode a WAV file held in memory.
    ///
    /// Mono files play on both channels; files with more than two channels
    /// are rejected. Integer samples of any supported width are scaled to
    /// [-1, 1].
    pub fn from_wav_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
            EngineError::Decode {
                name: name.to_owned(),
                reason: e.to_string(),
            }
        })?;
        let spec = reader.spec();
        if spec.channels == 0 || spec.channels > 2 {
            return Err(EngineError::Decode {
                name: name.to_owned(),
                reason: format!("unsupported channel count: {}", spec.channels),
            });
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| EngineError::Decode {
                    name: name.to_owned(),
                    reason: e.to_string(),
                })?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| EngineError::Decode {
                        name: name.to_owned(),
                        reason: e.to_string(),
                    })?
            }
        };

        let (left, right) = if spec.channels == 1 {
            (interleaved.clone(), interleaved)
        } else {
            let mut left = Vec::with_capacity(interleaved.len() / 2);
            let mut right = Vec::with_capacity(interleaved.len() / 2);
            for frame in interleaved.chunks_exact(2) {
                left.push(frame[0]);
                right.push(frame[1]);
            }
            (left, right)
        };

        Ok(Self {
            left,
            right,
            sample_rate: spec.sample_rate,
        })
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether the buffer holds no audio.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Duration in seconds at the buffer's native rate.
    pub fn duration(&self) -> f64 {
        self.left.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Cache of decoded buffers, keyed by file identity.
#[derive(Debug, Default)]
pub struct BufferCache {
    entries: HashMap<String, Arc<AudioBuffer>>,
    decode_count: usize,
}

impl BufferCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached buffer for `id`, decoding `bytes` only on a miss.
    pub fn fetch_or_decode(&mut self, id: &FileId, bytes: &[u8]) -> Result<Arc<AudioBuffer>> {
        let key = id.cache_key();
        if let Some(buffer) = self.entries.get(&key) {
            tracing::debug!(key = %key, "buffer cache hit");
            return Ok(Arc::clone(buffer));
        }

        let buffer = Arc::new(AudioBuffer::from_wav_bytes(&id.name, bytes)?);
        self.decode_count += 1;
        tracing::info!(
            key = %key,
            frames = buffer.len(),
            sample_rate = buffer.sample_rate,
            "decoded audio file"
        );
        self.entries.insert(key, Arc::clone(&buffer));
        Ok(buffer)
    }

    /// Cached buffer for `id`, if present.
    pub fn get(&self, id: &FileId) -> Option<Arc<AudioBuffer>> {
        self.entries.get(&id.cache_key()).cloned()
    }

    /// Number of decodes performed since creation.
    pub fn decode_count(&self) -> usize {
        self.decode_count
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A one-shot playback head over a shared buffer.
///
/// Sample-rate conversion is done here: the voice steps through the buffer
/// at `buffer_rate / engine_rate` and interpolates, so a 44.1 kHz file
/// plays at pitch through a 48 kHz engine.
#[derive(Debug, Clone)]
pub struct Voice {
    buffer: Arc<AudioBuffer>,
    position: f64,
    step: f64,
    looping: bool,
    finished: bool,
}

impl Voice {
    /// Start a voice at `offset_seconds` into the buffer.
    ///
    /// Offsets at or past the end wrap to the start, matching what resume
    /// does when a pause outlives the loop point.
    pub fn new(buffer: Arc<AudioBuffer>, engine_rate: u32, offset_seconds: f64, looping: bool) -> Self {
        let mut offset = offset_seconds;
        if offset < 0.0 || offset >= buffer.duration() {
            offset = 0.0;
        }
        let step = f64::from(buffer.sample_rate) / f64::from(engine_rate);
        Self {
            position: offset * f64::from(buffer.sample_rate),
            buffer,
            step,
            looping,
            finished: false,
        }
    }

    /// Pull the next stereo frame.
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        if self.finished || self.buffer.is_empty() {
            return (0.0, 0.0);
        }

        let len = self.buffer.len();
        let index = self.position as usize;
        let frac = (self.position - index as f64) as f32;
        let next = if index + 1 < len {
            index + 1
        } else if self.looping {
            0
        } else {
            index
        };

        let l = self.buffer.left[index] + (self.buffer.left[next] - self.buffer.left[index]) * frac;
        let r =
            self.buffer.right[index] + (self.buffer.right[next] - self.buffer.right[index]) * frac;

        self.position += self.step;
        if self.position >= len as f64 {
            if self.looping {
                self.position %= len as f64;
            } else {
                self.finished = true;
            }
        }

        (l, r)
    }

    /// Current playback offset in seconds.
    pub fn position_seconds(&self) -> f64 {
        self.position / f64::from(self.buffer.sample_rate)
    }

    /// Whether a non-looping voice has run off the end.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// The buffer this voice plays.
    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }
}

/// Format a position in seconds as `MM:SS` for the strip timer.
///
/// Seconds are rounded to the nearest whole second; negative or
/// non-finite inputs read as zero.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
