//! One channel strip: source, EQ, sends, pan, fader, and meter tap.

use std::sync::Arc;

use mesa_config::{ChannelConfig, DEFAULT_CHANNEL_VOLUME};
use mesa_core::{AnalyserTap, pan_gains};
use mesa_effects::{Chorus, Delay, EffectUnit, Reverb, ThreeBandEq};

use crate::source::{InputKind, LiveSource, Source};
use crate::transport::{AudioBuffer, FileId, Voice, format_time};

/// Playback state of a strip's transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayState {
    /// Nothing running.
    Stopped,
    /// Audio flowing.
    Playing,
    /// File playback held at an offset, in seconds.
    Paused(f64),
}

/// A complete strip in the rack.
///
/// The signal path is fixed: source, EQ, reverb, delay, chorus, pan, fader.
/// The post-fader signal is what the meter tap sees and what the strip
/// contributes to the master bus.
pub struct ChannelStrip {
    id: String,
    name: String,
    input_kind: InputKind,
    source: Source,
    loaded: Option<(FileId, Arc<AudioBuffer>)>,
    state: PlayState,
    eq: ThreeBandEq,
    reverb: Reverb,
    delay: Delay,
    chorus: Chorus,
    pan: f32,
    volume: f32,
    /// Gate over live sources; "stopping" a live strip mutes it here
    /// rather than tearing the capture stream down.
    live_gate: f32,
    tap: AnalyserTap,
    sample_rate: u32,
}

impl ChannelStrip {
    /// Create a silent file-input strip.
    pub fn new(id: impl Into<String>, name: impl Into<String>, sample_rate: u32) -> Self {
        let rate = sample_rate as f32;
        Self {
            id: id.into(),
            name: name.into(),
            input_kind: InputKind::File,
            source: Source::Silent,
            loaded: None,
            state: PlayState::Stopped,
            eq: ThreeBandEq::new(rate),
            reverb: Reverb::new(rate),
            delay: Delay::new(rate),
            chorus: Chorus::new(rate),
            pan: 0.0,
            volume: DEFAULT_CHANNEL_VOLUME,
            live_gate: 1.0,
            tap: AnalyserTap::default(),
            sample_rate,
        }
    }

    /// Strip identifier, stable for the strip's lifetime.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the strip.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current input kind.
    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    /// Current transport state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// The identity of the loaded file, if any.
    pub fn loaded_file(&self) -> Option<&FileId> {
        self.loaded.as_ref().map(|(id, _)| id)
    }

    // --- source management ---

    /// Attach a decoded buffer, replacing whatever was loaded.
    ///
    /// The transport resets to stopped; playback starts from zero on the
    /// next toggle.
    pub fn set_buffer(&mut self, file: FileId, buffer: Arc<AudioBuffer>) {
        tracing::info!(
            channel = %self.id,
            file = %file.name,
            duration = buffer.duration(),
            "buffer attached"
        );
        self.loaded = Some((file, buffer));
        self.input_kind = InputKind::File;
        self.source = Source::Silent;
        self.state = PlayState::Stopped;
    }

    /// Attach a live capture stream. Live strips run immediately and take
    /// the device label as their display name when one is known.
    pub fn set_live_source(&mut self, kind: InputKind, stream: Box<dyn LiveSource>) {
        if let Some(label) = stream.device_label()
            && !label.is_empty()
        {
            self.name = label.to_owned();
        }
        self.input_kind = kind;
        self.source = Source::Live(stream);
        self.loaded = None;
        self.live_gate = 1.0;
        self.state = PlayState::Playing;
    }

    /// Drop the current source and return to a silent file strip.
    pub fn clear_source(&mut self) {
        self.source = Source::Silent;
        self.loaded = None;
        self.input_kind = InputKind::File;
        self.state = PlayState::Stopped;
    }

    /// Toggle play/pause.
    ///
    /// For file strips this swaps the voice out and back in at the held
    /// offset, since a voice is single-use. For live strips it opens and
    /// closes the gate. Returns the new state.
    pub fn toggle_play(&mut self) -> PlayState {
        let is_live = matches!(self.source, Source::Live(_));
        match (is_live, self.state) {
            (true, PlayState::Playing) => {
                self.live_gate = 0.0;
                self.state = PlayState::Stopped;
            }
            (true, _) => {
                self.live_gate = 1.0;
                self.state = PlayState::Playing;
            }
            (false, PlayState::Playing) => {
                let offset = match &self.source {
                    Source::File(voice) => voice.position_seconds(),
                    _ => 0.0,
                };
                self.source = Source::Silent;
                self.state = PlayState::Paused(offset);
            }
            (false, PlayState::Paused(offset)) => {
                if let Some((_, buffer)) = &self.loaded {
                    self.source = Source::File(Voice::new(
                        Arc::clone(buffer),
                        self.sample_rate,
                        offset,
                        true,
                    ));
                    self.state = PlayState::Playing;
                }
            }
            (false, PlayState::Stopped) => {
                if let Some((_, buffer)) = &self.loaded {
                    self.source =
                        Source::File(Voice::new(Arc::clone(buffer), self.sample_rate, 0.0, true));
                    self.state = PlayState::Playing;
                }
            }
        }
        self.state
    }

    /// Stop playback outright, discarding any pause offset.
    pub fn stop(&mut self) {
        if matches!(self.source, Source::Live(_)) {
            self.live_gate = 0.0;
        } else {
            self.source = Source::Silent;
        }
        self.state = PlayState::Stopped;
    }

    // --- parameters ---

    /// Set the fader level, clamped to [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Current fader level.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the stereo position, clamped to [-1, 1].
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    /// Current stereo position.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Set the low-shelf EQ gain in dB.
    pub fn set_eq_low(&mut self, gain_db: f32) {
        self.eq.set_low_gain(gain_db);
    }

    /// Set the mid-band EQ gain in dB.
    pub fn set_eq_mid(&mut self, gain_db: f32) {
        self.eq.set_mid_gain(gain_db);
    }

    /// Set the high-shelf EQ gain in dB.
    pub fn set_eq_high(&mut self, gain_db: f32) {
        self.eq.set_high_gain(gain_db);
    }

    /// Set the reverb send (wet level), clamped to [0, 1].
    pub fn set_reverb_send(&mut self, level: f32) {
        self.reverb.set_wet(level);
    }

    /// Set the delay send (wet level), clamped to [0, 1].
    pub fn set_delay_send(&mut self, level: f32) {
        self.delay.set_wet(level);
    }

    /// Set the chorus send (wet level), clamped to [0, 1].
    pub fn set_chorus_send(&mut self, level: f32) {
        self.chorus.set_wet(level);
    }

    /// Apply persisted settings to the strip.
    pub fn apply_config(&mut self, config: &ChannelConfig) {
        let config = config.sanitized();
        self.eq.set_low_gain(config.eq_low);
        self.eq.set_mid_gain(config.eq_mid);
        self.eq.set_high_gain(config.eq_high);
        self.pan = config.pan;
        self.volume = config.volume;
        self.reverb.set_wet(config.reverb_send);
        self.delay.set_wet(config.delay_send);
        self.chorus.set_wet(config.chorus_send);
    }

    /// Snapshot the strip's settings for persistence.
    ///
    /// The MIDI mapping field is left empty; the mixer fills it in from
    /// the router when saving.
    pub fn current_config(&self) -> ChannelConfig {
        let (low, mid, high) = self.eq.gains();
        ChannelConfig {
            eq_low: low,
            eq_mid: mid,
            eq_high: high,
            pan: self.pan,
            volume: self.volume,
            reverb_send: self.reverb.wet(),
            delay_send: self.delay.wet(),
            chorus_send: self.chorus.wet(),
            midi_mapping: None,
        }
    }

    // --- audio ---

    /// Render one post-fader stereo frame and feed the meter tap.
    #[inline]
    pub fn process_frame(&mut self) -> (f32, f32) {
        let (src_l, src_r) = match &mut self.source {
            Source::Silent => (0.0, 0.0),
            Source::File(voice) => voice.next_frame(),
            Source::Live(stream) => {
                let (l, r) = stream.next_frame();
                (l * self.live_gate, r * self.live_gate)
            }
        };

        let (l, r) = self.eq.process_stereo(src_l, src_r);
        let (l, r) = self.reverb.process_stereo(l, r);
        let (l, r) = self.delay.process_stereo(l, r);
        let (l, r) = self.chorus.process_stereo(l, r);

        let (gain_l, gain_r) = pan_gains(self.pan);
        let out_l = l * gain_l * self.volume;
        let out_r = r * gain_r * self.volume;

        self.tap.write_block(&[(out_l + out_r) * 0.5]);
        (out_l, out_r)
    }

    /// Snapshot the meter tap into `out` (must be the tap's length).
    pub fn tap_snapshot(&self, out: &mut [f32]) {
        self.tap.snapshot(out);
    }

    /// Tap length in samples.
    pub fn tap_len(&self) -> usize {
        self.tap.len()
    }

    /// Strip timer string, `MM:SS / MM:SS` (elapsed over total).
    pub fn timer_display(&self) -> String {
        let seconds = match (&self.source, self.state) {
            (Source::File(voice), PlayState::Playing) => voice.position_seconds(),
            (_, PlayState::Paused(offset)) => offset,
            _ => 0.0,
        };
        let total = self
            .loaded
            .as_ref()
            .map_or(0.0, |(_, buffer)| buffer.duration());
        format!("{} / {}", format_time(seconds), format_time(total))
    }

    /// Release everything the strip holds.
    ///
    /// Each step is independent so one failure mode never leaks the rest;
    /// what can fail here is logged rather than returned.
    pub fn teardown(&mut self) {
        tracing::debug!(channel = %self.id, "tearing down strip");
        self.source = Source::Silent;
        self.loaded = None;
        self.state = PlayState::Stopped;
        self.reverb.reset();
        self.delay.reset();
        self.chorus.reset();
        self.eq.reset();
        self.tap.clear();
    }
}

impl std::fmt::Debug for ChannelStrip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelStrip")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("input_kind", &self.input_kind)
            .field("state", &self.state)
            .field("volume", &self.volume)
            .field("pan", &self.pan)
            .finish_non_exhaustive()
    }
}
