//! The mixer: channel registry, master bus, and every control-plane flow.

use std::sync::Arc;

use mesa_config::{CONFIG_KEY, ChannelConfig, KvStore, MIDI_DEVICE_KEY, MixerConfig};
use mesa_core::AnalyserTap;

use crate::channel::{ChannelStrip, PlayState};
use crate::meter::{MeterBank, MeterReading, MeterScale, TimeDomainData};
use crate::midi::{ALL_DEVICES, MidiAction, MidiPortInfo, MidiRouter, MidiState};
use crate::notice::{Notice, NoticeCenter};
use crate::source::{InputBackend, InputDeviceInfo, InputKind, NullInputBackend, StreamConstraints};
use crate::transport::{BufferCache, FileId};
use crate::{EngineError, Result};

/// How much output latency to trade for stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatencyHint {
    /// Lowest latency the platform will give, for live control.
    #[default]
    Interactive,
    /// Middle ground.
    Balanced,
    /// Larger buffers for uninterrupted playback.
    Playback,
}

/// Engine construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerOptions {
    /// Render sample rate in Hz.
    pub sample_rate: u32,
    /// Latency preference passed to the output backend.
    pub latency_hint: LatencyHint,
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            latency_hint: LatencyHint::Interactive,
        }
    }
}

/// One metering pass over the whole rack.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterFrame {
    /// The master bus reading.
    pub master: MeterReading,
    /// Per-channel readings, in rack order.
    pub channels: Vec<(String, MeterReading)>,
}

/// The studio rack.
///
/// Starts suspended, mirroring platform autoplay rules: the first
/// [`handle_user_gesture`] call un-suspends it, and a suspended mixer
/// renders silence without advancing its clock.
///
/// [`handle_user_gesture`]: Mixer::handle_user_gesture
pub struct Mixer {
    options: MixerOptions,
    suspended: bool,
    master_volume: f32,
    master_tap: AnalyserTap,
    channels: Vec<ChannelStrip>,
    next_channel: u64,
    cache: BufferCache,
    meters: MeterBank,
    midi: MidiRouter,
    notices: NoticeCenter,
    input_backend: Box<dyn InputBackend>,
    frames_rendered: u64,
    snapshot_scratch: Vec<f32>,
}

impl Mixer {
    /// Create a mixer with no capture hardware attached.
    pub fn new(options: MixerOptions) -> Self {
        Self::with_input_backend(options, Box::new(NullInputBackend))
    }

    /// Create a mixer over a specific capture backend.
    pub fn with_input_backend(options: MixerOptions, input_backend: Box<dyn InputBackend>) -> Self {
        tracing::info!(
            sample_rate = options.sample_rate,
            latency_hint = ?options.latency_hint,
            "mixer created (suspended)"
        );
        let master_tap = AnalyserTap::default();
        let snapshot_scratch = vec![0.0; master_tap.len()];
        let mut notices = NoticeCenter::new();
        notices.post(Notice::info(
            "Audio output is suspended until you interact with the rack",
        ));
        Self {
            options,
            suspended: true,
            master_volume: mesa_config::DEFAULT_MASTER_VOLUME,
            master_tap,
            channels: Vec::new(),
            next_channel: 0,
            cache: BufferCache::new(),
            meters: MeterBank::new(),
            midi: MidiRouter::new(),
            notices,
            input_backend,
            frames_rendered: 0,
            snapshot_scratch,
        }
    }

    /// Construction options.
    pub fn options(&self) -> MixerOptions {
        self.options
    }

    /// Whether the mixer is still waiting for a user gesture.
    pub fn suspended(&self) -> bool {
        self.suspended
    }

    /// Resume the engine on the first user gesture. Later calls are no-ops.
    pub fn handle_user_gesture(&mut self) {
        if self.suspended {
            self.suspended = false;
            tracing::info!("mixer resumed by user gesture");
        }
    }

    /// Engine clock in seconds: audio actually rendered, not wall time.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / f64::from(self.options.sample_rate)
    }

    /// Pending user notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    // --- master bus ---

    /// Set the master output level, clamped to [0, 1].
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Current master output level.
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    // --- channel registry ---

    /// Add a strip to the rack and return its id.
    ///
    /// Ids are monotonic and never reused, so a removed channel's id can
    /// never collide with a later one.
    pub fn add_channel(&mut self) -> String {
        self.next_channel += 1;
        let id = format!("channel-{}", self.next_channel);
        let name = format!("Channel {}", self.next_channel);
        tracing::info!(channel = %id, "channel added");
        self.channels
            .push(ChannelStrip::new(id.clone(), name, self.options.sample_rate));
        id
    }

    /// Add a strip pre-loaded with saved settings.
    pub fn add_channel_with_config(&mut self, config: &ChannelConfig) -> String {
        let id = self.add_channel();
        if let Ok(strip) = self.channel_mut(&id) {
            strip.apply_config(config);
        }
        if let Some(mapping) = config.midi_mapping {
            self.midi.restore_mapping(&id, mapping);
        }
        id
    }

    /// Remove a strip, releasing its source, meter state, and MIDI binding.
    pub fn remove_channel(&mut self, id: &str) -> Result<()> {
        let index = self
            .channels
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| EngineError::ChannelNotFound(id.to_owned()))?;
        let mut strip = self.channels.remove(index);
        strip.teardown();
        self.meters.remove(id);
        self.midi.remove_channel(id);
        tracing::info!(channel = %id, "channel removed");
        Ok(())
    }

    /// Number of strips in the rack.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Iterate the strips in rack order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelStrip> {
        self.channels.iter()
    }

    /// Borrow a strip by id.
    pub fn channel(&self, id: &str) -> Result<&ChannelStrip> {
        self.channels
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| EngineError::ChannelNotFound(id.to_owned()))
    }

    /// Mutably borrow a strip by id.
    pub fn channel_mut(&mut self, id: &str) -> Result<&mut ChannelStrip> {
        self.channels
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| EngineError::ChannelNotFound(id.to_owned()))
    }

    // --- sources ---

    /// Enumerate capture devices from the attached backend.
    pub fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>> {
        self.input_backend.list_devices()
    }

    /// Switch a strip's input kind.
    ///
    /// Selecting a live kind opens a capture stream with the constraints
    /// appropriate for that kind. If the stream cannot be opened the strip
    /// reverts to a file input and the failure is surfaced as a notice as
    /// well as returned.
    pub fn set_input_type(&mut self, id: &str, kind: InputKind) -> Result<()> {
        self.channel(id)?;
        match kind {
            InputKind::File => {
                self.channel_mut(id)?.clear_source();
                Ok(())
            }
            InputKind::Mic | InputKind::Usb => {
                let constraints = StreamConstraints::for_kind(kind);
                match self.input_backend.open(kind, &constraints) {
                    Ok(stream) => {
                        self.channel_mut(id)?.set_live_source(kind, stream);
                        Ok(())
                    }
                    Err(err) => {
                        tracing::warn!(
                            channel = %id,
                            kind = kind.as_str(),
                            error = %err,
                            "live input failed, reverting to file"
                        );
                        self.channel_mut(id)?.clear_source();
                        self.notices.post(Notice::error(format!(
                            "Could not open {} input: {err}",
                            kind.as_str()
                        )));
                        Err(err)
                    }
                }
            }
        }
    }

    /// Import a file into a strip, decoding through the shared cache.
    ///
    /// The decode is keyed by file identity, so loading the same file into
    /// several strips decodes once. If the strip was removed while the
    /// decode ran, the result is dropped silently; the buffer stays cached.
    ///
    /// With `auto_play` set the strip starts looped playback as soon as the
    /// buffer is attached.
    pub fn load_audio_file(
        &mut self,
        id: &str,
        file: FileId,
        bytes: &[u8],
        auto_play: bool,
    ) -> Result<()> {
        let buffer = match self.cache.fetch_or_decode(&file, bytes) {
            Ok(buffer) => buffer,
            Err(err) => {
                self.notices
                    .post(Notice::error(format!("Could not load {}: {err}", file.name)));
                return Err(err);
            }
        };

        let Ok(strip) = self.channel_mut(id) else {
            tracing::debug!(channel = %id, file = %file.name, "channel gone, dropping decode");
            return Ok(());
        };
        let name = file.name.clone();
        strip.set_buffer(file, Arc::clone(&buffer));
        if auto_play {
            strip.toggle_play();
        }
        self.notices.post(Notice::success(format!("Loaded {name}")));
        Ok(())
    }

    /// Decode statistics, for diagnostics.
    pub fn decode_count(&self) -> usize {
        self.cache.decode_count()
    }

    // --- transport ---

    /// Toggle play/pause on one strip.
    pub fn toggle_play(&mut self, id: &str) -> Result<PlayState> {
        Ok(self.channel_mut(id)?.toggle_play())
    }

    /// Start every strip that has something to play. Paused strips resume
    /// from their held offset.
    pub fn play_all(&mut self) {
        for strip in &mut self.channels {
            if !matches!(strip.state(), PlayState::Playing) {
                strip.toggle_play();
            }
        }
    }

    /// Pause every playing strip, holding file offsets so a later start
    /// resumes where each strip left off. Live strips are muted rather
    /// than torn down, so stopping and starting the rack never loses a
    /// capture stream.
    pub fn stop_all(&mut self) {
        for strip in &mut self.channels {
            if matches!(strip.state(), PlayState::Playing) {
                strip.toggle_play();
            }
        }
    }

    /// One master transport button: if anything is playing, pause the whole
    /// rack; otherwise start it. Returns `true` when the rack is now playing.
    pub fn toggle_all_channels(&mut self) -> bool {
        let any_playing = self
            .channels
            .iter()
            .any(|strip| matches!(strip.state(), PlayState::Playing));
        if any_playing {
            self.stop_all();
        } else {
            self.play_all();
        }
        !any_playing
    }

    // --- rendering ---

    /// Render interleaved stereo into `out`.
    ///
    /// A suspended mixer writes silence and leaves the clock alone, so
    /// resuming later continues exactly where the audio left off.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.suspended {
            out.fill(0.0);
            return;
        }

        for frame in out.chunks_exact_mut(2) {
            let mut sum_l = 0.0;
            let mut sum_r = 0.0;
            for strip in &mut self.channels {
                let (l, r) = strip.process_frame();
                sum_l += l;
                sum_r += r;
            }
            let master_l = sum_l * self.master_volume;
            let master_r = sum_r * self.master_volume;
            self.master_tap.write_block(&[(master_l + master_r) * 0.5]);
            frame[0] = master_l;
            frame[1] = master_r;
        }
        self.frames_rendered += (out.len() / 2) as u64;
    }

    // --- metering ---

    /// Read every meter once.
    ///
    /// Each strip is metered independently; a strip that cannot be read
    /// is skipped rather than failing the pass.
    pub fn update_meters(&mut self) -> MeterFrame {
        self.master_tap.snapshot(&mut self.snapshot_scratch);
        let master = self.meters.update(
            "master",
            MeterScale::Master,
            TimeDomainData::Float(&self.snapshot_scratch),
        );

        let mut channels = Vec::with_capacity(self.channels.len());
        for strip in &self.channels {
            if strip.tap_len() != self.snapshot_scratch.len() {
                tracing::warn!(channel = %strip.id(), "tap size mismatch, skipping meter");
                continue;
            }
            strip.tap_snapshot(&mut self.snapshot_scratch);
            let reading = self.meters.update(
                strip.id(),
                MeterScale::Channel,
                TimeDomainData::Float(&self.snapshot_scratch),
            );
            channels.push((strip.id().to_owned(), reading));
        }

        MeterFrame { master, channels }
    }

    // --- MIDI ---

    /// Connection state of the MIDI subsystem.
    pub fn midi_state(&self) -> &MidiState {
        self.midi.state()
    }

    /// Enumerated MIDI input ports.
    pub fn midi_ports(&self) -> &[MidiPortInfo] {
        self.midi.ports()
    }

    /// Begin a MIDI connection attempt.
    pub fn begin_midi_connect(&mut self) {
        self.midi.begin_connect();
    }

    /// Complete a MIDI connection attempt with the enumerated ports.
    pub fn midi_connection_ready(&mut self, ports: Vec<MidiPortInfo>) {
        self.midi.connection_ready(ports);
    }

    /// Record a failed MIDI connection attempt and notify the user.
    pub fn midi_connection_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.midi.connection_failed(reason.clone());
        self.notices
            .post(Notice::warning(format!("MIDI unavailable: {reason}")));
    }

    /// Update the port list after a hot-plug event.
    pub fn midi_ports_changed(&mut self, ports: Vec<MidiPortInfo>, store: &mut dyn KvStore) {
        if self.midi.ports_changed(ports) {
            self.persist_midi_device(store);
        }
    }

    /// Arm or disarm MIDI learn for a channel.
    pub fn start_midi_learn(&mut self, id: &str) -> Result<Option<String>> {
        self.channel(id)?;
        Ok(self.midi.start_learn(id).map(str::to_owned))
    }

    /// Channel currently armed for MIDI learn.
    pub fn pending_midi_learn(&self) -> Option<&str> {
        self.midi.pending_learn()
    }

    /// Feed a raw MIDI message through the router and apply its actions.
    pub fn handle_midi_message(&mut self, port_id: &str, message: &[u8]) -> Vec<MidiAction> {
        let actions = self.midi.handle_message(port_id, message);
        for action in &actions {
            match action {
                MidiAction::SetVolume { channel_id, value }
                | MidiAction::MappingLearned {
                    channel_id, value, ..
                } => {
                    if let Ok(strip) = self.channel_mut(channel_id) {
                        strip.set_volume(*value);
                    }
                }
            }
        }
        actions
    }

    /// Restrict MIDI dispatch to one port and persist the choice.
    pub fn select_midi_device(&mut self, device_id: &str, store: &mut dyn KvStore) {
        self.midi.set_device_filter(device_id);
        self.persist_midi_device(store);
    }

    /// Currently selected MIDI device filter.
    pub fn midi_device(&self) -> &str {
        self.midi.device_filter()
    }

    /// Restore the persisted MIDI device choice, defaulting to all devices.
    pub fn restore_midi_device(&mut self, store: &dyn KvStore) {
        let device = store
            .get(MIDI_DEVICE_KEY)
            .unwrap_or_else(|| ALL_DEVICES.to_owned());
        self.midi.set_device_filter(device);
    }

    fn persist_midi_device(&mut self, store: &mut dyn KvStore) {
        if let Err(err) = store.set(MIDI_DEVICE_KEY, self.midi.device_filter()) {
            tracing::warn!(error = %err, "could not persist MIDI device choice");
        }
    }

    // --- persistence ---

    /// Save the rack state to `store` under [`CONFIG_KEY`].
    pub fn save_configuration(&mut self, store: &mut dyn KvStore) -> Result<()> {
        let config = MixerConfig {
            master_volume: self.master_volume,
            channels: self
                .channels
                .iter()
                .map(|strip| {
                    let mut config = strip.current_config();
                    config.midi_mapping = self.midi.mapping_for(strip.id()).copied();
                    config
                })
                .collect(),
        };
        store.set(CONFIG_KEY, &config.to_json()?)?;
        self.notices.post(Notice::success("Mixer state saved"));
        Ok(())
    }

    /// Restore rack state from `store`, if any was saved.
    ///
    /// Strips are created or removed to match the saved channel count,
    /// and every restored value is clamped to its valid range. Returns
    /// whether a configuration was found.
    pub fn load_configuration(&mut self, store: &dyn KvStore) -> Result<bool> {
        let Some(text) = store.get(CONFIG_KEY) else {
            return Ok(false);
        };
        let config = MixerConfig::from_json(&text)?.sanitized();

        while self.channels.len() > config.channels.len() {
            if let Some(last) = self.channels.last() {
                let id = last.id().to_owned();
                // Registry invariant holds, the id came from the registry.
                let _ = self.remove_channel(&id);
            }
        }
        while self.channels.len() < config.channels.len() {
            self.add_channel();
        }

        self.master_volume = config.master_volume;
        for (strip, channel_config) in self.channels.iter_mut().zip(&config.channels) {
            strip.apply_config(channel_config);
            match channel_config.midi_mapping {
                Some(mapping) => self.midi.restore_mapping(strip.id(), mapping),
                None => self.midi.remove_channel(strip.id()),
            }
        }

        tracing::info!(channels = config.channels.len(), "configuration restored");
        Ok(true)
    }
}

impl std::fmt::Debug for Mixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixer")
            .field("suspended", &self.suspended)
            .field("channels", &self.channels.len())
            .field("master_volume", &self.master_volume)
            .field("frames_rendered", &self.frames_rendered)
            .finish_non_exhaustive()
    }
}
