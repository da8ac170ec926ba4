//! End-to-end rack scenarios, run headless against the in-memory store.

use std::io::Cursor;

use mesa_config::{CONFIG_KEY, KvStore, MemoryKvStore, MixerConfig};
use mesa_engine::{
    EngineError, FileId, InputKind, MidiAction, Mixer, MixerOptions, PlayState,
};

fn wav_bytes(frames: usize, value: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(value).unwrap();
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn file_id(name: &str) -> FileId {
    FileId {
        name: name.to_owned(),
        size: 123,
        modified: 456,
    }
}

fn ready_mixer() -> Mixer {
    let mut mixer = Mixer::new(MixerOptions::default());
    mixer.handle_user_gesture();
    mixer
}

fn cc(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [0xB0 | channel, controller, value]
}

#[test]
fn same_file_in_two_channels_decodes_once() {
    let mut mixer = ready_mixer();
    let a = mixer.add_channel();
    let b = mixer.add_channel();
    let bytes = wav_bytes(256, 0.25);

    mixer
        .load_audio_file(&a, file_id("kick.wav"), &bytes, false)
        .unwrap();
    mixer
        .load_audio_file(&b, file_id("kick.wav"), &bytes, false)
        .unwrap();
    assert_eq!(mixer.decode_count(), 1);

    // A different identity decodes again.
    let mut other = file_id("kick.wav");
    other.modified += 1;
    mixer.load_audio_file(&a, other, &bytes, false).unwrap();
    assert_eq!(mixer.decode_count(), 2);
}

#[test]
fn pause_resume_continues_from_held_offset() {
    let mut mixer = ready_mixer();
    let id = mixer.add_channel();
    mixer
        .load_audio_file(&id, file_id("pad.wav"), &wav_bytes(96000, 0.5), true)
        .unwrap();

    assert_eq!(mixer.channel(&id).unwrap().state(), PlayState::Playing);
    let mut out = vec![0.0f32; 2 * 24000];
    mixer.render(&mut out);

    let state = mixer.toggle_play(&id).unwrap();
    let PlayState::Paused(offset) = state else {
        panic!("expected paused, got {state:?}");
    };
    assert!((offset - 0.5).abs() < 0.001, "paused near 0.5 s, got {offset}");

    // While paused the channel contributes silence and the clock keeps going.
    mixer.render(&mut out);
    assert!(out.iter().all(|&x| x == 0.0));
    assert!((mixer.current_time() - 1.0).abs() < 1e-9);

    assert_eq!(mixer.toggle_play(&id).unwrap(), PlayState::Playing);
    mixer.render(&mut out);
    assert!(out.iter().any(|&x| x != 0.0));
}

#[test]
fn toggle_all_pauses_and_resumes_the_rack() {
    let mut mixer = ready_mixer();
    let a = mixer.add_channel();
    let b = mixer.add_channel();
    mixer
        .load_audio_file(&a, file_id("pad.wav"), &wav_bytes(96000, 0.5), false)
        .unwrap();
    mixer
        .load_audio_file(&b, file_id("bass.wav"), &wav_bytes(96000, 0.25), false)
        .unwrap();

    assert!(mixer.toggle_all_channels());
    let mut out = vec![0.0f32; 2 * 24000];
    mixer.render(&mut out);

    // Anything playing means the master button pauses the whole rack,
    // holding each strip's offset.
    assert!(!mixer.toggle_all_channels());
    for id in [&a, &b] {
        let state = mixer.channel(id).unwrap().state();
        let PlayState::Paused(offset) = state else {
            panic!("expected paused, got {state:?}");
        };
        assert!((offset - 0.5).abs() < 0.001, "held near 0.5 s, got {offset}");
    }

    // The next press resumes from the held offsets, not from zero.
    assert!(mixer.toggle_all_channels());
    mixer.render(&mut out);
    mixer.render(&mut out);
    assert_eq!(mixer.channel(&a).unwrap().timer_display(), "00:02 / 00:02");
}

#[test]
fn removed_channel_no_longer_receives_midi() {
    let mut mixer = ready_mixer();
    let id = mixer.add_channel();

    mixer.start_midi_learn(&id).unwrap();
    let actions = mixer.handle_midi_message("port", &cc(0, 7, 100));
    assert!(matches!(actions[0], MidiAction::MappingLearned { .. }));

    mixer.remove_channel(&id).unwrap();
    assert!(mixer.handle_midi_message("port", &cc(0, 7, 100)).is_empty());
    assert!(matches!(
        mixer.channel(&id),
        Err(EngineError::ChannelNotFound(_))
    ));
}

#[test]
fn learn_transfer_binds_only_the_second_channel() {
    let mut mixer = ready_mixer();
    let a = mixer.add_channel();
    let b = mixer.add_channel();

    mixer.start_midi_learn(&a).unwrap();
    mixer.start_midi_learn(&b).unwrap();
    assert_eq!(mixer.pending_midi_learn(), Some(b.as_str()));

    mixer.handle_midi_message("port", &cc(0, 21, 127));
    let volumes = mixer.handle_midi_message("port", &cc(0, 21, 64));
    assert_eq!(volumes.len(), 1);
    match &volumes[0] {
        MidiAction::SetVolume { channel_id, value } => {
            assert_eq!(channel_id, &b);
            assert!((value - 64.0 / 127.0).abs() < 1e-6);
        }
        other => panic!("expected SetVolume, got {other:?}"),
    }
    assert!((mixer.channel(&b).unwrap().volume() - 64.0 / 127.0).abs() < 1e-6);
    // The first channel keeps its untouched default fader.
    assert!((mixer.channel(&a).unwrap().volume() - 0.75).abs() < 1e-6);
}

#[test]
fn three_channel_rack_saves_and_reloads() {
    let mut store = MemoryKvStore::new();
    let mut mixer = ready_mixer();

    let a = mixer.add_channel();
    let b = mixer.add_channel();
    let _c = mixer.add_channel();

    mixer.set_master_volume(0.6);
    {
        let strip = mixer.channel_mut(&a).unwrap();
        strip.set_eq_low(4.0);
        strip.set_pan(-0.5);
        strip.set_reverb_send(0.3);
    }
    mixer.channel_mut(&b).unwrap().set_volume(0.45);

    // Learn CC 7 onto channel a at value 100.
    mixer.start_midi_learn(&a).unwrap();
    mixer.handle_midi_message("port", &cc(0, 7, 100));

    mixer.save_configuration(&mut store).unwrap();

    // The stored payload is the documented wire format.
    let raw = store.get(CONFIG_KEY).unwrap();
    assert!(raw.contains("\"masterVolume\":0.6"), "got: {raw}");
    assert!(raw.contains("\"controller\":7"), "got: {raw}");
    assert!(raw.contains("\"midiChannel\":0"), "got: {raw}");
    let parsed = MixerConfig::from_json(&raw).unwrap();
    assert_eq!(parsed.channels.len(), 3);
    assert!(parsed.channels[0].midi_mapping.is_some());
    assert!(parsed.channels[1].midi_mapping.is_none());

    // A fresh mixer restores the rack from the same store.
    let mut restored = ready_mixer();
    assert!(restored.load_configuration(&store).unwrap());
    assert_eq!(restored.channel_count(), 3);
    assert!((restored.master_volume() - 0.6).abs() < 1e-6);

    let ids: Vec<String> = restored.channels().map(|c| c.id().to_owned()).collect();
    let first = restored.channel(&ids[0]).unwrap();
    assert!((first.pan() + 0.5).abs() < 1e-6);
    assert!((first.volume() - 100.0 / 127.0).abs() < 1e-6);

    // The restored mapping dispatches again, on the learned MIDI channel.
    assert!(restored.handle_midi_message("port", &cc(3, 7, 127)).is_empty());
    let actions = restored.handle_midi_message("port", &cc(0, 7, 127));
    assert_eq!(actions.len(), 1);
    assert!(matches!(&actions[0], MidiAction::SetVolume { channel_id, .. } if channel_id == &ids[0]));
}

#[test]
fn rack_state_survives_a_real_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mesa.json");

    {
        let mut store = mesa_config::FileKvStore::open(&path).unwrap();
        let mut mixer = ready_mixer();
        let id = mixer.add_channel();
        mixer.channel_mut(&id).unwrap().set_volume(0.33);
        mixer.save_configuration(&mut store).unwrap();
    }

    let store = mesa_config::FileKvStore::open(&path).unwrap();
    let mut mixer = ready_mixer();
    assert!(mixer.load_configuration(&store).unwrap());
    assert_eq!(mixer.channel_count(), 1);
    let only = mixer.channels().next().unwrap();
    assert!((only.volume() - 0.33).abs() < 1e-6);
}

#[test]
fn load_with_no_saved_state_is_a_clean_no_op() {
    let store = MemoryKvStore::new();
    let mut mixer = ready_mixer();
    mixer.add_channel();
    assert!(!mixer.load_configuration(&store).unwrap());
    assert_eq!(mixer.channel_count(), 1);
}

#[test]
fn midi_device_choice_persists_and_restores() {
    let mut store = MemoryKvStore::new();
    let mut mixer = ready_mixer();
    mixer.select_midi_device("nanoKontrol", &mut store);

    let mut other = ready_mixer();
    other.restore_midi_device(&store);
    assert_eq!(other.midi_device(), "nanoKontrol");

    // With no stored choice, fall back to all devices.
    let empty = MemoryKvStore::new();
    other.restore_midi_device(&empty);
    assert_eq!(other.midi_device(), "all");
}

#[test]
fn switching_to_file_input_drops_the_live_source() {
    let mut mixer = ready_mixer();
    let id = mixer.add_channel();
    assert!(mixer.set_input_type(&id, InputKind::File).is_ok());
    assert_eq!(mixer.channel(&id).unwrap().input_kind(), InputKind::File);
}

#[test]
fn metering_follows_signal_and_forgets_removed_channels() {
    let mut mixer = ready_mixer();
    let id = mixer.add_channel();
    mixer
        .load_audio_file(&id, file_id("tone.wav"), &wav_bytes(48000, 0.8), false)
        .unwrap();
    mixer.toggle_play(&id).unwrap();

    let mut out = vec![0.0f32; 2 * 4096];
    mixer.render(&mut out);
    let frame = mixer.update_meters();
    assert!(frame.master.active, "master should see signal");
    assert_eq!(frame.channels.len(), 1);
    assert!(frame.channels[0].1.active);
    assert!(frame.channels[0].1.fill_percent > 10.0);

    mixer.remove_channel(&id).unwrap();
    let frame = mixer.update_meters();
    assert!(frame.channels.is_empty());
}
