//! Headless rack demo: build a small rack, render it, and print meters.
//!
//! Run with: cargo run --example rack_demo

use std::io::Cursor;

use mesa_config::{KvStore, MemoryKvStore};
use mesa_engine::{FileId, Mixer, MixerOptions};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: u32 = 48000;

fn sine_wav(frequency: f32, seconds: f32, amplitude: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let frames = (seconds * SAMPLE_RATE as f32) as usize;
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let s = (2.0 * std::f32::consts::PI * frequency * t).sin() * amplitude;
        writer.write_sample(s).expect("sample");
        writer.write_sample(s).expect("sample");
    }
    writer.finalize().expect("finalize");
    cursor.into_inner()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut store = MemoryKvStore::new();
    let mut mixer = Mixer::new(MixerOptions::default());
    mixer.handle_user_gesture();

    // Two tones panned apart, one with a touch of delay.
    let left = mixer.add_channel();
    let right = mixer.add_channel();
    mixer
        .load_audio_file(
            &left,
            FileId {
                name: "tone-220.wav".into(),
                size: 0,
                modified: 0,
            },
            &sine_wav(220.0, 2.0, 0.4),
            false,
        )
        .expect("load");
    mixer
        .load_audio_file(
            &right,
            FileId {
                name: "tone-330.wav".into(),
                size: 0,
                modified: 0,
            },
            &sine_wav(330.0, 2.0, 0.4),
            false,
        )
        .expect("load");

    {
        let strip = mixer.channel_mut(&left).expect("strip");
        strip.set_pan(-0.7);
        strip.set_delay_send(0.35);
    }
    mixer.channel_mut(&right).expect("strip").set_pan(0.7);
    mixer.play_all();

    // Render one second in output-sized chunks, metering as we go.
    let mut out = vec![0.0f32; 512];
    for block in 0..(2 * SAMPLE_RATE as usize / 256) {
        mixer.render(&mut out);
        if block % 20 == 0 {
            let frame = mixer.update_meters();
            let bars: Vec<String> = frame
                .channels
                .iter()
                .map(|(id, r)| format!("{id}: {:5.1}%", r.fill_percent))
                .collect();
            println!(
                "t={:5.2}s  master {:5.1}%  {}",
                mixer.current_time(),
                frame.master.fill_percent,
                bars.join("  ")
            );
        }
    }

    mixer.save_configuration(&mut store).expect("save");
    println!(
        "saved state: {}",
        store.get(mesa_config::CONFIG_KEY).expect("config")
    );
}
