//! Audio player integration tests
//!
//! Run with: cargo test --test audio_player_tests

mod fixtures;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fixtures::*;
use waav_synth::config::SynthConfig;
use waav_synth::{
    AudioPlayer, EXTERNAL_SYNTH_FORMAT, RawFileAudioPlayer, SinkKind, StreamingAudioPlayer,
    StreamingOptions, TIME_UNSUPPORTED, WavFileAudioPlayer, create_audio_player,
};

/// Full batch: reset, begin, write every chunk, end, drain
fn play_batch(player: &dyn AudioPlayer, audio: &[u8], chunk_size: usize) -> bool {
    player.set_audio_format(EXTERNAL_SYNTH_FORMAT);
    player.reset();
    player.begin(audio.len());
    for chunk in audio.chunks(chunk_size) {
        if !player.write(chunk) {
            return false;
        }
    }
    player.end() && player.drain()
}

#[test]
fn test_raw_file_sink_writes_headerless_pcm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speech.raw");
    let audio = generate_sine_wave_bytes(MS_500, 440.0, 0.5);

    let player = RawFileAudioPlayer::new(&path).unwrap();
    assert!(play_batch(&player, &audio, 1000));
    player.close();

    assert_eq!(fs::read(&path).unwrap(), audio);
    assert_eq!(player.time_ms(), TIME_UNSUPPORTED);
}

#[test]
fn test_raw_file_sink_close_is_final() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speech.raw");
    let player = RawFileAudioPlayer::new(&path).unwrap();

    assert!(player.write(&[1, 2]));
    player.close();
    player.close();

    assert!(player.is_closed());
    assert!(!player.write(&[3, 4]));
    assert_eq!(fs::read(&path).unwrap(), vec![1, 2]);
}

#[test]
fn test_wav_sink_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speech.wav");
    let samples = generate_a440_tone(MS_100);

    let player = WavFileAudioPlayer::new(&path);
    assert!(play_batch(&player, &samples_to_bytes(&samples), 256));
    player.close();

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(decoded, samples);
}

#[test]
fn test_streaming_sink_plays_in_order() {
    let device = SharedBuffer::default();
    let player = StreamingAudioPlayer::new(
        device.clone(),
        StreamingOptions {
            queue_capacity: 512,
            real_time: false,
        },
    )
    .unwrap();
    let audio = generate_sine_wave_bytes(MS_100, 1000.0, 0.8);

    assert!(play_batch(&player, &audio, 300));
    assert_eq!(device.contents(), audio);
    assert_eq!(player.time_ms(), 100);

    player.close();
    assert!(!player.write(&audio[..2]));
}

#[test]
fn test_streaming_sink_applies_volume() {
    let device = SharedBuffer::default();
    let player = StreamingAudioPlayer::new(device.clone(), StreamingOptions::default()).unwrap();
    let tone = generate_a440_tone(MS_100);

    player.set_volume(0.5);
    assert!(play_batch(&player, &samples_to_bytes(&tone), 512));

    let played = bytes_to_samples(&device.contents());
    assert_eq!(played.len(), tone.len());
    let expected = calculate_peak(&tone) / 2;
    assert!((calculate_peak(&played) - expected).abs() <= 1);

    player.close();
}

#[test]
fn test_cancel_releases_blocked_writer_promptly() {
    let device = SharedBuffer::default();
    let player = Arc::new(
        StreamingAudioPlayer::new(
            device,
            StreamingOptions {
                queue_capacity: 1024,
                real_time: false,
            },
        )
        .unwrap(),
    );
    player.set_audio_format(EXTERNAL_SYNTH_FORMAT);
    player.pause();
    // Fill the queue so both the writer and the drainer have to wait
    assert!(player.write(&[0; 1024]));

    let writer = {
        let player = Arc::clone(&player);
        thread::spawn(move || player.write(&generate_silence_bytes(SECOND)))
    };
    let drainer = {
        let player = Arc::clone(&player);
        thread::spawn(move || player.drain())
    };

    thread::sleep(Duration::from_millis(50));
    let started = Instant::now();
    player.cancel();

    assert!(!writer.join().unwrap());
    assert!(!drainer.join().unwrap());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!player.end());

    // A new batch after reset works again
    player.resume();
    player.reset();
    assert!(player.write(&[0; 64]));
    assert!(player.drain());
}

#[test]
fn test_real_time_pacing_reports_elapsed_time() {
    let device = SharedBuffer::default();
    let player = StreamingAudioPlayer::new(
        device.clone(),
        StreamingOptions {
            queue_capacity: 3200,
            real_time: true,
        },
    )
    .unwrap();
    let audio = generate_silence_bytes(MS_100);

    let started = Instant::now();
    assert!(play_batch(&player, &audio, 640));
    assert!(started.elapsed() >= Duration::from_millis(90));
    assert_eq!(player.time_ms(), 100);

    player.reset_time();
    assert_eq!(player.time_ms(), 0);
}

#[test]
fn test_factory_selects_sink() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SynthConfig::default();

    for (sink, name) in [
        (SinkKind::Raw, "raw_file"),
        (SinkKind::Wav, "wav_file"),
        (SinkKind::Null, "null"),
        (SinkKind::Streaming, "streaming"),
    ] {
        config.output.sink = sink;
        config.output.path = dir.path().join(format!("out.{sink}"));
        let player = create_audio_player(&config).unwrap();
        assert_eq!(player.name(), name);
        player.close();
    }
}

#[test]
fn test_factory_reports_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SynthConfig::default();
    config.output.path = dir.path().join("missing").join("out.raw");
    assert!(create_audio_player(&config).is_err());
}
