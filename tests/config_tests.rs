//! Configuration integration tests
//!
//! Run with: cargo test --test config_tests

use std::env;
use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;
use waav_synth::config::{self, ConfigError, SynthConfig};
use waav_synth::pipeline::TokenizerStage;
use waav_synth::{SinkKind, Tokenizer, create_audio_player};

fn cleanup_env_vars() {
    unsafe {
        for var in [
            config::OUTPUT_PATH,
            config::SINK,
            config::VOICE_NAME,
            config::VOICE_RATE,
            config::VOICE_VOLUME,
            config::DURATION_MEAN_RATE,
            config::DURATION_TREE,
            config::DURATION_TABLE,
            config::QUEUE_CAPACITY,
            config::REAL_TIME,
        ] {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn test_full_yaml_configuration() {
    cleanup_env_vars();

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("hello.wav");
    let config_path = temp_dir.path().join("synth.yaml");
    let yaml = format!(
        r#"
output:
  path: "{}"
  sink: wav
voice:
  name: us1
  rate: 180
  volume: 0.8
  duration_mean_rate: 160
tokenizer:
  whitespace: " "
  postpunctuation: ".!"
playback:
  queue_capacity: 4096
  real_time: true
"#,
        output.display()
    );
    fs::write(&config_path, yaml).unwrap();

    let config = SynthConfig::from_file(&config_path).unwrap();
    assert_eq!(config.output.path, output);
    assert_eq!(config.output.sink, SinkKind::Wav);
    assert_eq!(config.voice.name, "us1");
    assert_eq!(config.voice.rate, 180.0);
    assert_eq!(config.voice.volume, 0.8);
    assert_eq!(config.voice.duration_mean_rate, 160.0);
    assert_eq!(config.playback.queue_capacity, 4096);
    assert!(config.playback.real_time);

    // Tokenizer overrides reach the lexer
    let stage = TokenizerStage::new(config.tokenizer.clone());
    let words: Vec<String> = Tokenizer::from_text("a,b\tc!")
        .with_symbols(stage.symbols().clone())
        .map(|t| format!("{}|{}", t.word(), t.postpunctuation()))
        .collect();
    assert_eq!(words, vec!["a,b\tc|!"]);

    let player = create_audio_player(&config).unwrap();
    assert_eq!(player.name(), "wav_file");
    player.close();
}

#[test]
#[serial]
fn test_env_then_yaml_priority() {
    cleanup_env_vars();
    unsafe {
        env::set_var(config::OUTPUT_PATH, "/tmp/from-env.raw");
        env::set_var(config::VOICE_VOLUME, "0.25");
    }

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("synth.yaml");
    fs::write(&config_path, "output:\n  path: /tmp/from-yaml.raw\n").unwrap();

    let config = SynthConfig::from_file(&config_path).unwrap();
    assert_eq!(config.output.path, PathBuf::from("/tmp/from-yaml.raw"));
    assert_eq!(config.voice.volume, 0.25);

    cleanup_env_vars();
}

#[test]
#[serial]
fn test_invalid_real_time_flag() {
    cleanup_env_vars();
    unsafe {
        env::set_var(config::REAL_TIME, "sometimes");
    }

    let err = SynthConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    assert!(err.to_string().contains("SYNTH_REAL_TIME"));

    cleanup_env_vars();
}

#[test]
#[serial]
fn test_missing_config_file() {
    cleanup_env_vars();

    let err = SynthConfig::from_file(&PathBuf::from("/nonexistent/synth.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
