//! Environment variable overrides

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, SynthConfig};
use crate::core::audio::SinkKind;

pub const OUTPUT_PATH: &str = "SYNTH_OUTPUT_PATH";
pub const SINK: &str = "SYNTH_SINK";
pub const VOICE_NAME: &str = "SYNTH_VOICE_NAME";
pub const VOICE_RATE: &str = "SYNTH_VOICE_RATE";
pub const VOICE_VOLUME: &str = "SYNTH_VOICE_VOLUME";
pub const DURATION_MEAN_RATE: &str = "SYNTH_DURATION_MEAN_RATE";
pub const DURATION_TREE: &str = "SYNTH_DURATION_TREE";
pub const DURATION_TABLE: &str = "SYNTH_DURATION_TABLE";
pub const QUEUE_CAPACITY: &str = "SYNTH_QUEUE_CAPACITY";
pub const REAL_TIME: &str = "SYNTH_REAL_TIME";

/// Non-empty value of `name`
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = env_var(name) else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnv {
            var: name.to_string(),
            value,
            reason: e.to_string(),
        })
}

pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Overlay every `SYNTH_*` variable that is set onto `config`
pub(super) fn apply_env(config: &mut SynthConfig) -> Result<(), ConfigError> {
    if let Some(path) = env_var(OUTPUT_PATH) {
        config.output.path = PathBuf::from(path);
    }
    if let Some(sink) = parse_env::<SinkKind>(SINK)? {
        config.output.sink = sink;
    }

    if let Some(name) = env_var(VOICE_NAME) {
        config.voice.name = name;
    }
    if let Some(rate) = parse_env::<f32>(VOICE_RATE)? {
        config.voice.rate = rate;
    }
    if let Some(volume) = parse_env::<f32>(VOICE_VOLUME)? {
        config.voice.volume = volume;
    }
    if let Some(mean_rate) = parse_env::<f32>(DURATION_MEAN_RATE)? {
        config.voice.duration_mean_rate = mean_rate;
    }
    if let Some(path) = env_var(DURATION_TREE) {
        config.voice.duration_tree = Some(PathBuf::from(path));
    }
    if let Some(path) = env_var(DURATION_TABLE) {
        config.voice.duration_table = Some(PathBuf::from(path));
    }

    if let Some(capacity) = parse_env::<usize>(QUEUE_CAPACITY)? {
        config.playback.queue_capacity = capacity;
    }
    if let Some(value) = env_var(REAL_TIME) {
        config.playback.real_time =
            parse_bool(&value).ok_or_else(|| ConfigError::InvalidEnv {
                var: REAL_TIME.to_string(),
                value: value.clone(),
                reason: "expected true or false".to_string(),
            })?;
    }

    Ok(())
}
