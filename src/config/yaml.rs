use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// YAML configuration file layout
///
/// Every field is optional; anything present overrides the environment.
///
/// # Example YAML structure
/// ```yaml
/// output:
///   path: "out/hello.wav"
///   sink: "wav"
///
/// voice:
///   name: "us1_diphone"
///   rate: 180
///   volume: 0.8
///   duration_mean_rate: 150
///   duration_tree: "voices/us1/durations.yaml"
///   duration_table: "voices/us1/durations.txt"
///
/// tokenizer:
///   whitespace: " \t\n\r"
///   single_char: "(){}[]"
///   prepunctuation: "\"'`({["
///   postpunctuation: "\"'`.,:;!?(){}[]"
///
/// playback:
///   queue_capacity: 32768
///   real_time: true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub output: Option<OutputYaml>,
    pub voice: Option<VoiceYaml>,
    pub tokenizer: Option<TokenizerYaml>,
    pub playback: Option<PlaybackYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OutputYaml {
    pub path: Option<PathBuf>,
    /// Parsed with the same aliases as `SYNTH_SINK`
    pub sink: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoiceYaml {
    pub name: Option<String>,
    pub rate: Option<f32>,
    pub volume: Option<f32>,
    pub duration_mean_rate: Option<f32>,
    pub duration_tree: Option<PathBuf>,
    pub duration_table: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TokenizerYaml {
    pub whitespace: Option<String>,
    pub single_char: Option<String>,
    pub prepunctuation: Option<String>,
    pub postpunctuation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PlaybackYaml {
    pub queue_capacity: Option<usize>,
    pub real_time: Option<bool>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
