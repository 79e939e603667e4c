//! Configuration for the synthesizer
//!
//! Settings come from defaults, then `SYNTH_*` environment variables (a
//! `.env` file is loaded into the environment by the binary at startup),
//! then an optional YAML file. Priority: YAML > ENV vars > .env values >
//! defaults. The merged result is validated before it is returned.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use waav_synth::config::SynthConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = SynthConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = SynthConfig::from_file(Path::new("synth.yaml"))?;
//!
//! println!("Writing {} audio to {}", config.output.sink, config.output.path.display());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

mod env;
mod validation;
mod yaml;

pub use env::{
    DURATION_MEAN_RATE, DURATION_TABLE, DURATION_TREE, OUTPUT_PATH, QUEUE_CAPACITY, REAL_TIME,
    SINK, VOICE_NAME, VOICE_RATE, VOICE_VOLUME,
};
pub use yaml::YamlConfig;

use crate::core::audio::{DEFAULT_QUEUE_CAPACITY, SinkKind};
use crate::core::tokenizer::SymbolClasses;
use crate::core::voice::DEFAULT_RATE;
use crate::pipeline::stages::DEFAULT_MEAN_RATE;

pub const DEFAULT_OUTPUT_PATH: &str = "synth.raw";
pub const DEFAULT_VOICE_NAME: &str = "default";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where synthesized audio goes
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub sink: SinkKind,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            sink: SinkKind::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    pub name: String,
    /// Words per minute
    pub rate: f32,
    /// 0.0 to 1.0
    pub volume: f32,
    /// Words per minute the duration data was trained at
    pub duration_mean_rate: f32,
    /// CART predicting duration z-scores (YAML or JSON)
    pub duration_tree: Option<PathBuf>,
    /// `name mean stddev` phone duration table
    pub duration_table: Option<PathBuf>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_VOICE_NAME.to_string(),
            rate: DEFAULT_RATE,
            volume: 1.0,
            duration_mean_rate: DEFAULT_MEAN_RATE,
            duration_tree: None,
            duration_table: None,
        }
    }
}

/// Streaming sink settings
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Bytes queued before `write` blocks
    pub queue_capacity: usize,
    pub real_time: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            real_time: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthConfig {
    pub output: OutputConfig,
    pub voice: VoiceConfig,
    pub tokenizer: SymbolClasses,
    pub playback: PlaybackConfig,
}

impl SynthConfig {
    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        env::apply_env(&mut config)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut config = Self::default();
        env::apply_env(&mut config)?;
        config.apply_yaml(yaml_config)?;

        validation::validate(&config)?;
        Ok(config)
    }

    /// Check ranges without reloading
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) -> Result<(), ConfigError> {
        if let Some(output) = yaml.output {
            if let Some(path) = output.path {
                self.output.path = path;
            }
            if let Some(sink) = output.sink {
                self.output.sink = sink.parse().map_err(ConfigError::Invalid)?;
            }
        }

        if let Some(voice) = yaml.voice {
            if let Some(name) = voice.name {
                self.voice.name = name;
            }
            if let Some(rate) = voice.rate {
                self.voice.rate = rate;
            }
            if let Some(volume) = voice.volume {
                self.voice.volume = volume;
            }
            if let Some(mean_rate) = voice.duration_mean_rate {
                self.voice.duration_mean_rate = mean_rate;
            }
            if let Some(tree) = voice.duration_tree {
                self.voice.duration_tree = Some(tree);
            }
            if let Some(table) = voice.duration_table {
                self.voice.duration_table = Some(table);
            }
        }

        if let Some(tokenizer) = yaml.tokenizer {
            if let Some(symbols) = tokenizer.whitespace {
                self.tokenizer.whitespace = symbols;
            }
            if let Some(symbols) = tokenizer.single_char {
                self.tokenizer.single_char = symbols;
            }
            if let Some(symbols) = tokenizer.prepunctuation {
                self.tokenizer.prepunctuation = symbols;
            }
            if let Some(symbols) = tokenizer.postpunctuation {
                self.tokenizer.postpunctuation = symbols;
            }
        }

        if let Some(playback) = yaml.playback {
            if let Some(capacity) = playback.queue_capacity {
                self.playback.queue_capacity = capacity;
            }
            if let Some(real_time) = playback.real_time {
                self.playback.real_time = real_time;
            }
        }

        Ok(())
    }
}
