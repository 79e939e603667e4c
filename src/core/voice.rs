//! Voice handle shared by every utterance it synthesizes

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::audio::AudioPlayer;

/// Default speaking rate in words per minute
pub const DEFAULT_RATE: f32 = 150.0;

pub struct Voice {
    name: String,
    rate: f32,
    volume: f32,
    audio_player: Arc<dyn AudioPlayer>,
    batch: Mutex<()>,
}

impl Voice {
    pub fn new(name: impl Into<String>, audio_player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            name: name.into(),
            rate: DEFAULT_RATE,
            volume: 1.0,
            audio_player,
            batch: Mutex::new(()),
        }
    }

    /// Speaking rate in words per minute
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn audio_player(&self) -> &Arc<dyn AudioPlayer> {
        &self.audio_player
    }

    /// Exclusive use of the audio player for one `reset` … `drain` batch
    pub fn lock_batch(&self) -> MutexGuard<'_, ()> {
        self.batch.lock()
    }

    pub fn log(&self, message: &str) {
        tracing::debug!(voice = %self.name, "{}", message);
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("name", &self.name)
            .field("rate", &self.rate)
            .field("volume", &self.volume)
            .field("audio_player", &self.audio_player.name())
            .finish()
    }
}
