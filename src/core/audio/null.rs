//! Sink that discards everything it is given

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{AudioFormat, AudioPlayer, clamp_volume};

/// Discards audio while keeping format/volume bookkeeping and a byte count
#[derive(Debug)]
pub struct NullAudioPlayer {
    format: Mutex<Option<AudioFormat>>,
    volume: Mutex<f32>,
    bytes_written: AtomicU64,
    closed: AtomicBool,
}

impl Default for NullAudioPlayer {
    fn default() -> Self {
        Self {
            format: Mutex::new(None),
            volume: Mutex::new(1.0),
            bytes_written: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

impl NullAudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes accepted since construction
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

impl AudioPlayer for NullAudioPlayer {
    fn name(&self) -> &str {
        "null"
    }

    fn set_audio_format(&self, format: AudioFormat) {
        *self.format.lock() = Some(format);
    }

    fn audio_format(&self) -> Option<AudioFormat> {
        *self.format.lock()
    }

    fn set_volume(&self, volume: f32) {
        *self.volume.lock() = clamp_volume(volume);
    }

    fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    fn reset(&self) {}

    fn begin(&self, _size_hint: usize) {}

    fn write(&self, bytes: &[u8]) -> bool {
        if self.is_closed() {
            return false;
        }
        self.bytes_written
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        true
    }

    fn end(&self) -> bool {
        !self.is_closed()
    }

    fn cancel(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn drain(&self) -> bool {
        !self.is_closed()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
