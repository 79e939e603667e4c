//! Headerless PCM file sink
//!
//! The reference [`AudioPlayer`]: bytes are buffered and written straight to a
//! file in whatever format was last set. Batch framing, pause, resume, cancel
//! and drain are deliberately no-ops; only the byte write can fail, and it
//! reports failure by returning `false`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use super::{AudioFormat, AudioPlayer, clamp_volume};

#[derive(Debug)]
struct RawFileState {
    format: Option<AudioFormat>,
    volume: f32,
    /// `None` once closed
    writer: Option<BufWriter<File>>,
}

/// Streams raw PCM bytes to a file
#[derive(Debug)]
pub struct RawFileAudioPlayer {
    path: PathBuf,
    state: Mutex<RawFileState>,
}

impl RawFileAudioPlayer {
    /// Create (or truncate) the output file
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(RawFileState {
                format: None,
                volume: 1.0,
                writer: Some(BufWriter::new(file)),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioPlayer for RawFileAudioPlayer {
    fn name(&self) -> &str {
        "raw_file"
    }

    fn set_audio_format(&self, format: AudioFormat) {
        self.state.lock().format = Some(format);
    }

    fn audio_format(&self) -> Option<AudioFormat> {
        self.state.lock().format
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = clamp_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn reset(&self) {}

    fn begin(&self, _size_hint: usize) {}

    fn write(&self, bytes: &[u8]) -> bool {
        let mut state = self.state.lock();
        let Some(writer) = state.writer.as_mut() else {
            return false;
        };
        match writer.write_all(bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Raw audio write failed");
                false
            }
        }
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
        let Some(mut writer) = self.state.lock().writer.take() else {
            return;
        };
        if let Err(e) = writer.flush() {
            warn!(path = %self.path.display(), error = %e, "Failed to flush raw audio file");
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().writer.is_none()
    }
}

impl Drop for RawFileAudioPlayer {
    fn drop(&mut self) {
        self.close();
    }
}
