//! WAV container sink
//!
//! Collects every batch in memory and writes a single WAV file with `hound`
//! when the player is closed, using the most recently set format.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::{AudioFormat, AudioPlayer, ByteOrder, SampleEncoding, clamp_volume};

/// Upper bound on memory reserved up front from a batch size hint
const MAX_RESERVE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug)]
struct WavState {
    format: Option<AudioFormat>,
    volume: f32,
    data: Vec<u8>,
    closed: bool,
}

/// Writes collected PCM as a WAV file on close
#[derive(Debug)]
pub struct WavFileAudioPlayer {
    path: PathBuf,
    state: Mutex<WavState>,
}

#[derive(Debug, thiserror::Error)]
enum WavWriteError {
    #[error("no audio format was set")]
    NoFormat,
    #[error("unsupported sample width: {0} bits")]
    UnsupportedWidth(u16),
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

impl WavFileAudioPlayer {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(WavState {
                format: None,
                volume: 1.0,
                data: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, format: Option<AudioFormat>, data: &[u8]) -> Result<(), WavWriteError> {
        let format = format.ok_or(WavWriteError::NoFormat)?;
        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&self.path, spec)?;

        let width = (format.bits_per_sample as usize).div_ceil(8);
        for sample in data.chunks_exact(width) {
            match width {
                1 => {
                    let value = match format.encoding {
                        SampleEncoding::PcmUnsigned => (sample[0] as i16 - 128) as i8,
                        SampleEncoding::PcmSigned => sample[0] as i8,
                    };
                    writer.write_sample(value)?;
                }
                2 => {
                    let bytes = [sample[0], sample[1]];
                    let value = match format.byte_order {
                        ByteOrder::Little => i16::from_le_bytes(bytes),
                        ByteOrder::Big => i16::from_be_bytes(bytes),
                    };
                    writer.write_sample(value)?;
                }
                4 => {
                    let bytes = [sample[0], sample[1], sample[2], sample[3]];
                    let value = match format.byte_order {
                        ByteOrder::Little => i32::from_le_bytes(bytes),
                        ByteOrder::Big => i32::from_be_bytes(bytes),
                    };
                    writer.write_sample(value)?;
                }
                _ => return Err(WavWriteError::UnsupportedWidth(format.bits_per_sample)),
            }
        }
        writer.finalize()?;
        Ok(())
    }
}

impl AudioPlayer for WavFileAudioPlayer {
    fn name(&self) -> &str {
        "wav_file"
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

    fn begin(&self, size_hint: usize) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        let wanted = size_hint.min(MAX_RESERVE_BYTES);
        if let Err(e) = state.data.try_reserve(wanted) {
            warn!(size_hint, error = %e, "Ignoring batch size hint");
        }
    }

    fn write(&self, bytes: &[u8]) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.data.extend_from_slice(bytes);
        true
    }

    fn end(&self) -> bool {
        !self.state.lock().closed
    }

    fn cancel(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn drain(&self) -> bool {
        !self.state.lock().closed
    }

    fn close(&self) {
        let (format, data) = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (state.format, std::mem::take(&mut state.data))
        };

        if data.is_empty() && format.is_none() {
            debug!(path = %self.path.display(), "No audio collected, skipping WAV file");
            return;
        }
        match self.write_file(format, &data) {
            Ok(()) => debug!(path = %self.path.display(), bytes = data.len(), "WAV file written"),
            Err(WavWriteError::NoFormat) => {
                warn!(path = %self.path.display(), "Audio collected without a format, WAV not written")
            }
            Err(e) => error!(path = %self.path.display(), error = %e, "Failed to write WAV file"),
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Drop for WavFileAudioPlayer {
    fn drop(&mut self) {
        self.close();
    }
}
