//! Audio delivery
//!
//! Pipeline stages hand finished PCM bytes to an [`AudioPlayer`]. A player is
//! a small state machine around one sink:
//!
//! ```text
//! set_audio_format / set_volume
//! reset ─► begin(size) ─► write … write ─► end ─► drain
//!              ▲                                    │
//!              └──────────── next batch ◄───────────┘
//! cancel / pause / resume may arrive from another thread at any point
//! close ─► (no further operation succeeds)
//! ```
//!
//! All methods take `&self` so one thread can `cancel()` while another is
//! blocked inside `write()` or `drain()`. Failures are reported as `false`
//! return values rather than errors.
//!
//! Implementations:
//! - [`RawFileAudioPlayer`]: headerless PCM to a file, always succeeds
//! - [`WavFileAudioPlayer`]: WAV container written on close
//! - [`NullAudioPlayer`]: discards audio, counts bytes
//! - [`StreamingAudioPlayer`]: bounded queue drained by a playback thread,
//!   with real pause/resume/cancel/drain semantics

mod null;
mod raw_file;
mod streaming;
mod wav_file;

pub use null::NullAudioPlayer;
pub use raw_file::RawFileAudioPlayer;
pub use streaming::{DEFAULT_QUEUE_CAPACITY, StreamingAudioPlayer, StreamingOptions};
pub use wav_file::WavFileAudioPlayer;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SynthConfig;

/// Returned by [`AudioPlayer::time_ms`] when a sink does not track time
pub const TIME_UNSUPPORTED: i64 = -1;

/// Format produced by the external synthesizer: 16 kHz, 16-bit signed, mono,
/// native byte order
pub const EXTERNAL_SYNTH_FORMAT: AudioFormat = AudioFormat {
    sample_rate: 16000,
    bits_per_sample: 16,
    channels: 1,
    encoding: SampleEncoding::PcmSigned,
    byte_order: ByteOrder::native(),
};

/// Byte order of multi-byte samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    PcmSigned,
    PcmUnsigned,
}

/// PCM stream layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub encoding: SampleEncoding,
    pub byte_order: ByteOrder,
}

impl AudioFormat {
    /// Signed PCM in native byte order
    pub const fn pcm_signed(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
            encoding: SampleEncoding::PcmSigned,
            byte_order: ByteOrder::native(),
        }
    }

    /// Bytes per frame (one sample for every channel)
    pub fn frame_size(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Frames per second
    pub fn frame_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bytes_per_second(&self) -> u64 {
        self.frame_size() as u64 * self.frame_rate() as u64
    }

    /// Playback duration of `bytes` bytes in this format
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let rate = self.bytes_per_second();
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(bytes as f64 / rate as f64)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {}-bit, {} ch, {:?}, {:?}",
            self.sample_rate, self.bits_per_sample, self.channels, self.encoding, self.byte_order
        )
    }
}

/// Clamp a requested volume into [0.0, 1.0]
pub(crate) fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Delivery endpoint for synthesized PCM audio
pub trait AudioPlayer: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Must be called before the first `write`
    fn set_audio_format(&self, format: AudioFormat);

    fn audio_format(&self) -> Option<AudioFormat>;

    /// Volume in [0.0, 1.0]; out-of-range values are clamped
    fn set_volume(&self, volume: f32);

    fn volume(&self) -> f32;

    /// Start a new logical batch of output; pair with [`AudioPlayer::drain`]
    fn reset(&self);

    /// Announce the total number of bytes about to be written
    fn begin(&self, size_hint: usize);

    /// Append audio; `false` when the batch was cancelled or the sink failed
    fn write(&self, bytes: &[u8]) -> bool;

    /// Append `length` bytes of `bytes` starting at `offset`
    fn write_range(&self, bytes: &[u8], offset: usize, length: usize) -> bool {
        match offset.checked_add(length) {
            Some(end) if end <= bytes.len() => self.write(&bytes[offset..end]),
            _ => false,
        }
    }

    /// Mark the end of the batch's writes; `false` when it was cancelled
    fn end(&self) -> bool;

    /// Stop the in-progress batch; blocked writers and drainers return `false`
    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);

    /// Block until queued audio has played; `true` only on full completion
    fn drain(&self) -> bool;

    /// Elapsed playback time in milliseconds, or [`TIME_UNSUPPORTED`]
    fn time_ms(&self) -> i64 {
        TIME_UNSUPPORTED
    }

    fn reset_time(&self) {}

    /// Flush and release the sink. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

impl fmt::Debug for dyn AudioPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPlayer")
            .field("name", &self.name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Which sink implementation to construct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Raw,
    Wav,
    Null,
    Streaming,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Wav => "wav",
            Self::Null => "null",
            Self::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "wav" => Ok(Self::Wav),
            "null" | "none" => Ok(Self::Null),
            "streaming" | "stream" => Ok(Self::Streaming),
            other => Err(format!(
                "Unsupported sink: {other}. Supported sinks: raw, wav, null, streaming"
            )),
        }
    }
}

/// Build the sink selected by configuration
///
/// `raw`, `wav` and `streaming` all write to `config.output.path`; the
/// streaming sink paces delivery when `playback.real_time` is set.
pub fn create_audio_player(config: &SynthConfig) -> std::io::Result<Arc<dyn AudioPlayer>> {
    let path = &config.output.path;
    let player: Arc<dyn AudioPlayer> = match config.output.sink {
        SinkKind::Raw => Arc::new(RawFileAudioPlayer::new(path)?),
        SinkKind::Wav => Arc::new(WavFileAudioPlayer::new(path)),
        SinkKind::Null => Arc::new(NullAudioPlayer::new()),
        SinkKind::Streaming => {
            let device = std::fs::File::create(path)?;
            let options = StreamingOptions {
                queue_capacity: config.playback.queue_capacity,
                real_time: config.playback.real_time,
            };
            Arc::new(StreamingAudioPlayer::new(device, options)?)
        }
    };

    tracing::info!(
        sink = %player.name(),
        path = %path.display(),
        "Audio player created"
    );
    Ok(player)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_synth_format() {
        let format = EXTERNAL_SYNTH_FORMAT;
        assert_eq!(format.sample_rate, 16000);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.channels, 1);
        assert_eq!(format.frame_size(), 2);
        assert_eq!(format.bytes_per_second(), 32000);
        assert_eq!(format.byte_order, ByteOrder::native());
    }

    #[test]
    fn test_duration_of() {
        let format = AudioFormat::pcm_signed(8000, 8, 2);
        assert_eq!(format.frame_size(), 2);
        assert_eq!(format.duration_of(16000), Duration::from_secs(1));
    }

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(1.5), 1.0);
        assert_eq!(clamp_volume(-0.1), 0.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_volume(0.4), 0.4);
    }

    #[test]
    fn test_sink_kind_parse() {
        assert_eq!("RAW".parse::<SinkKind>(), Ok(SinkKind::Raw));
        assert_eq!("stream".parse::<SinkKind>(), Ok(SinkKind::Streaming));
        let err = "alsa".parse::<SinkKind>().unwrap_err();
        assert!(err.contains("streaming"));
    }

    #[test]
    fn test_write_range_bounds() {
        let player = NullAudioPlayer::new();
        assert!(player.write_range(&[1, 2, 3, 4], 1, 2));
        assert_eq!(player.bytes_written(), 2);
        assert!(!player.write_range(&[1, 2, 3, 4], 3, 2));
        assert!(!player.write_range(&[1, 2], usize::MAX, 2));
    }
}
