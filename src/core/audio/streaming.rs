//! Queue-backed sink with a playback thread
//!
//! `write` enqueues bytes into a bounded queue and blocks while it is full. A
//! dedicated thread pops chunks and pushes them to the device, optionally
//! pacing itself at the format's real-time rate. `cancel` discards queued
//! audio and wakes every blocked caller. `close` plays out whatever is still
//! queued before stopping the thread.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::{AudioFormat, AudioPlayer, ByteOrder, SampleEncoding, clamp_volume};

/// Default bound on queued, not yet played bytes
pub const DEFAULT_QUEUE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingOptions {
    /// Maximum number of queued bytes before `write` blocks
    pub queue_capacity: usize,
    /// Sleep for each chunk's playback duration after handing it to the device
    pub real_time: bool,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            real_time: false,
        }
    }
}

#[derive(Debug, Default)]
struct PlaybackState {
    format: Option<AudioFormat>,
    volume: f32,
    queue: VecDeque<Vec<u8>>,
    queued_bytes: usize,
    in_flight: bool,
    paused: bool,
    cancelled: bool,
    closing: bool,
    closed: bool,
    played_bytes: u64,
    time_base: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PlaybackState>,
    changed: Condvar,
}

/// Bounded-queue player delivering to any `Write` device
pub struct StreamingAudioPlayer {
    shared: Arc<Shared>,
    options: StreamingOptions,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for StreamingAudioPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingAudioPlayer")
            .field("options", &self.options)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl StreamingAudioPlayer {
    /// Spawn the playback thread for `device`
    pub fn new(device: impl Write + Send + 'static, options: StreamingOptions) -> std::io::Result<Self> {
        let options = StreamingOptions {
            queue_capacity: options.queue_capacity.max(1),
            ..options
        };
        let shared = Arc::new(Shared {
            state: Mutex::new(PlaybackState {
                volume: 1.0,
                ..Default::default()
            }),
            changed: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let real_time = options.real_time;
        let handle = thread::Builder::new()
            .name("waav-playback".to_string())
            .spawn(move || playback_loop(worker_shared, Box::new(device), real_time))?;

        Ok(Self {
            shared,
            options,
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn options(&self) -> StreamingOptions {
        self.options
    }

    /// Bytes waiting in the queue
    pub fn queued_bytes(&self) -> usize {
        self.shared.state.lock().queued_bytes
    }

    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }
}

fn playback_loop(shared: Arc<Shared>, mut device: Box<dyn Write + Send>, real_time: bool) {
    loop {
        let (mut chunk, format, volume) = {
            let mut state = shared.state.lock();
            loop {
                if !state.queue.is_empty() && (!state.paused || state.closing) {
                    break;
                }
                if state.closing {
                    if let Err(e) = device.flush() {
                        warn!(error = %e, "Failed to flush playback device");
                    }
                    return;
                }
                shared.changed.wait(&mut state);
            }
            let Some(chunk) = state.queue.pop_front() else {
                continue;
            };
            state.queued_bytes -= chunk.len();
            state.in_flight = true;
            shared.changed.notify_all();
            (chunk, state.format, state.volume)
        };

        if let Some(format) = format {
            apply_gain(&mut chunk, &format, volume);
        }
        let result = device.write_all(&chunk).and_then(|_| device.flush());

        let mut state = shared.state.lock();
        if let (Ok(()), true, Some(format)) = (&result, real_time, format) {
            let deadline = Instant::now() + format.duration_of(chunk.len());
            while !state.cancelled && !state.closing && Instant::now() < deadline {
                shared.changed.wait_until(&mut state, deadline);
            }
        }

        state.in_flight = false;
        match result {
            Ok(()) => state.played_bytes += chunk.len() as u64,
            Err(e) => {
                warn!(error = %e, "Playback device write failed, cancelling batch");
                state.cancelled = true;
                state.queue.clear();
                state.queued_bytes = 0;
            }
        }
        shared.changed.notify_all();
    }
}

/// Scale 16-bit signed samples in place
fn apply_gain(bytes: &mut [u8], format: &AudioFormat, volume: f32) {
    if volume >= 1.0 || format.bits_per_sample != 16 || format.encoding != SampleEncoding::PcmSigned {
        return;
    }
    for pair in bytes.chunks_exact_mut(2) {
        let raw = [pair[0], pair[1]];
        let sample = match format.byte_order {
            ByteOrder::Little => i16::from_le_bytes(raw),
            ByteOrder::Big => i16::from_be_bytes(raw),
        };
        let scaled = (sample as f32 * volume).round() as i16;
        let out = match format.byte_order {
            ByteOrder::Little => scaled.to_le_bytes(),
            ByteOrder::Big => scaled.to_be_bytes(),
        };
        pair.copy_from_slice(&out);
    }
}

impl AudioPlayer for StreamingAudioPlayer {
    fn name(&self) -> &str {
        "streaming"
    }

    fn set_audio_format(&self, format: AudioFormat) {
        self.shared.state.lock().format = Some(format);
    }

    fn audio_format(&self) -> Option<AudioFormat> {
        self.shared.state.lock().format
    }

    fn set_volume(&self, volume: f32) {
        self.shared.state.lock().volume = clamp_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.shared.state.lock().volume
    }

    fn reset(&self) {
        self.shared.state.lock().cancelled = false;
    }

    fn begin(&self, size_hint: usize) {
        debug!(size_hint, "Streaming batch started");
    }

    fn write(&self, bytes: &[u8]) -> bool {
        let capacity = self.options.queue_capacity;
        let mut state = self.shared.state.lock();
        if state.format.is_none() {
            warn!("write called before an audio format was set");
            return false;
        }

        for chunk in bytes.chunks(capacity) {
            loop {
                if state.cancelled || state.closing || state.closed {
                    return false;
                }
                if state.queued_bytes + chunk.len() <= capacity {
                    break;
                }
                self.shared.changed.wait(&mut state);
            }
            state.queue.push_back(chunk.to_vec());
            state.queued_bytes += chunk.len();
            self.shared.changed.notify_all();
        }
        !state.cancelled
    }

    fn end(&self) -> bool {
        let state = self.shared.state.lock();
        !state.cancelled && !state.closed
    }

    fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.cancelled = true;
        state.queue.clear();
        state.queued_bytes = 0;
        self.shared.changed.notify_all();
        debug!("Streaming batch cancelled");
    }

    fn pause(&self) {
        self.shared.state.lock().paused = true;
    }

    fn resume(&self) {
        self.shared.state.lock().paused = false;
        self.shared.changed.notify_all();
    }

    fn drain(&self) -> bool {
        let mut state = self.shared.state.lock();
        loop {
            if state.cancelled || state.closing || state.closed {
                return false;
            }
            if state.queue.is_empty() && !state.in_flight {
                return true;
            }
            self.shared.changed.wait(&mut state);
        }
    }

    fn time_ms(&self) -> i64 {
        let state = self.shared.state.lock();
        let Some(format) = state.format else {
            return 0;
        };
        let rate = format.bytes_per_second();
        if rate == 0 {
            return 0;
        }
        ((state.played_bytes - state.time_base) * 1000 / rate) as i64
    }

    fn reset_time(&self) {
        let mut state = self.shared.state.lock();
        state.time_base = state.played_bytes;
    }

    fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.closed || state.closing {
                return;
            }
            // Queued audio is still played; only `cancel` discards it
            state.closing = true;
            state.paused = false;
            self.shared.changed.notify_all();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Playback thread panicked");
            }
        }

        let mut state = self.shared.state.lock();
        state.closing = false;
        state.closed = true;
        self.shared.changed.notify_all();
        debug!(played_bytes = state.played_bytes, "Streaming player closed");
    }

    fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

impl Drop for StreamingAudioPlayer {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::EXTERNAL_SYNTH_FORMAT;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FailingDevice;

    impl Write for FailingDevice {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device unplugged"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn player_with_capacity(capacity: usize) -> (Arc<StreamingAudioPlayer>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let player = StreamingAudioPlayer::new(
            buffer.clone(),
            StreamingOptions {
                queue_capacity: capacity,
                real_time: false,
            },
        )
        .unwrap();
        player.set_audio_format(EXTERNAL_SYNTH_FORMAT);
        (Arc::new(player), buffer)
    }

    #[test]
    fn test_write_and_drain_delivers_all_bytes() {
        let (player, buffer) = player_with_capacity(8);
        let bytes: Vec<u8> = (0..64).collect();

        player.reset();
        player.begin(bytes.len());
        assert!(player.write(&bytes));
        assert!(player.end());
        assert!(player.drain());

        assert_eq!(*buffer.0.lock(), bytes);
        assert_eq!(player.queued_bytes(), 0);
    }

    #[test]
    fn test_time_tracks_played_bytes() {
        let (player, _buffer) = player_with_capacity(DEFAULT_QUEUE_CAPACITY);
        // 16 kHz mono 16-bit: 32000 bytes per second
        assert!(player.write(&vec![0u8; 3200]));
        assert!(player.drain());
        assert_eq!(player.time_ms(), 100);

        player.reset_time();
        assert_eq!(player.time_ms(), 0);
    }

    #[test]
    fn test_write_without_format_fails() {
        let buffer = SharedBuffer::default();
        let player = StreamingAudioPlayer::new(buffer, StreamingOptions::default()).unwrap();
        assert!(!player.write(&[0, 0]));
    }

    #[test]
    fn test_cancel_unblocks_blocked_writer() {
        let (player, _buffer) = player_with_capacity(4);
        player.pause();
        assert!(player.write(&[0; 4]));

        let writer = {
            let player = Arc::clone(&player);
            thread::spawn(move || player.write(&[0; 4]))
        };
        thread::sleep(Duration::from_millis(50));
        assert_eq!(player.queued_bytes(), 4);

        player.cancel();
        assert!(!writer.join().unwrap());
        assert!(!player.end());
    }

    #[test]
    fn test_cancel_unblocks_drain_while_paused() {
        let (player, _buffer) = player_with_capacity(16);
        player.pause();
        assert!(player.write(&[1; 8]));

        let drainer = {
            let player = Arc::clone(&player);
            thread::spawn(move || player.drain())
        };
        thread::sleep(Duration::from_millis(50));
        player.cancel();
        assert!(!drainer.join().unwrap());
    }

    #[test]
    fn test_reset_clears_cancellation() {
        let (player, buffer) = player_with_capacity(16);
        player.cancel();
        assert!(!player.write(&[1, 2]));

        player.reset();
        assert!(player.write(&[1, 2]));
        assert!(player.drain());
        assert_eq!(*buffer.0.lock(), vec![1, 2]);
    }

    #[test]
    fn test_pause_and_resume() {
        let (player, buffer) = player_with_capacity(16);
        player.pause();
        assert!(player.is_paused());
        assert!(player.write(&[7; 4]));
        thread::sleep(Duration::from_millis(20));
        assert!(buffer.0.lock().is_empty());

        player.resume();
        assert!(player.drain());
        assert_eq!(buffer.0.lock().len(), 4);
    }

    #[test]
    fn test_volume_scales_samples() {
        let (player, buffer) = player_with_capacity(64);
        player.set_volume(0.5);
        let bytes: Vec<u8> = [1000i16, -2000].iter().flat_map(|s| s.to_ne_bytes()).collect();
        assert!(player.write(&bytes));
        assert!(player.drain());

        let out = buffer.0.lock();
        let samples: Vec<i16> = out
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![500, -1000]);
    }

    #[test]
    fn test_device_failure_cancels_batch() {
        let player = StreamingAudioPlayer::new(FailingDevice, StreamingOptions::default()).unwrap();
        player.set_audio_format(EXTERNAL_SYNTH_FORMAT);
        // The write itself only enqueues
        let _ = player.write(&[0; 4]);
        assert!(!player.drain());
        assert!(!player.end());
    }

    #[test]
    fn test_close_plays_out_queued_audio() {
        let buffer = SharedBuffer::default();
        let player = StreamingAudioPlayer::new(
            buffer.clone(),
            StreamingOptions {
                queue_capacity: 3200,
                real_time: true,
            },
        )
        .unwrap();
        player.set_audio_format(EXTERNAL_SYNTH_FORMAT);

        assert!(player.write(&[1; 3200]));
        assert!(player.write(&[2; 3200]));
        player.close();

        assert!(player.is_closed());
        assert_eq!(buffer.0.lock().len(), 6400);
    }

    #[test]
    fn test_close_while_paused_still_delivers() {
        let (player, buffer) = player_with_capacity(16);
        player.pause();
        assert!(player.write(&[3; 8]));
        player.close();
        assert_eq!(*buffer.0.lock(), vec![3; 8]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (player, _buffer) = player_with_capacity(16);
        player.close();
        player.close();
        assert!(player.is_closed());
        assert!(!player.write(&[0, 0]));
        assert!(!player.drain());
    }
}
