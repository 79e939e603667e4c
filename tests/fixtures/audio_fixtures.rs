//! Audio Test Fixtures
//!
//! Programmatically generated PCM in the external synthesizer's format:
//! 16 kHz, 16-bit signed, mono, native byte order.

use std::f32::consts::PI;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

/// External synthesizer sample rate (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// Duration constants (in samples at 16kHz)
pub const MS_100: usize = 1600; // 100ms at 16kHz
pub const MS_500: usize = 8000; // 500ms at 16kHz
pub const SECOND: usize = 16000; // 1 second at 16kHz

/// Generate silence (zeros)
pub fn generate_silence(duration_samples: usize) -> Vec<i16> {
    vec![0i16; duration_samples]
}

/// Generate silence as raw bytes
pub fn generate_silence_bytes(duration_samples: usize) -> Vec<u8> {
    samples_to_bytes(&generate_silence(duration_samples))
}

/// Generate a sine wave tone
pub fn generate_sine_wave(duration_samples: usize, frequency: f32, amplitude: f32) -> Vec<i16> {
    let max_amplitude = amplitude * i16::MAX as f32;
    let angular_freq = 2.0 * PI * frequency / SAMPLE_RATE as f32;

    (0..duration_samples)
        .map(|i| {
            let sample = (angular_freq * i as f32).sin() * max_amplitude;
            sample as i16
        })
        .collect()
}

/// Generate a sine wave tone as raw bytes
pub fn generate_sine_wave_bytes(duration_samples: usize, frequency: f32, amplitude: f32) -> Vec<u8> {
    samples_to_bytes(&generate_sine_wave(duration_samples, frequency, amplitude))
}

/// Generate a 440Hz tone (A4 note)
pub fn generate_a440_tone(duration_samples: usize) -> Vec<i16> {
    generate_sine_wave(duration_samples, 440.0, 0.5)
}

/// Convert i16 samples to native-endian bytes
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

/// Convert native-endian bytes to i16 samples
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_ne_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Split a byte buffer into chunks of at most `chunk_size` bytes
pub fn split_chunks(bytes: &[u8], chunk_size: usize) -> Vec<Bytes> {
    bytes
        .chunks(chunk_size)
        .map(Bytes::copy_from_slice)
        .collect()
}

/// Peak absolute sample value
pub fn calculate_peak(samples: &[i16]) -> i16 {
    samples
        .iter()
        .map(|s| s.saturating_abs())
        .max()
        .unwrap_or(0)
}

/// In-memory playback device shared between a player and the test
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave_peak() {
        let samples = generate_a440_tone(SECOND);
        assert_eq!(samples.len(), SECOND);
        let peak = calculate_peak(&samples);
        assert!(peak > 16000 && peak <= 16384);
    }

    #[test]
    fn test_bytes_round_trip() {
        let samples = vec![0, 1, -1, i16::MAX, i16::MIN];
        assert_eq!(bytes_to_samples(&samples_to_bytes(&samples)), samples);
    }
}
