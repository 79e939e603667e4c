use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::core::utterance::{Utterance, property_keys};
use crate::pipeline::UtteranceProcessor;
use crate::pipeline::error::{ProcessError, ProcessResult};

pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Opens the byte stream an external synthesizer produced for an utterance
pub trait PcmSource: Send + Sync {
    fn open(&self, utterance: &Utterance) -> io::Result<Box<dyn Read + Send>>;
}

impl<F> PcmSource for F
where
    F: Fn(&Utterance) -> io::Result<Box<dyn Read + Send>> + Send + Sync,
{
    fn open(&self, utterance: &Utterance) -> io::Result<Box<dyn Read + Send>> {
        self(utterance)
    }
}

/// Reads the same file for every utterance
#[derive(Debug, Clone)]
pub struct FilePcmSource {
    path: PathBuf,
}

impl FilePcmSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PcmSource for FilePcmSource {
    fn open(&self, _utterance: &Utterance) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// Reads an external synthesizer's PCM stream to completion
///
/// The stream is stored on the utterance as an ordered chunk list under
/// `pcm_audio` and its total byte length under `pcm_audio_length`, which is
/// what [`PcmAudioOutput`](super::PcmAudioOutput) consumes.
pub struct PcmStreamCollector {
    source: Box<dyn PcmSource>,
    chunk_size: usize,
}

impl std::fmt::Debug for PcmStreamCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcmStreamCollector")
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl PcmStreamCollector {
    pub fn new(source: impl PcmSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::new(FilePcmSource::new(path))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl UtteranceProcessor for PcmStreamCollector {
    fn name(&self) -> &str {
        "pcm_stream_collector"
    }

    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()> {
        let mut reader = self.source.open(utterance).map_err(ProcessError::StreamRead)?;

        let mut chunks = Vec::new();
        let mut total = 0usize;
        let mut buffer = vec![0u8; self.chunk_size];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    chunks.push(Bytes::copy_from_slice(&buffer[..n]));
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProcessError::StreamRead(e)),
            }
        }

        debug!(
            utterance_id = %utterance.id(),
            chunks = chunks.len(),
            bytes = total,
            "Collected PCM stream"
        );
        utterance.set_chunks(property_keys::PCM_AUDIO, chunks);
        utterance.set_int(property_keys::PCM_AUDIO_LENGTH, total as i64);
        Ok(())
    }
}
