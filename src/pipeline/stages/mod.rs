//! Built-in pipeline stages

mod audio_output;
mod durator;
mod pcm_stream;
mod segments;
mod tokenize;

pub use audio_output::PcmAudioOutput;
pub use durator::{DEFAULT_MEAN_RATE, DurationDataError, Durator};
pub use pcm_stream::{DEFAULT_READ_CHUNK_SIZE, FilePcmSource, PcmSource, PcmStreamCollector};
pub use segments::PhoneListStage;
pub use tokenize::TokenizerStage;

use tracing::debug;

use super::UtteranceProcessor;
use super::error::ProcessResult;
use crate::core::utterance::Utterance;

/// Stage that leaves the utterance untouched
#[derive(Debug, Clone)]
pub struct PassthroughStage {
    name: String,
}

impl PassthroughStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl UtteranceProcessor for PassthroughStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()> {
        debug!(stage = %self.name, utterance_id = %utterance.id(), "Passthrough");
        Ok(())
    }
}
