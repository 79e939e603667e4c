//! Voice + pipeline front end
//!
//! One synthesis request is one batch on the voice's audio player:
//! `reset()`, run every stage, then `drain()` on success or `cancel()` on
//! failure so partially written audio is dropped. Batches on one voice are
//! serialized, so clones of a synthesizer can be used from several threads.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::utterance::Utterance;
use crate::core::voice::Voice;
use crate::pipeline::{Pipeline, PipelineError};

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Every stage succeeded but the player did not finish playback
    #[error("Audio player '{0}' did not finish draining")]
    DrainFailed(String),
}

#[derive(Debug, Clone)]
pub struct Synthesizer {
    voice: Arc<Voice>,
    pipeline: Pipeline,
}

impl Synthesizer {
    pub fn new(voice: Arc<Voice>, pipeline: Pipeline) -> Self {
        Self { voice, pipeline }
    }

    pub fn voice(&self) -> &Arc<Voice> {
        &self.voice
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Synthesize `text` and return the processed utterance
    pub fn speak(&self, text: &str) -> Result<Utterance, SynthesisError> {
        let mut utterance = Utterance::new(Arc::clone(&self.voice), text);
        self.synthesize(&mut utterance)?;
        Ok(utterance)
    }

    pub fn synthesize(&self, utterance: &mut Utterance) -> Result<(), SynthesisError> {
        let _batch = self.voice.lock_batch();
        let player = self.voice.audio_player();
        player.reset();

        if let Err(e) = self.pipeline.run(utterance) {
            player.cancel();
            return Err(e.into());
        }

        if !player.drain() {
            warn!(
                utterance_id = %utterance.id(),
                player = %player.name(),
                "Audio player drain failed"
            );
            return Err(SynthesisError::DrainFailed(player.name().to_string()));
        }

        info!(
            utterance_id = %utterance.id(),
            voice = %self.voice.name(),
            "Utterance synthesized"
        );
        Ok(())
    }

    /// Abort the batch in flight; safe to call from another thread
    pub fn cancel(&self) {
        self.voice.audio_player().cancel();
    }
}
