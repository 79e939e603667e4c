use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::audio::{AudioPlayer, EXTERNAL_SYNTH_FORMAT};
use crate::core::utterance::{PropertyError, Utterance, property_keys};
use crate::pipeline::UtteranceProcessor;
use crate::pipeline::error::{ProcessError, ProcessResult};

/// Hands collected external-synthesizer audio to the voice's player
///
/// Sets the fixed 16 kHz/16-bit/mono format and the voice volume, then frames
/// the chunk list with `begin(total)` … `end()`. A missing chunk list is a
/// wiring error; a missing length counts as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmAudioOutput;

impl PcmAudioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl UtteranceProcessor for PcmAudioOutput {
    fn name(&self) -> &str {
        "pcm_audio_output"
    }

    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()> {
        let voice = Arc::clone(utterance.voice());
        voice.log(&format!("=== {}", utterance.input_text()));
        let player: &Arc<dyn AudioPlayer> = voice.audio_player();

        let total_length = match utterance.get_int(property_keys::PCM_AUDIO_LENGTH) {
            Ok(length) => usize::try_from(length).unwrap_or(0),
            Err(PropertyError::Missing(_)) => 0,
            Err(e) => return Err(e.into()),
        };
        let chunks = utterance.get_chunks(property_keys::PCM_AUDIO)?;

        player.set_audio_format(EXTERNAL_SYNTH_FORMAT);
        player.set_volume(voice.volume());
        player.begin(total_length);

        for (index, chunk) in chunks.iter().enumerate() {
            if !player.write(chunk) {
                warn!(
                    utterance_id = %utterance.id(),
                    player = %player.name(),
                    chunk = index,
                    "Audio write rejected"
                );
                return Err(ProcessError::WriteRejected {
                    player: player.name().to_string(),
                    chunk: index,
                });
            }
        }

        if !player.end() {
            return Err(ProcessError::EndRejected {
                player: player.name().to_string(),
            });
        }

        debug!(
            utterance_id = %utterance.id(),
            player = %player.name(),
            chunks = chunks.len(),
            bytes = total_length,
            "Audio delivered to player"
        );
        Ok(())
    }
}
