use tracing::debug;

use crate::core::features::FeatureSet;
use crate::core::utterance::{Utterance, relation_names};
use crate::pipeline::UtteranceProcessor;
use crate::pipeline::error::ProcessResult;

/// Builds the `Segment` relation from whitespace-separated phone names
///
/// The utterance's input text is read as a phone string such as
/// `"pau h e l o pau"`; each name becomes one segment item.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneListStage;

impl PhoneListStage {
    pub fn new() -> Self {
        Self
    }
}

impl UtteranceProcessor for PhoneListStage {
    fn name(&self) -> &str {
        "phone_list"
    }

    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()> {
        let phones: Vec<String> = utterance
            .input_text()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let count = phones.len();
        let relation = utterance.create_relation(relation_names::SEGMENT);
        for phone in phones {
            relation.append(FeatureSet::new().with("name", phone));
        }

        debug!(utterance_id = %utterance.id(), segments = count, "Segments built from phone list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::NullAudioPlayer;
    use crate::core::voice::Voice;
    use std::sync::Arc;

    #[test]
    fn test_one_segment_per_phone() {
        let voice = Voice::new("test", Arc::new(NullAudioPlayer::new()));
        let mut utt = Utterance::new(Arc::new(voice), "  pau h\te\nl o pau ");
        PhoneListStage::new().process_utterance(&mut utt).unwrap();

        let names: Vec<&str> = utt
            .relation(relation_names::SEGMENT)
            .unwrap()
            .iter()
            .filter_map(|item| item.name())
            .collect();
        assert_eq!(names, vec!["pau", "h", "e", "l", "o", "pau"]);
    }

    #[test]
    fn test_empty_text_gives_empty_relation() {
        let voice = Voice::new("test", Arc::new(NullAudioPlayer::new()));
        let mut utt = Utterance::new(Arc::new(voice), "");
        PhoneListStage::new().process_utterance(&mut utt).unwrap();
        assert!(utt.relation(relation_names::SEGMENT).unwrap().is_empty());
    }
}
