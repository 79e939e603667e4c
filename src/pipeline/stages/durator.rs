use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::VoiceConfig;
use crate::core::cart::{CartError, DecisionTree};
use crate::core::duration::{DurationTableError, PhoneDurationTable};
use crate::core::utterance::{Utterance, relation_names};
use crate::pipeline::UtteranceProcessor;
use crate::pipeline::error::{ProcessError, ProcessResult};

/// Speaking rate (words per minute) the duration data was trained at
pub const DEFAULT_MEAN_RATE: f32 = 150.0;

/// Failure loading duration data from disk
#[derive(Error, Debug)]
pub enum DurationDataError {
    #[error("Failed to load duration tree {}: {source}", .path.display())]
    Tree {
        path: PathBuf,
        #[source]
        source: CartError,
    },

    #[error("Failed to load phone durations {}: {source}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: DurationTableError,
    },
}

/// Annotates the `Segment` relation with cumulative `end` times
///
/// The tree yields a z-score per segment; with the phone's mean and standard
/// deviation that gives `stretch * (z * sd + mean)` seconds, where `stretch`
/// is the mean rate divided by the voice's rate. `end` on each segment is the
/// running sum through that segment. Negative predictions count as zero so
/// `end` never decreases.
#[derive(Debug, Clone)]
pub struct Durator {
    cart: Arc<DecisionTree>,
    durations: Arc<PhoneDurationTable>,
    mean_rate: f32,
}

impl Durator {
    pub fn new(cart: Arc<DecisionTree>, mean_rate: f32, durations: Arc<PhoneDurationTable>) -> Self {
        Self {
            cart,
            durations,
            mean_rate,
        }
    }

    /// Load the tree (YAML or `.json`) and the `name mean stddev` table
    pub fn from_files(tree: &Path, table: &Path, mean_rate: f32) -> Result<Self, DurationDataError> {
        let cart = DecisionTree::from_file(tree).map_err(|source| DurationDataError::Tree {
            path: tree.to_path_buf(),
            source,
        })?;
        let durations =
            PhoneDurationTable::from_file(table).map_err(|source| DurationDataError::Table {
                path: table.to_path_buf(),
                source,
            })?;

        info!(
            tree = %cart.name(),
            nodes = cart.node_count(),
            phones = durations.len(),
            mean_rate,
            "Duration model loaded"
        );
        Ok(Self::new(Arc::new(cart), mean_rate, Arc::new(durations)))
    }

    /// Durator for the configured voice, or `None` when no duration model is set
    pub fn from_config(voice: &VoiceConfig) -> Result<Option<Self>, DurationDataError> {
        match (&voice.duration_tree, &voice.duration_table) {
            (Some(tree), Some(table)) => {
                Self::from_files(tree, table, voice.duration_mean_rate).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn mean_rate(&self) -> f32 {
        self.mean_rate
    }

    /// Duration of the segment at `id` in seconds, before stretching
    fn segment_duration(&self, utterance: &Utterance, id: usize) -> ProcessResult<f32> {
        let relation = utterance
            .relation(relation_names::SEGMENT)
            .ok_or_else(|| ProcessError::MissingRelation(relation_names::SEGMENT.to_string()))?;
        let Some(segment) = relation.item(id) else {
            return Err(ProcessError::MissingRelation(relation_names::SEGMENT.to_string()));
        };

        let z_score = self.cart.interpret_f32(&segment)?;
        let phone = segment
            .name()
            .ok_or_else(|| ProcessError::MissingItemFeature {
                relation: relation_names::SEGMENT.to_string(),
                item: id,
                feature: "name".to_string(),
            })?;
        let stats = self
            .durations
            .get(phone)
            .ok_or_else(|| ProcessError::UnknownPhone {
                phone: phone.to_string(),
            })?;

        Ok(z_score * stats.standard_deviation() + stats.mean())
    }
}

impl UtteranceProcessor for Durator {
    fn name(&self) -> &str {
        "durator"
    }

    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()> {
        let rate = utterance.voice().rate();
        if rate.is_nan() || rate <= 0.0 {
            return Err(ProcessError::config(format!(
                "voice '{}' has non-positive rate {rate}",
                utterance.voice().name()
            )));
        }
        let stretch = self.mean_rate / rate;

        let ids = utterance
            .relation(relation_names::SEGMENT)
            .ok_or_else(|| ProcessError::MissingRelation(relation_names::SEGMENT.to_string()))?
            .ids();

        let mut end = 0.0f32;
        for &id in &ids {
            let duration = stretch * self.segment_duration(utterance, id)?;
            // Clamped so `end` is non-decreasing
            end += duration.max(0.0);

            if let Some(features) = utterance
                .relation_mut(relation_names::SEGMENT)
                .and_then(|relation| relation.features_mut(id))
            {
                features.set_float("end", end);
            }
        }

        debug!(
            utterance_id = %utterance.id(),
            segments = ids.len(),
            stretch,
            end,
            "Segment durations assigned"
        );
        Ok(())
    }
}
