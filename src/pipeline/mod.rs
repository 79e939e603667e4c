//! Utterance processing pipeline
//!
//! A voice wires an ordered list of [`UtteranceProcessor`] stages into a
//! [`Pipeline`]. Each synthesis request creates one [`Utterance`] and the
//! pipeline runs every stage against it in order:
//!
//! ```text
//! TokenizerStage ─► (annotation) ─► Durator ─► PcmStreamCollector ─► PcmAudioOutput ─► AudioPlayer
//! ```
//!
//! Stages hold only read-only collaborators (decision trees, duration
//! tables, symbol classes), so one pipeline can serve many utterances
//! concurrently as long as each run has its own utterance.

pub mod error;
pub mod executor;
pub mod metrics;
pub mod stages;

pub use error::{ErrorKind, PipelineError, ProcessError, ProcessResult};
pub use executor::{Pipeline, PipelineBuilder};
pub use metrics::{PipelineMetrics, StageMetricsSnapshot};
pub use stages::{
    DurationDataError, Durator, FilePcmSource, PassthroughStage, PcmAudioOutput, PcmSource,
    PcmStreamCollector, PhoneListStage, TokenizerStage,
};

use crate::core::utterance::Utterance;

/// One step of utterance transformation
pub trait UtteranceProcessor: Send + Sync {
    /// Stage name used in logs, metrics and errors
    fn name(&self) -> &str;

    /// Read and mutate the utterance; an error aborts this utterance only
    fn process_utterance(&self, utterance: &mut Utterance) -> ProcessResult<()>;
}
