//! Pipeline error types
//!
//! A stage failure aborts the current utterance only. Errors are classified
//! so callers can tell bad linguistic data apart from a miswired pipeline or
//! a failing sink.

use std::fmt;
use thiserror::Error;

use crate::core::cart::CartError;
use crate::core::utterance::PropertyError;

/// Result type for stage processing
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Broad classification of a [`ProcessError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing feature or missing duration entry in voice data
    DataIntegrity,
    /// An upstream stage did not leave the utterance in the expected shape
    ContractViolation,
    /// Audio could not be read or handed to the sink
    Delivery,
    /// Voice or stage settings are unusable
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataIntegrity => "data integrity",
            Self::ContractViolation => "contract violation",
            Self::Delivery => "delivery",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Error raised by a single stage while processing an utterance
#[derive(Error, Debug)]
pub enum ProcessError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Data Errors
    // ─────────────────────────────────────────────────────────────────────────────

    /// Decision tree evaluation failed
    #[error("Decision tree evaluation failed: {0}")]
    Cart(#[from] CartError),

    /// Phone has no entry in the duration table
    #[error("No duration entry for phone '{phone}'")]
    UnknownPhone { phone: String },

    /// Item lacks a required feature
    #[error("Item {item} in relation '{relation}' has no '{feature}' feature")]
    MissingItemFeature {
        relation: String,
        item: usize,
        feature: String,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Contract Errors
    // ─────────────────────────────────────────────────────────────────────────────

    /// Expected relation was never built
    #[error("Utterance has no '{0}' relation")]
    MissingRelation(String),

    /// Expected side-channel property missing or of the wrong type
    #[error("Utterance property error: {0}")]
    Property(#[from] PropertyError),

    // ─────────────────────────────────────────────────────────────────────────────
    // Delivery Errors
    // ─────────────────────────────────────────────────────────────────────────────

    /// The audio player refused a write
    #[error("Audio player '{player}' rejected write of chunk {chunk}")]
    WriteRejected { player: String, chunk: usize },

    /// The audio player reported the batch as cancelled at `end`
    #[error("Audio player '{player}' failed to end the batch")]
    EndRejected { player: String },

    /// Reading the external synthesizer's byte stream failed
    #[error("Failed to read PCM stream: {0}")]
    StreamRead(#[source] std::io::Error),

    // ─────────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────────

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ProcessError {
    /// Create a configuration error
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Configuration(message.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cart(_) | Self::UnknownPhone { .. } | Self::MissingItemFeature { .. } => {
                ErrorKind::DataIntegrity
            }
            Self::MissingRelation(_) | Self::Property(_) => ErrorKind::ContractViolation,
            Self::WriteRejected { .. } | Self::EndRejected { .. } | Self::StreamRead(_) => {
                ErrorKind::Delivery
            }
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_data_integrity(&self) -> bool {
        self.kind() == ErrorKind::DataIntegrity
    }

    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::ContractViolation
    }

    pub fn is_delivery(&self) -> bool {
        self.kind() == ErrorKind::Delivery
    }

    pub fn is_config_error(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// A stage failure, tagged with the stage that raised it
#[derive(Error, Debug)]
#[error("Stage '{stage}' failed ({kind}): {source}", kind = .source.kind())]
pub struct PipelineError {
    pub stage: String,
    #[source]
    pub source: ProcessError,
}

impl PipelineError {
    pub fn new(stage: impl Into<String>, source: ProcessError) -> Self {
        Self {
            stage: stage.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}
