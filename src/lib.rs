pub mod config;
pub mod core;
pub mod pipeline;
pub mod synthesizer;

// Re-export commonly used items for convenience
pub use config::SynthConfig;
pub use core::*;
pub use pipeline::{
    Pipeline, PipelineBuilder, PipelineError, ProcessError, UtteranceProcessor,
};
pub use synthesizer::{SynthesisError, Synthesizer};
