//! Sequential stage executor
//!
//! Runs each stage in order against one utterance. The first failing stage
//! aborts the run; later stages never see the utterance.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::UtteranceProcessor;
use super::error::PipelineError;
use super::metrics::PipelineMetrics;
use crate::core::utterance::Utterance;

/// Ordered, immutable list of stages shared across utterances
#[derive(Clone)]
pub struct Pipeline {
    name: String,
    stages: Arc<[Arc<dyn UtteranceProcessor>]>,
    metrics: Arc<PipelineMetrics>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Run every stage against `utterance` in order
    pub fn run(&self, utterance: &mut Utterance) -> Result<(), PipelineError> {
        let start_time = Instant::now();

        debug!(
            pipeline = %self.name,
            utterance_id = %utterance.id(),
            stages = self.stages.len(),
            "Starting pipeline run"
        );

        let result = self.run_stages(utterance);

        let duration = start_time.elapsed();
        match &result {
            Ok(()) => {
                self.metrics.record_success(duration);
                info!(
                    pipeline = %self.name,
                    utterance_id = %utterance.id(),
                    duration_ms = %duration.as_millis(),
                    "Pipeline run completed successfully"
                );
            }
            Err(e) => {
                self.metrics.record_failure(duration);
                warn!(
                    pipeline = %self.name,
                    utterance_id = %utterance.id(),
                    stage = %e.stage,
                    kind = %e.kind(),
                    error = %e.source,
                    duration_ms = %duration.as_millis(),
                    "Pipeline run failed"
                );
            }
        }

        result
    }

    fn run_stages(&self, utterance: &mut Utterance) -> Result<(), PipelineError> {
        for stage in self.stages.iter() {
            let stage_start = Instant::now();
            debug!(stage = %stage.name(), utterance_id = %utterance.id(), "Running stage");

            let outcome = stage.process_utterance(utterance);
            self.metrics
                .record_stage(stage.name(), stage_start.elapsed(), outcome.is_ok());

            outcome.map_err(|e| PipelineError::new(stage.name(), e))?;
        }
        Ok(())
    }
}

pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn UtteranceProcessor>>,
}

impl PipelineBuilder {
    pub fn stage(mut self, stage: impl UtteranceProcessor + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Add a stage that is also shared elsewhere
    pub fn shared_stage(mut self, stage: Arc<dyn UtteranceProcessor>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            stages: self.stages.into(),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }
}
