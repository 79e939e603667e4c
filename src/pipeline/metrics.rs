//! Pipeline run metrics
//!
//! Atomic run counters plus per-stage timing, shared by every utterance the
//! pipeline processes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    total_runs: AtomicU64,
    successful_runs: AtomicU64,
    failed_runs: AtomicU64,
    /// Microseconds
    total_run_time_us: AtomicU64,
    stage_metrics: RwLock<HashMap<String, StageMetrics>>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, duration: Duration) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.successful_runs.fetch_add(1, Ordering::Relaxed);
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, duration: Duration) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_stage(&self, stage: &str, duration: Duration, success: bool) {
        let mut metrics = self.stage_metrics.write();
        let entry = metrics.entry(stage.to_string()).or_default();
        entry.record(duration, success);
    }

    pub fn total_runs(&self) -> u64 {
        self.total_runs.load(Ordering::Relaxed)
    }

    pub fn successful_runs(&self) -> u64 {
        self.successful_runs.load(Ordering::Relaxed)
    }

    pub fn failed_runs(&self) -> u64 {
        self.failed_runs.load(Ordering::Relaxed)
    }

    /// Fraction of runs that succeeded (1.0 before any run)
    pub fn success_rate(&self) -> f64 {
        let total = self.total_runs();
        if total == 0 {
            return 1.0;
        }
        self.successful_runs() as f64 / total as f64
    }

    pub fn average_run_time(&self) -> Duration {
        let total = self.total_runs();
        if total == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.total_run_time_us.load(Ordering::Relaxed) / total)
    }

    pub fn stage(&self, stage: &str) -> Option<StageMetricsSnapshot> {
        self.stage_metrics.read().get(stage).map(StageMetrics::snapshot)
    }

    pub fn all_stages(&self) -> HashMap<String, StageMetricsSnapshot> {
        self.stage_metrics
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.snapshot()))
            .collect()
    }

    pub fn reset(&self) {
        self.total_runs.store(0, Ordering::Relaxed);
        self.successful_runs.store(0, Ordering::Relaxed);
        self.failed_runs.store(0, Ordering::Relaxed);
        self.total_run_time_us.store(0, Ordering::Relaxed);
        self.stage_metrics.write().clear();
    }
}

#[derive(Debug, Default)]
struct StageMetrics {
    invocations: u64,
    failures: u64,
    total_time_us: u64,
    max_time_us: u64,
}

impl StageMetrics {
    fn record(&mut self, duration: Duration, success: bool) {
        let us = duration.as_micros() as u64;
        self.invocations += 1;
        if !success {
            self.failures += 1;
        }
        self.total_time_us += us;
        self.max_time_us = self.max_time_us.max(us);
    }

    fn snapshot(&self) -> StageMetricsSnapshot {
        StageMetricsSnapshot {
            invocations: self.invocations,
            failures: self.failures,
            average_time: if self.invocations > 0 {
                Duration::from_micros(self.total_time_us / self.invocations)
            } else {
                Duration::ZERO
            },
            max_time: Duration::from_micros(self.max_time_us),
        }
    }
}

/// Point-in-time view of one stage's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageMetricsSnapshot {
    pub invocations: u64,
    pub failures: u64,
    pub average_time: Duration,
    pub max_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_counters() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.success_rate(), 1.0);

        metrics.record_success(Duration::from_millis(2));
        metrics.record_failure(Duration::from_millis(4));

        assert_eq!(metrics.total_runs(), 2);
        assert_eq!(metrics.successful_runs(), 1);
        assert_eq!(metrics.failed_runs(), 1);
        assert_eq!(metrics.success_rate(), 0.5);
        assert_eq!(metrics.average_run_time(), Duration::from_millis(3));
    }

    #[test]
    fn test_stage_metrics() {
        let metrics = PipelineMetrics::new();
        metrics.record_stage("durator", Duration::from_micros(100), true);
        metrics.record_stage("durator", Duration::from_micros(300), false);

        let snapshot = metrics.stage("durator").unwrap();
        assert_eq!(snapshot.invocations, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.average_time, Duration::from_micros(200));
        assert_eq!(snapshot.max_time, Duration::from_micros(300));
        assert!(metrics.stage("missing").is_none());

        metrics.reset();
        assert!(metrics.all_stages().is_empty());
        assert_eq!(metrics.total_runs(), 0);
    }
}
