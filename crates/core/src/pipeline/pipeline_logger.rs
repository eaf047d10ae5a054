use std::collections::HashMap;
use std::time::Instant;

use crate::detection::domain::worker_message::format_log_args;
use crate::shared::constants::WORKER_LOG_PREFIX;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples the scheduler from specific output mechanisms (stdout, the log
/// crate, test recorders) so each caller can observe pipeline behavior
/// without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Log a recoverable problem (skipped cycle, late detector).
    fn warn(&mut self, message: &str);

    /// Forward diagnostic values emitted by the detection worker.
    fn worker_log(&mut self, args: &[serde_json::Value]);

    /// Report the current processing rate in frames per second.
    fn throughput(&mut self, fps: u32);

    /// Record how long a named pipeline stage took for one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Emit an end-of-pipeline summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
    fn worker_log(&mut self, _args: &[serde_json::Value]) {}
    fn throughput(&mut self, _fps: u32) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Count, total and extremes of a stream of samples, in constant space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    count: u64,
    total: f64,
    min: f64,
    max: f64,
}

impl RunningStat {
    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.total += value;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// CLI-oriented logger that aggregates per-stage timing and throughput and
/// provides a summary report when the pipeline stops.
///
/// Only running aggregates are kept, so memory stays flat on a live stream
/// that runs until interrupted. Throughput output is throttled to every
/// `throttle_cycles` reports to keep a fast detector from flooding the
/// terminal.
pub struct StdoutPipelineLogger {
    throttle_cycles: u64,
    timings: HashMap<String, RunningStat>,
    fps: RunningStat,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_cycles: u64) -> Self {
        Self {
            throttle_cycles: throttle_cycles.max(1),
            timings: HashMap::new(),
            fps: RunningStat::default(),
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.fps.count() == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = Vec::new();

        lines.push(format!(
            "Pipeline summary ({} throughput samples, {:.1}s total):",
            self.fps.count(),
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let stat = &self.timings[stage];
            let avg_ms = stat.mean();
            let total_ms = stat.total();
            let max_ms = stat.max();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        if self.fps.count() > 0 {
            lines.push(format!(
                "  Throughput: avg {:.1} fps (min {:.0}, max {:.0})",
                self.fps.mean(),
                self.fps.min(),
                self.fps.max()
            ));
        }

        Some(lines.join("\n"))
    }

    /// Returns the aggregated timing for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&RunningStat> {
        self.timings.get(stage)
    }

    pub fn fps(&self) -> &RunningStat {
        &self.fps
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

/// One log line for a worker diagnostic message.
fn worker_line(args: &[serde_json::Value]) -> String {
    format!("{WORKER_LOG_PREFIX} {}", format_log_args(args))
}

impl PipelineLogger for StdoutPipelineLogger {
    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
    }

    fn worker_log(&mut self, args: &[serde_json::Value]) {
        log::info!("{}", worker_line(args));
    }

    fn throughput(&mut self, fps: u32) {
        self.fps.record(fps as f64);
        if self.fps.count() % self.throttle_cycles == 1 || self.throttle_cycles == 1 {
            log::info!("Processing at {fps} fps");
        } else {
            log::debug!("Processing at {fps} fps");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    // --- NullPipelineLogger tests ---

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.info("hello");
        logger.warn("careful");
        logger.worker_log(&[json!("ready")]);
        logger.throughput(30);
        logger.timing("detect", 5.0);
        logger.summary();
    }

    // --- StdoutPipelineLogger tests ---

    #[test]
    fn test_running_stat_tracks_extremes_and_mean() {
        let mut stat = RunningStat::default();
        for v in [20.0, 5.0, 35.0] {
            stat.record(v);
        }
        assert_eq!(stat.count(), 3);
        assert_relative_eq!(stat.total(), 60.0);
        assert_relative_eq!(stat.mean(), 20.0);
        assert_relative_eq!(stat.min(), 5.0);
        assert_relative_eq!(stat.max(), 35.0);
    }

    #[test]
    fn test_empty_running_stat_has_zero_mean() {
        assert_relative_eq!(RunningStat::default().mean(), 0.0);
    }

    #[test]
    fn test_timing_aggregates_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("sample", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.count(), 2);
        assert_relative_eq!(detect.mean(), 25.0);
        assert_relative_eq!(detect.max(), 30.0);
        assert_eq!(logger.timings_for("sample").unwrap().count(), 1);
        assert!(logger.timings_for("render").is_none());
    }

    #[test]
    fn test_long_run_keeps_one_entry_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        for cycle in 0..10_000 {
            logger.timing("sample", 1.0);
            logger.timing("detect", 40.0);
            logger.throughput(20 + (cycle % 5));
        }
        assert_eq!(logger.timings.len(), 2);
        assert_eq!(logger.fps().count(), 10_000);
        assert_relative_eq!(logger.fps().min(), 20.0);
        assert_relative_eq!(logger.fps().max(), 24.0);
    }

    #[test]
    fn test_summary_includes_timing_and_fps() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("sample", 1.0);
        logger.throughput(10);
        logger.throughput(20);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary (2 throughput samples"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("sample"));
        assert!(summary.contains("avg 15.0 fps (min 10, max 20)"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_worker_line_is_prefixed() {
        let line = worker_line(&[json!("model loaded in"), json!(42), json!("ms")]);
        assert_eq!(line, "worker: model loaded in 42 ms");
    }

    #[test]
    fn test_default_throttle() {
        let logger = StdoutPipelineLogger::default();
        assert_eq!(logger.throttle_cycles, 10);
    }
}
