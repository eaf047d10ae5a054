use std::time::Duration;

use crate::overlay::domain::overlay_renderer::MaskPolicy;
use crate::shared::constants::{DEFAULT_IDLE_POLL_MS, PROCESSING_RESOLUTION_WIDTH};

/// When the scheduler samples the next frame after going idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RearmStrategy {
    /// Immediately after each detection result; throughput is bounded only
    /// by detector latency.
    #[default]
    OnResult,
    /// On a fixed timer, e.g. the display refresh interval.
    OnTick(Duration),
}

/// Configuration for a pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub processing_width: u32,
    pub rearm: RearmStrategy,
    /// Abandon a request that has not been answered after this long.
    pub detector_timeout: Option<Duration>,
    pub mask_policy: MaskPolicy,
    pub idle_poll: Duration,
    /// Stop after this many processed results.
    pub max_cycles: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            processing_width: PROCESSING_RESOLUTION_WIDTH,
            rearm: RearmStrategy::OnResult,
            detector_timeout: None,
            mask_policy: MaskPolicy::Union,
            idle_poll: Duration::from_millis(DEFAULT_IDLE_POLL_MS),
            max_cycles: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.processing_width, 240);
        assert_eq!(config.rearm, RearmStrategy::OnResult);
        assert_eq!(config.detector_timeout, None);
        assert_eq!(config.mask_policy, MaskPolicy::Union);
        assert_eq!(config.idle_poll, Duration::from_millis(10));
        assert_eq!(config.max_cycles, None);
    }
}
