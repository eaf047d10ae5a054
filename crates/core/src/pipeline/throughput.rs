use std::time::Instant;

/// Frames-per-second derived from the interval between consecutive results.
#[derive(Debug, Default)]
pub struct ThroughputMeter {
    last: Option<Instant>,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a result arrival and returns `round(1000 / interval_ms)`.
    ///
    /// Returns `None` for the first arrival and for a zero interval, so no
    /// infinite rate is ever reported.
    pub fn record(&mut self, now: Instant) -> Option<u32> {
        let previous = self.last.replace(now)?;
        let interval_ms = now.saturating_duration_since(previous).as_secs_f64() * 1000.0;
        if interval_ms <= 0.0 {
            return None;
        }
        Some((1000.0 / interval_ms).round() as u32)
    }

    pub fn last_cycle(&self) -> Option<Instant> {
        self.last
    }
}
