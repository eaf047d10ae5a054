use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::select;

use crate::capture::domain::pipeline_context::PipelineContext;
use crate::detection::domain::detection_channel::DetectionChannel;
use crate::detection::domain::worker_message::WorkerMessage;
use crate::overlay::domain::coordinate_mapper::CoordinateMapper;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::pipeline::pipeline_config::{PipelineConfig, RearmStrategy};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::throughput::ThroughputMeter;
use crate::shared::errors::PipelineError;
use crate::shared::face::Face;

/// Abandoned requests tolerated in the worker queue while a fresh one is
/// outstanding. Beyond this, sampling pauses until late answers drain.
const MAX_ABANDONED_REQUESTS: u64 = 1;

/// What asked the scheduler to start a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    WorkerReady,
    ResultArrived,
    Tick,
    /// Deferred re-arm after a skipped cycle or an abandoned request.
    Retry,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StopReason {
    Failed(PipelineError),
    Shutdown,
    CycleLimit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchedulerState {
    /// No request outstanding; the next trigger samples a frame.
    Idle,
    /// Exactly one request is with the worker.
    Awaiting { sent_at: Instant, sequence: u64 },
    Stopped(StopReason),
}

/// Counters kept for the whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub requests_sent: u64,
    pub results_received: u64,
    pub skipped_cycles: u64,
    pub coalesced_triggers: u64,
    pub timeouts: u64,
    pub discarded_results: u64,
}

/// Drives the sample → detect → render cycle with at most one detection
/// request in flight.
///
/// All state transitions happen on the caller's thread: triggers, worker
/// messages and timeout checks are fed in one at a time, either directly or
/// through [`PipelineScheduler::run`].
pub struct PipelineScheduler {
    context: Option<PipelineContext>,
    mapper: CoordinateMapper,
    channel: DetectionChannel,
    renderer: OverlayRenderer,
    logger: Box<dyn PipelineLogger>,
    config: PipelineConfig,
    state: SchedulerState,
    throughput: ThroughputMeter,
    stats: PipelineStats,
    // Answers still owed by the worker for requests we gave up on.
    abandoned: u64,
    rearm_pending: bool,
}

impl PipelineScheduler {
    pub fn new(
        context: PipelineContext,
        channel: DetectionChannel,
        surface: Box<dyn OverlaySurface>,
        logger: Box<dyn PipelineLogger>,
        config: PipelineConfig,
    ) -> Self {
        let settings = context.settings();
        let renderer =
            OverlayRenderer::new(surface, config.mask_policy, settings.width, settings.height);
        Self {
            mapper: CoordinateMapper::new(context.scale()),
            context: Some(context),
            channel,
            renderer,
            logger,
            config,
            state: SchedulerState::Idle,
            throughput: ThroughputMeter::new(),
            stats: PipelineStats::default(),
            abandoned: 0,
            rearm_pending: false,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.state, SchedulerState::Awaiting { .. })
    }

    /// Arrival time of the most recent detection result.
    pub fn last_cycle(&self) -> Option<Instant> {
        self.throughput.last_cycle()
    }

    /// Samples the current frame and sends it to the worker, unless a
    /// request is already outstanding or the pipeline has stopped.
    pub fn trigger(&mut self, trigger: Trigger, now: Instant) {
        match self.state {
            SchedulerState::Stopped(_) => return,
            SchedulerState::Awaiting { .. } => {
                self.stats.coalesced_triggers += 1;
                log::trace!("{trigger:?} coalesced into the request in flight");
                return;
            }
            SchedulerState::Idle => {}
        }
        if self.abandoned > MAX_ABANDONED_REQUESTS {
            log::trace!("{trigger:?} held back until the detector catches up");
            self.rearm_pending = self.config.rearm == RearmStrategy::OnResult;
            return;
        }
        let Some(context) = self.context.as_mut() else {
            return;
        };

        let started = Instant::now();
        match context.sample() {
            Ok(payload) => {
                self.logger.timing("sample", millis(started.elapsed()));
                let sequence = payload.sequence();
                match self.channel.send(payload) {
                    Ok(()) => {
                        self.stats.requests_sent += 1;
                        self.rearm_pending = false;
                        self.state = SchedulerState::Awaiting {
                            sent_at: now,
                            sequence,
                        };
                    }
                    Err(e) => self.stop(StopReason::Failed(e)),
                }
            }
            Err(e) if e.is_fatal() => self.stop(StopReason::Failed(e)),
            Err(e) => {
                if e != PipelineError::NoFrameAvailable {
                    self.logger.warn(&format!("Skipping cycle: {e}"));
                }
                self.stats.skipped_cycles += 1;
                // Ticks re-arm on their own; result-driven pipelines would
                // otherwise wait forever for a result that was never requested.
                self.rearm_pending = self.config.rearm == RearmStrategy::OnResult;
            }
        }
    }

    pub fn handle_message(&mut self, message: WorkerMessage, now: Instant) {
        match message {
            WorkerMessage::Init => {
                if !matches!(self.state, SchedulerState::Stopped(_)) {
                    self.logger
                        .info("Worker initialization finished. Starting face detection");
                }
                self.trigger(Trigger::WorkerReady, now);
            }
            WorkerMessage::Log { args } => self.logger.worker_log(&args),
            WorkerMessage::DetectFaces { faces } => self.on_result(&faces, now),
        }
    }

    fn on_result(&mut self, faces: &[Face], now: Instant) {
        if self.abandoned > 0 {
            self.abandoned -= 1;
            self.stats.discarded_results += 1;
            log::debug!("Discarding late result for an abandoned request");
            return;
        }
        let sent_at = match self.state {
            SchedulerState::Awaiting { sent_at, .. } => sent_at,
            SchedulerState::Idle => {
                self.logger
                    .warn("Ignoring detection result with no request in flight");
                return;
            }
            SchedulerState::Stopped(_) => return,
        };
        self.logger
            .timing("detect", millis(now.saturating_duration_since(sent_at)));

        let started = Instant::now();
        let rects = self.mapper.map_all(faces);
        if let Err(e) = self.renderer.render(&rects) {
            self.logger.warn(&format!("Overlay render failed: {e}"));
        }
        self.logger.timing("render", millis(started.elapsed()));

        if let Some(fps) = self.throughput.record(now) {
            self.logger.throughput(fps);
        }
        self.stats.results_received += 1;
        self.state = SchedulerState::Idle;

        if let Some(limit) = self.config.max_cycles {
            if self.stats.results_received >= limit {
                self.stop(StopReason::CycleLimit);
                return;
            }
        }
        if self.config.rearm == RearmStrategy::OnResult {
            self.trigger(Trigger::ResultArrived, now);
        }
    }

    /// Abandons the outstanding request once it exceeds the configured
    /// timeout. Its answer, if it ever comes, is discarded.
    ///
    /// A replacement request is sent only while at most
    /// [`MAX_ABANDONED_REQUESTS`] answers are still owed, so a hung detector
    /// never accumulates more than two frames in its queue.
    pub fn check_timeout(&mut self, now: Instant) {
        let (SchedulerState::Awaiting { sent_at, sequence }, Some(timeout)) =
            (&self.state, self.config.detector_timeout)
        else {
            return;
        };
        let waited = now.saturating_duration_since(*sent_at);
        if waited < timeout {
            return;
        }

        let err = PipelineError::DetectorUnresponsive { waited };
        self.logger
            .warn(&format!("Abandoning request for frame {sequence}: {err}"));
        self.stats.timeouts += 1;
        self.abandoned += 1;
        self.state = SchedulerState::Idle;
        if self.abandoned > MAX_ABANDONED_REQUESTS {
            self.logger.warn(&format!(
                "Detector has {} unanswered requests; pausing until it responds",
                self.abandoned
            ));
        }
        self.trigger(Trigger::Retry, now);
    }

    /// Housekeeping between events: timeouts and deferred re-arms.
    pub fn poll_idle(&mut self, now: Instant) {
        self.check_timeout(now);
        if self.rearm_pending && self.state == SchedulerState::Idle {
            self.trigger(Trigger::Retry, now);
        }
    }

    /// Processes worker messages and timer ticks until the pipeline stops
    /// or `shutdown` is raised.
    pub fn run(&mut self, shutdown: &AtomicBool) -> StopReason {
        let ticker = match self.config.rearm {
            RearmStrategy::OnTick(interval) => crossbeam_channel::tick(interval),
            RearmStrategy::OnResult => crossbeam_channel::never(),
        };
        let messages = self.channel.messages().clone();
        let idle_poll = self.config.idle_poll;

        let reason = loop {
            if let SchedulerState::Stopped(reason) = &self.state {
                break reason.clone();
            }
            if shutdown.load(Ordering::Relaxed) {
                self.stop(StopReason::Shutdown);
                continue;
            }

            select! {
                recv(messages) -> message => match message {
                    Ok(message) => self.handle_message(message, Instant::now()),
                    Err(_) => self.stop(StopReason::Failed(PipelineError::DetectorDisconnected)),
                },
                recv(ticker) -> _ => self.trigger(Trigger::Tick, Instant::now()),
                default(idle_poll) => {}
            }
            self.poll_idle(Instant::now());
        };

        self.logger.summary();
        reason
    }

    fn stop(&mut self, reason: StopReason) {
        match &reason {
            StopReason::Failed(e) => self.logger.warn(&format!("Pipeline stopped: {e}")),
            StopReason::Shutdown => self.logger.info("Pipeline shut down"),
            StopReason::CycleLimit => self.logger.info("Cycle limit reached"),
        }
        // The stream and everything derived from it go with the pipeline.
        self.context = None;
        self.rearm_pending = false;
        self.state = SchedulerState::Stopped(reason);
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
