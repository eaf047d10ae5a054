use std::any::Any;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::detection::domain::worker_message::WorkerMessage;
use crate::shared::errors::PipelineError;
use crate::shared::raw_frame_payload::RawFramePayload;

/// Asynchronous link between the pipeline and a detection worker.
///
/// Frames go out by move, worker messages come back in FIFO order. The
/// channel itself does not limit outstanding requests; keeping at most one
/// in flight is the scheduler's job.
pub struct DetectionChannel {
    requests: Sender<RawFramePayload>,
    messages: Receiver<WorkerMessage>,
    // Dropped last, after `requests` has closed the worker's input.
    _worker: Option<Box<dyn Any + Send>>,
}

/// The worker's half of a [`DetectionChannel`].
pub struct WorkerEndpoint {
    pub requests: Receiver<RawFramePayload>,
    pub messages: Sender<WorkerMessage>,
}

impl DetectionChannel {
    /// Creates a connected channel/endpoint pair.
    pub fn connect() -> (DetectionChannel, WorkerEndpoint) {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (message_tx, message_rx) = crossbeam_channel::unbounded();
        (
            DetectionChannel {
                requests: request_tx,
                messages: message_rx,
                _worker: None,
            },
            WorkerEndpoint {
                requests: request_rx,
                messages: message_tx,
            },
        )
    }

    /// Ties the lifetime of worker resources (process handles, threads) to
    /// the channel.
    pub fn with_worker<W: Any + Send>(mut self, worker: W) -> Self {
        self._worker = Some(Box::new(worker));
        self
    }

    /// Hands one frame to the worker. The payload is moved, never copied.
    pub fn send(&self, payload: RawFramePayload) -> Result<(), PipelineError> {
        self.requests
            .send(payload)
            .map_err(|_| PipelineError::DetectorDisconnected)
    }

    /// Next pending worker message, if any, without blocking.
    pub fn try_recv(&self) -> Result<Option<WorkerMessage>, PipelineError> {
        match self.messages.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(PipelineError::DetectorDisconnected),
        }
    }

    /// Raw receiver, for use in `select!` loops.
    pub fn messages(&self) -> &Receiver<WorkerMessage> {
        &self.messages
    }

    /// Requests queued but not yet picked up by the worker.
    pub fn queued_requests(&self) -> usize {
        self.requests.len()
    }
}
