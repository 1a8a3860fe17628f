use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::foundation::error::{ReelError, ReelResult};

/// Progress notification pushed while a job runs.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Completed share of the job in `[0, 1]`; never decreases.
    pub fraction: f64,
    /// Current status message.
    pub message: String,
}

/// Encoded video handed to the caller on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    pub payload: Vec<u8>,
    pub mime_type: String,
}

/// One-way stream of [`ProgressEvent`]s.
///
/// Iteration blocks until the next event and ends once the job completes, fails, or is dropped.
#[derive(Debug)]
pub struct ProgressStream {
    rx: Receiver<ProgressEvent>,
}

impl ProgressStream {
    /// Next event if one is already queued.
    pub fn try_next(&self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// Every event queued right now.
    pub fn drain_ready(&self) -> Vec<ProgressEvent> {
        self.rx.try_iter().collect()
    }
}

impl Iterator for ProgressStream {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().ok()
    }
}

/// Deferred job outcome; resolves or rejects exactly once.
#[derive(Debug)]
pub struct PendingResult {
    rx: Receiver<ReelResult<RenderResult>>,
}

impl PendingResult {
    /// Block until the job settles. A job dropped without settling reads as cancelled.
    pub fn wait(self) -> ReelResult<RenderResult> {
        self.rx.recv().unwrap_or(Err(ReelError::Cancelled))
    }

    /// Outcome if the job has settled; `None` while it is still running.
    pub fn try_take(&mut self) -> Option<ReelResult<RenderResult>> {
        match self.rx.try_recv() {
            Ok(res) => Some(res),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ReelError::Cancelled)),
        }
    }
}

/// Producer side of a [`ProgressStream`].
#[derive(Debug)]
pub(crate) struct ProgressSender {
    tx: Option<Sender<ProgressEvent>>,
    last_fraction: f64,
    message: String,
}

impl ProgressSender {
    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Emit the current message at `fraction`, clamped so the stream never goes backwards.
    pub(crate) fn emit(&mut self, fraction: f64) {
        let Some(tx) = &self.tx else {
            return;
        };
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            self.last_fraction
        };
        self.last_fraction = self.last_fraction.max(f);
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(ProgressEvent {
            fraction: self.last_fraction,
            message: self.message.clone(),
        });
    }

    /// End the stream; later emits are ignored.
    pub(crate) fn close(&mut self) {
        self.tx = None;
    }
}

/// Producer side of a [`PendingResult`].
#[derive(Debug)]
pub(crate) struct ResultSlot {
    tx: Option<Sender<ReelResult<RenderResult>>>,
}

impl ResultSlot {
    /// Settle the result. Only the first call has an effect.
    pub(crate) fn settle(&mut self, res: ReelResult<RenderResult>) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let _ = tx.send(res);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.tx.is_none()
    }
}

pub(crate) fn progress_channel() -> (ProgressSender, ProgressStream) {
    let (tx, rx) = mpsc::channel();
    (
        ProgressSender {
            tx: Some(tx),
            last_fraction: 0.0,
            message: String::new(),
        },
        ProgressStream { rx },
    )
}

pub(crate) fn result_channel() -> (ResultSlot, PendingResult) {
    let (tx, rx) = mpsc::channel();
    (ResultSlot { tx: Some(tx) }, PendingResult { rx })
}

#[cfg(test)]
#[path = "../../tests/unit/session/progress.rs"]
mod tests;
