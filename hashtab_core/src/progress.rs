//! Progress and completion observers
//!
//! The coordinator reports through the [`HashObserver`] trait, so callers can
//! render a progress bar, forward events over a channel, or ignore them,
//! without the core depending on any UI concern.

use crate::task::TaskId;
use tokio::sync::mpsc;

/// Receiver of coordinator callbacks
///
/// Callbacks are invoked from tokio worker threads and must return quickly.
pub trait HashObserver: Send + Sync {
    /// Overall progress moved to `step` out of the coordinator's resolution
    fn on_progress(&self, _step: u32) {}

    /// One task reached a terminal state
    fn on_task_finished(&self, _task: TaskId) {}

    /// Every task has finished; called exactly once per started coordinator
    fn on_all_finished(&self);
}

/// Observer that ignores everything
pub struct NullObserver;

impl HashObserver for NullObserver {
    fn on_all_finished(&self) {
        // No-op
    }
}

type ProgressFn = Box<dyn Fn(u32) + Send + Sync>;
type FinishedFn = Box<dyn Fn() + Send + Sync>;

/// Observer built from closures
#[derive(Default)]
pub struct FnObserver {
    progress: Option<ProgressFn>,
    task_finished: Option<Box<dyn Fn(TaskId) + Send + Sync>>,
    all_finished: Option<FinishedFn>,
}

impl FnObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn on_task_finished(mut self, f: impl Fn(TaskId) + Send + Sync + 'static) -> Self {
        self.task_finished = Some(Box::new(f));
        self
    }

    pub fn on_all_finished(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.all_finished = Some(Box::new(f));
        self
    }
}

impl HashObserver for FnObserver {
    fn on_progress(&self, step: u32) {
        if let Some(f) = &self.progress {
            f(step);
        }
    }

    fn on_task_finished(&self, task: TaskId) {
        if let Some(f) = &self.task_finished {
            f(task);
        }
    }

    fn on_all_finished(&self) {
        if let Some(f) = &self.all_finished {
            f();
        }
    }
}

/// Coordinator callback as a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashEvent {
    Progress { step: u32 },
    TaskFinished { task: TaskId },
    AllFinished,
}

/// Observer forwarding every callback as a [`HashEvent`] over a channel
///
/// The channel is unbounded so the final [`HashEvent::AllFinished`] can never
/// be dropped; progress events are already limited to one per step.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<HashEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HashEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: HashEvent) {
        // Receiver might be dropped
        let _ = self.tx.send(event);
    }
}

impl HashObserver for ChannelObserver {
    fn on_progress(&self, step: u32) {
        self.send(HashEvent::Progress { step });
    }

    fn on_task_finished(&self, task: TaskId) {
        self.send(HashEvent::TaskFinished { task });
    }

    fn on_all_finished(&self) {
        self.send(HashEvent::AllFinished);
    }
}
