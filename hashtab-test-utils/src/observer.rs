//! Observer that records every callback

use hashtab_core::{HashEvent, HashObserver, TaskId};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Records coordinator callbacks for later assertions
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<HashEvent>>,
    done: Notify,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in arrival order
    pub fn events(&self) -> Vec<HashEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Progress steps in arrival order
    pub fn progress_steps(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HashEvent::Progress { step } => Some(step),
                _ => None,
            })
            .collect()
    }

    /// Tasks reported finished, in arrival order
    pub fn finished_tasks(&self) -> Vec<TaskId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HashEvent::TaskFinished { task } => Some(task),
                _ => None,
            })
            .collect()
    }

    /// How many times `on_all_finished` fired
    pub fn all_finished_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == HashEvent::AllFinished)
            .count()
    }

    /// Wait for the first `on_all_finished`
    pub async fn wait_all_finished(&self) {
        loop {
            let notified = self.done.notified();
            if self.all_finished_count() > 0 {
                return;
            }
            notified.await;
        }
    }

    fn record(&self, event: HashEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl HashObserver for RecordingObserver {
    fn on_progress(&self, step: u32) {
        self.record(HashEvent::Progress { step });
    }

    fn on_task_finished(&self, task: TaskId) {
        self.record(HashEvent::TaskFinished { task });
    }

    fn on_all_finished(&self) {
        self.record(HashEvent::AllFinished);
        self.done.notify_waiters();
    }
}
