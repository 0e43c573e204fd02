//! Fan-out of one block to its hash units
//!
//! Each enabled algorithm gets one unit per block, run on the blocking pool.
//! Units address their accumulator through a [`UnitTag`] carried by value;
//! the last unit to finish wakes the task.

use crate::coordinator::Shared;
use crate::error::{InternalError, TaskError};
use crate::hashing::{AlgorithmIndex, AlgorithmRegistry};
use crate::latch::{CountdownLatch, SlotClaimer};
use crate::memory::BlockGuard;
use crate::task::{FileHashTask, TaskId};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Which accumulator a hash unit updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTag {
    pub task: TaskId,
    pub algorithm: AlgorithmIndex,
}

/// Completion barrier for the units of one block
struct RoundBarrier {
    finished: CountdownLatch,
    /// First unit that did not complete its update
    failed: Mutex<Option<UnitTag>>,
    wake: Mutex<Option<oneshot::Sender<Option<UnitTag>>>>,
}

impl RoundBarrier {
    fn new(units: usize, wake: oneshot::Sender<Option<UnitTag>>) -> Self {
        Self {
            finished: CountdownLatch::new(units),
            failed: Mutex::new(None),
            wake: Mutex::new(Some(wake)),
        }
    }

    fn fail(&self, tag: UnitTag) {
        self.failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(tag);
    }

    fn arrive(&self) {
        if !self.finished.count_down() {
            return;
        }
        let failed = *self.failed.lock().unwrap_or_else(PoisonError::into_inner);
        let wake = self.wake.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(wake) = wake {
            // The task may have been dropped by a runtime shutdown
            let _ = wake.send(failed);
        }
    }
}

/// Work item updating one accumulator with one block
///
/// Dropping a unit counts it down, so a unit that panics or never gets to run
/// still releases the barrier (and marks the round failed).
struct HashUnit {
    tag: UnitTag,
    block: Option<Arc<BlockGuard>>,
    barrier: Arc<RoundBarrier>,
    shared: Arc<Shared>,
    completed: bool,
}

impl HashUnit {
    fn run(mut self) {
        if let (Some(task), Some(block)) = (self.shared.task(self.tag.task), &self.block) {
            self.completed = task.update_slot(self.tag.algorithm, block.data());
        }
    }
}

impl Drop for HashUnit {
    fn drop(&mut self) {
        if !self.completed {
            self.barrier.fail(self.tag);
        }
        // Give up the block before arriving so the last unit leaves the task sole owner
        self.block.take();
        self.barrier.arrive();
    }
}

/// Hash `block` with every enabled algorithm of `task`
///
/// Returns the block for reuse once all units are done.
pub(crate) async fn hash_block(
    shared: &Arc<Shared>,
    task: &FileHashTask,
    block: BlockGuard,
) -> Result<Option<BlockGuard>, TaskError> {
    let enabled: Vec<AlgorithmIndex> = shared.selection().iter().map(|s| s.index).collect();
    if enabled.is_empty() {
        return Ok(Some(block));
    }

    let block = Arc::new(block);
    let (wake, woken) = oneshot::channel();
    let barrier = Arc::new(RoundBarrier::new(enabled.len(), wake));
    let claimer = SlotClaimer::new(enabled.len());

    while let Some(slot) = claimer.claim() {
        let unit = HashUnit {
            tag: UnitTag {
                task: task.id(),
                algorithm: enabled[slot],
            },
            block: Some(Arc::clone(&block)),
            barrier: Arc::clone(&barrier),
            shared: Arc::clone(shared),
            completed: false,
        };
        tokio::task::spawn_blocking(move || unit.run());
    }
    drop(barrier);

    let failed = woken
        .await
        .map_err(|_| TaskError::internal("hash units finished without reporting"))?;

    if let Some(tag) = failed {
        let algorithm = AlgorithmRegistry::global()
            .get(tag.algorithm)
            .map_or("unknown", |a| a.id());
        return Err(TaskError::internal(
            InternalError::hash_unit_panicked(algorithm).to_string(),
        ));
    }

    Ok(Arc::into_inner(block))
}
