//! FIFO of tasks waiting for a block

use super::allocator::BlockAllocator;
use super::block::{Block, BlockGuard};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub(crate) type Waiter = oneshot::Sender<BlockGuard>;

/// Tasks suspended until a block is released
///
/// Every decision between "free to the allocator" and "hand to a waiter" is
/// made under this queue's lock, so a release can never slip between a
/// waiter's failed allocation and its enqueue.
#[derive(Default)]
pub(crate) struct RetryQueue {
    waiters: Mutex<VecDeque<Waiter>>,
}

impl RetryQueue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Waiter>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a block, or join the queue if the allocator is exhausted
    pub(crate) fn allocate_or_enqueue(
        &self,
        allocator: &BlockAllocator,
    ) -> Result<Block, oneshot::Receiver<BlockGuard>> {
        let mut waiters = self.lock();
        if let Some(block) = allocator.try_allocate() {
            return Ok(block);
        }

        let (tx, rx) = oneshot::channel();
        waiters.push_back(tx);
        allocator.stats().record_queued();
        Err(rx)
    }

    /// Next waiter, or free `block` to the allocator if nobody is waiting
    ///
    /// The caller sends to the returned waiter outside the lock.
    pub(crate) fn next_waiter_or_free(
        &self,
        block: Block,
        allocator: &BlockAllocator,
    ) -> Option<(Waiter, Block)> {
        let mut waiters = self.lock();
        match waiters.pop_front() {
            Some(waiter) => Some((waiter, block)),
            None => {
                allocator.release(block);
                None
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
