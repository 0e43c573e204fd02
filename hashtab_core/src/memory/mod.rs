//! Bounded block memory
//!
//! All file reads go through fixed-size blocks handed out by a
//! [`BlockPool`]. The pool never has more than `max_allocations` blocks
//! outstanding; tasks that cannot get one wait in a FIFO and are handed the
//! next released block directly.

use std::sync::Arc;

mod allocator;
mod block;
mod retry;
mod stats;

pub use allocator::BlockAllocator;
pub use block::{Block, BlockGuard};
pub use stats::{AllocatorStats, PoolStats};

use retry::RetryQueue;

/// Default block size (2MB)
pub const DEFAULT_BLOCK_SIZE: usize = 2 * 1024 * 1024;

/// Default bound on outstanding blocks (1GB of buffers at the default size)
pub const DEFAULT_MAX_ALLOCATIONS: usize = 512;

/// Block allocator combined with its retry queue
pub struct BlockPool {
    allocator: BlockAllocator,
    retry: RetryQueue,
}

impl BlockPool {
    /// Create a pool of at most `max_allocations` blocks of `block_size` bytes
    pub fn new(block_size: usize, max_allocations: usize) -> Arc<Self> {
        Arc::new(Self {
            allocator: BlockAllocator::new(block_size, max_allocations),
            retry: RetryQueue::default(),
        })
    }

    /// Allocate without waiting
    pub fn try_acquire(self: &Arc<Self>) -> Option<BlockGuard> {
        self.allocator
            .try_allocate()
            .map(|block| BlockGuard::new(block, Arc::clone(self)))
    }

    /// Allocate, waiting in the retry queue while the pool is exhausted
    pub async fn acquire(self: &Arc<Self>) -> BlockGuard {
        loop {
            match self.retry.allocate_or_enqueue(&self.allocator) {
                Ok(block) => return BlockGuard::new(block, Arc::clone(self)),
                Err(waiter) => {
                    log::trace!(
                        "Block pool exhausted ({} outstanding), waiting for a release",
                        self.allocator.outstanding()
                    );
                    // A closed channel means the pool dropped our entry; queue again
                    if let Ok(guard) = waiter.await {
                        return guard;
                    }
                }
            }
        }
    }

    /// Hand `block` to the next live waiter, or free it
    pub(crate) fn release(self: &Arc<Self>, block: Block) {
        let mut block = block;
        while let Some((waiter, returned)) = self.retry.next_waiter_or_free(block, &self.allocator) {
            match waiter.send(BlockGuard::new(returned, Arc::clone(self))) {
                Ok(()) => {
                    self.allocator.stats().record_handoff();
                    return;
                }
                // Waiter gave up; try the next one
                Err(guard) => match guard.into_block() {
                    Some(unclaimed) => block = unclaimed,
                    None => return,
                },
            }
        }
    }

    /// Blocks currently held by tasks
    pub fn outstanding(&self) -> usize {
        self.allocator.outstanding()
    }

    /// Highest number of blocks held at once
    pub fn peak_outstanding(&self) -> usize {
        self.allocator.stats().snapshot().peak_outstanding
    }

    /// Tasks currently waiting for a block
    pub fn waiting(&self) -> usize {
        self.retry.len()
    }

    pub fn block_size(&self) -> usize {
        self.allocator.block_size()
    }

    pub fn max_allocations(&self) -> usize {
        self.allocator.max_allocations()
    }

    pub fn stats(&self) -> PoolStats {
        self.allocator.stats().snapshot()
    }
}

impl std::fmt::Debug for BlockPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockPool")
            .field("block_size", &self.block_size())
            .field("max_allocations", &self.max_allocations())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}
