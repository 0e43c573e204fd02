//! Bounded block allocator

use super::block::Block;
use super::stats::AllocatorStats;
use std::sync::atomic::{AtomicIsize, Ordering};

/// Hands out at most `max_allocations` fixed-size blocks at a time
///
/// Exhaustion is reported as `None` and never blocks; callers that need to
/// wait go through the retry queue in [`BlockPool`](super::BlockPool).
pub struct BlockAllocator {
    /// Blocks that may still be allocated; briefly negative under contention
    remaining: AtomicIsize,
    max_allocations: usize,
    block_size: usize,
    stats: AllocatorStats,
}

impl BlockAllocator {
    /// Create an allocator for `max_allocations` blocks of `block_size` bytes
    pub fn new(block_size: usize, max_allocations: usize) -> Self {
        Self {
            remaining: AtomicIsize::new(isize::try_from(max_allocations).unwrap_or(isize::MAX)),
            max_allocations,
            block_size,
            stats: AllocatorStats::default(),
        }
    }

    /// Allocate a zeroed block if the bound allows it
    pub fn try_allocate(&self) -> Option<Block> {
        let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);
        if previous <= 0 {
            // Over the bound: give the slot back
            self.remaining.fetch_add(1, Ordering::AcqRel);
            self.stats.record_exhausted();
            return None;
        }

        let outstanding = self.max_allocations.saturating_sub((previous - 1) as usize);
        self.stats.record_allocation(outstanding);
        Some(Block::zeroed(self.block_size))
    }

    /// Free a block and return its slot to the bound
    pub fn release(&self, block: Block) {
        drop(block);
        self.remaining.fetch_add(1, Ordering::AcqRel);
        self.stats.record_release();
    }

    /// Blocks currently allocated
    pub fn outstanding(&self) -> usize {
        let remaining = self.remaining.load(Ordering::Acquire).max(0) as usize;
        self.max_allocations.saturating_sub(remaining)
    }

    pub fn max_allocations(&self) -> usize {
        self.max_allocations
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn stats(&self) -> &AllocatorStats {
        &self.stats
    }
}
