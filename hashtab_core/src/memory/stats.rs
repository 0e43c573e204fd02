//! Allocation statistics for the block pool

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters updated by the allocator and the retry queue
#[derive(Debug, Default)]
pub struct AllocatorStats {
    allocations: AtomicU64,
    releases: AtomicU64,
    exhausted: AtomicU64,
    handoffs: AtomicU64,
    queued: AtomicU64,
    peak_outstanding: AtomicUsize,
}

impl AllocatorStats {
    pub(crate) fn record_allocation(&self, outstanding: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.peak_outstanding.fetch_max(outstanding, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// A released block went straight to a waiting task
    pub(crate) fn record_handoff(&self) {
        self.handoffs.fetch_add(1, Ordering::Relaxed);
    }

    /// A task had to wait in the retry queue
    pub(crate) fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            handoffs: self.handoffs.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            peak_outstanding: self.peak_outstanding.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`AllocatorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Blocks freshly allocated
    pub allocations: u64,
    /// Blocks returned to the allocator
    pub releases: u64,
    /// Allocation attempts refused by the bound
    pub exhausted: u64,
    /// Blocks handed directly from one task to another
    pub handoffs: u64,
    /// Times a task entered the retry queue
    pub queued: u64,
    /// Highest number of blocks outstanding at once
    pub peak_outstanding: usize,
}
