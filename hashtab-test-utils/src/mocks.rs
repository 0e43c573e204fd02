//! Fault-injecting block sources
//!
//! These wrap in-memory content and misbehave on request, so tests can drive
//! the retry, failure and cancellation paths of a task deterministically.

use async_trait::async_trait;
use hashtab_core::{BlockGuard, BlockSource, MemorySource};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Misbehaviour scheduled for the read at one offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with a transient out-of-memory error `times` times, then succeed
    Transient { times: usize },
    /// Fail every time with an error of `kind`
    Fatal { kind: io::ErrorKind },
}

/// In-memory source that injects faults and records every read
pub struct FaultySource {
    inner: MemorySource,
    faults: Mutex<HashMap<u64, Fault>>,
    delay: Option<Duration>,
    reads: Mutex<Vec<u64>>,
    failures: AtomicUsize,
}

impl FaultySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            inner: MemorySource::new(data),
            faults: Mutex::new(HashMap::new()),
            delay: None,
            reads: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
        }
    }

    /// Schedule `fault` for the read at `offset`
    pub fn with_fault(self, offset: u64, fault: Fault) -> Self {
        self.faults.lock().unwrap().insert(offset, fault);
        self
    }

    /// Sleep before every read
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Offsets of all read attempts, failed ones included
    pub fn reads(&self) -> Vec<u64> {
        self.reads.lock().unwrap().clone()
    }

    /// Number of attempts that returned an error
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn injected(&self, offset: u64) -> Option<io::Error> {
        let mut faults = self.faults.lock().unwrap();
        match faults.get_mut(&offset)? {
            Fault::Transient { times: 0 } => None,
            Fault::Transient { times } => {
                *times -= 1;
                Some(io::Error::from(io::ErrorKind::OutOfMemory))
            }
            Fault::Fatal { kind } => Some(io::Error::new(*kind, "injected read failure")),
        }
    }
}

#[async_trait]
impl BlockSource for FaultySource {
    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn path(&self) -> Option<&Path> {
        Some(Path::new("faulty.bin"))
    }

    async fn read_at(&self, offset: u64, block: BlockGuard, len: usize) -> io::Result<BlockGuard> {
        self.reads.lock().unwrap().push(offset);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.injected(offset) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(error);
        }
        self.inner.read_at(offset, block, len).await
    }
}

/// Source whose reads block until its gate is opened
///
/// Lets a test hold every task mid-read, act (cancel, detach, inspect), and
/// then let the reads complete.
pub struct GatedSource {
    inner: MemorySource,
    gate: watch::Receiver<bool>,
    waiting: AtomicUsize,
}

/// Opens the gate of every [`GatedSource`] created from it
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a source held by this gate
    pub fn source(&self, data: impl Into<Arc<[u8]>>) -> GatedSource {
        GatedSource {
            inner: MemorySource::new(data),
            gate: self.tx.subscribe(),
            waiting: AtomicUsize::new(0),
        }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl GatedSource {
    /// Reads currently parked at the gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockSource for GatedSource {
    fn size(&self) -> u64 {
        self.inner.size()
    }

    async fn read_at(&self, offset: u64, block: BlockGuard, len: usize) -> io::Result<BlockGuard> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.clone();
        let opened = gate.wait_for(|open| *open).await.map(|_| ());
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        opened.map_err(|_| io::Error::other("gate dropped"))?;
        self.inner.read_at(offset, block, len).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashtab_core::BlockPool;

    #[tokio::test]
    async fn test_transient_fault_clears() {
        let pool = BlockPool::new(4, 1);
        let source = FaultySource::new(b"abcdefgh".to_vec()).with_fault(4, Fault::Transient { times: 2 });

        for _ in 0..2 {
            let error = source.read_at(4, pool.acquire().await, 4).await.unwrap_err();
            assert_eq!(error.kind(), io::ErrorKind::OutOfMemory);
        }
        let block = source.read_at(4, pool.acquire().await, 4).await.unwrap();
        assert_eq!(block.data(), b"efgh");
        assert_eq!(source.reads(), vec![4, 4, 4]);
        assert_eq!(source.failures(), 2);
    }

    #[tokio::test]
    async fn test_fatal_fault_persists() {
        let pool = BlockPool::new(4, 1);
        let source = FaultySource::new(b"abcd".to_vec()).with_fault(
            0,
            Fault::Fatal {
                kind: io::ErrorKind::PermissionDenied,
            },
        );
        for _ in 0..3 {
            let error = source.read_at(0, pool.acquire().await, 4).await.unwrap_err();
            assert_eq!(error.kind(), io::ErrorKind::PermissionDenied);
        }
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_gate_holds_reads() {
        let pool = BlockPool::new(4, 1);
        let gate = Gate::new();
        let source = Arc::new(gate.source(b"wxyz".to_vec()));

        let reader = {
            let source = Arc::clone(&source);
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { source.read_at(0, pool.acquire().await, 4).await })
        };
        while source.waiting() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!reader.is_finished());

        gate.open();
        let block = reader.await.unwrap().unwrap();
        assert_eq!(block.data(), b"wxyz");
    }
}
