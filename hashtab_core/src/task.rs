//! Per-file hashing task
//!
//! A [`FileHashTask`] reads its source block by block, fans every block out
//! to one hash unit per enabled algorithm, and finalizes digests and the
//! match verdict once the source is exhausted.

use crate::coordinator::Shared;
use crate::dispatch;
use crate::error::TaskError;
use crate::hashing::{AlgorithmIndex, AlgorithmRegistry, AlgorithmSelection, HashAccumulator};
use crate::memory::BlockGuard;
use crate::source::{self, BlockSource};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Position of a task in its coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(usize);

impl TaskId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index in the order tasks were added
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TaskState {
    /// Registered, not yet reading
    Opening = 0,
    /// Waiting for a block or a read
    Reading = 1,
    /// Hash units are running on the current block
    Hashing = 2,
    /// Producing digests
    Finalizing = 3,
    /// Digests available
    Done = 4,
    /// Failed; see [`FileHashTask::error`]
    Errored = 5,
    /// Stopped by a cancellation request
    Cancelled = 6,
}

impl TaskState {
    /// Decode a value stored by `set_state`; no other bytes are ever written
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Opening,
            1 => Self::Reading,
            2 => Self::Hashing,
            3 => Self::Finalizing,
            4 => Self::Done,
            5 => Self::Errored,
            6 => Self::Cancelled,
            _ => unreachable!("invalid task state {value}"),
        }
    }

    /// Whether the task has reported its result
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored | Self::Cancelled)
    }
}

/// Outcome of comparing a file's digests with the expected hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "algorithm", rename_all = "snake_case")]
pub enum MatchState {
    /// No expected hash was supplied
    NoExpectedHash,
    /// Expected hashes were supplied and none matched
    AllMismatch,
    /// The digest of this registry algorithm equals an expected hash
    MatchedAtAlgorithm(AlgorithmIndex),
}

impl MatchState {
    /// Compare digests (indexed by registry position) against `expected`
    ///
    /// A match under a secure algorithm wins over one under an insecure
    /// algorithm; within the same class the first in registry order wins.
    pub fn evaluate(expected: &[Vec<u8>], digests: &[Option<Vec<u8>>]) -> Self {
        if expected.is_empty() {
            return Self::NoExpectedHash;
        }

        let registry = AlgorithmRegistry::global();
        let mut first_insecure = None;

        for (index, digest) in digests.iter().enumerate() {
            let Some(digest) = digest else { continue };
            if !expected.iter().any(|candidate| candidate == digest) {
                continue;
            }
            if registry.get(index).is_some_and(|a| a.is_secure()) {
                return Self::MatchedAtAlgorithm(index);
            }
            first_insecure.get_or_insert(index);
        }

        first_insecure.map_or(Self::AllMismatch, Self::MatchedAtAlgorithm)
    }

    pub fn is_match(self) -> bool {
        matches!(self, Self::MatchedAtAlgorithm(_))
    }

    /// Registry index of the matching algorithm
    pub fn algorithm(self) -> Option<AlgorithmIndex> {
        match self {
            Self::MatchedAtAlgorithm(index) => Some(index),
            Self::NoExpectedHash | Self::AllMismatch => None,
        }
    }
}

/// Result recorded once when the task reaches a terminal state
#[derive(Debug)]
struct TaskOutcome {
    digests: Vec<Option<Vec<u8>>>,
    error: Option<TaskError>,
    match_state: MatchState,
}

type AccumulatorSlot = Mutex<Option<Box<dyn HashAccumulator>>>;

/// Hashing state for one input file
pub struct FileHashTask {
    id: TaskId,
    source: Option<Arc<dyn BlockSource>>,
    path: Option<PathBuf>,
    size: u64,
    expected: Vec<Vec<u8>>,
    /// One slot per registry algorithm; `None` when disabled or finalized
    slots: Box<[AccumulatorSlot]>,
    open_error: Option<TaskError>,
    state: AtomicU8,
    cancel_requested: AtomicBool,
    credited: AtomicU64,
    outcome: OnceCell<TaskOutcome>,
}

impl FileHashTask {
    pub(crate) fn new(
        id: TaskId,
        source: Arc<dyn BlockSource>,
        expected: Vec<Vec<u8>>,
        selection: &AlgorithmSelection,
    ) -> Self {
        let registry_len = AlgorithmRegistry::global().len();
        let slots = (0..registry_len)
            .map(|index| Mutex::new(selection.get(index).map(|s| s.make_accumulator())))
            .collect();

        Self {
            id,
            path: source.path().map(Path::to_path_buf),
            size: source.size(),
            source: Some(source),
            expected,
            slots,
            open_error: None,
            state: AtomicU8::new(TaskState::Opening as u8),
            cancel_requested: AtomicBool::new(false),
            credited: AtomicU64::new(0),
            outcome: OnceCell::new(),
        }
    }

    /// A task whose file could not be opened; it finishes as soon as it starts
    pub(crate) fn failed_open(
        id: TaskId,
        path: PathBuf,
        error: TaskError,
        expected: Vec<Vec<u8>>,
    ) -> Self {
        let registry_len = AlgorithmRegistry::global().len();
        Self {
            id,
            source: None,
            path: Some(path),
            size: 0,
            expected,
            slots: (0..registry_len).map(|_| Mutex::new(None)).collect(),
            open_error: Some(error),
            state: AtomicU8::new(TaskState::Opening as u8),
            cancel_requested: AtomicBool::new(false),
            credited: AtomicU64::new(0),
            outcome: OnceCell::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bytes to hash; zero for files that failed to open
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn expected_hashes(&self) -> &[Vec<u8>] {
        &self.expected
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Whether the task has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Failure of a finished task
    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.get().and_then(|outcome| outcome.error.as_ref())
    }

    /// Digest of a registry algorithm, once the task is done
    pub fn digest(&self, algorithm: AlgorithmIndex) -> Option<&[u8]> {
        self.outcome
            .get()
            .and_then(|outcome| outcome.digests.get(algorithm))
            .and_then(|digest| digest.as_deref())
    }

    /// Match verdict; [`MatchState::NoExpectedHash`] until the task finishes
    pub fn match_state(&self) -> MatchState {
        self.outcome
            .get()
            .map_or(MatchState::NoExpectedHash, |outcome| outcome.match_state)
    }

    /// Ask the task to stop before its next read
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Snapshot for reporting
    pub fn report(&self) -> TaskReport {
        let registry = AlgorithmRegistry::global();
        let digests = self
            .outcome
            .get()
            .map(|outcome| {
                outcome
                    .digests
                    .iter()
                    .enumerate()
                    .filter_map(|(index, digest)| {
                        let digest = digest.as_ref()?;
                        Some(DigestEntry {
                            index,
                            algorithm: registry.get(index)?.id(),
                            digest: digest.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let match_state = self.match_state();
        TaskReport {
            id: self.id,
            path: self.path.clone(),
            size: self.size,
            state: self.state(),
            error: self.error().cloned(),
            digests,
            match_state,
            matched_algorithm: match_state
                .algorithm()
                .and_then(|index| registry.get(index))
                .map(|a| a.id()),
        }
    }

    /// Feed a block to one accumulator slot
    ///
    /// Returns `false` if the slot is not enabled.
    pub(crate) fn update_slot(&self, algorithm: AlgorithmIndex, data: &[u8]) -> bool {
        let Some(slot) = self.slots.get(algorithm) else {
            return false;
        };
        let mut accumulator = slot.lock().unwrap_or_else(PoisonError::into_inner);
        match accumulator.as_mut() {
            Some(accumulator) => {
                accumulator.update(data);
                true
            }
            None => false,
        }
    }

    /// Drive the task to a terminal state and report to the coordinator
    pub(crate) async fn run(self: Arc<Self>, shared: Arc<Shared>) {
        log::debug!(
            "Task {} started: {} ({} bytes)",
            self.id,
            self.display_path(),
            self.size
        );

        let result = match &self.open_error {
            Some(error) => Err(error.clone()),
            None => self.drive(&shared).await,
        };

        self.finalize(result);
        shared.on_task_finished(self.id);
    }

    async fn drive(&self, shared: &Arc<Shared>) -> Result<(), TaskError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| TaskError::internal("task has no source"))?;
        let block_size = shared.pool().block_size() as u64;
        let mut offset = 0u64;
        let mut held: Option<BlockGuard> = None;

        loop {
            self.set_state(TaskState::Reading);
            if self.is_cancel_requested() {
                return Err(TaskError::Cancelled);
            }
            if offset >= self.size {
                return Ok(());
            }

            let len = (self.size - offset).min(block_size) as usize;
            let block = match held.take() {
                Some(block) => block,
                None => shared.pool().acquire().await,
            };

            let block = match source.read_at(offset, block, len).await {
                Ok(block) => block,
                Err(error) if source::is_transient(&error) => {
                    // The block went back to the pool with the failed read
                    log::trace!(
                        "Task {}: transient read failure at offset {offset}, retrying: {error}",
                        self.id
                    );
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(error) => return Err(TaskError::read_failed(&error)),
            };

            // A read that completes after cancellation is discarded
            if self.is_cancel_requested() {
                return Err(TaskError::Cancelled);
            }

            log::trace!("Task {}: read {len} bytes at offset {offset}", self.id);
            self.set_state(TaskState::Hashing);
            held = dispatch::hash_block(shared, self, block).await?;

            offset += len as u64;
            self.credit(shared, len as u64);
        }
    }

    fn credit(&self, shared: &Shared, bytes: u64) {
        self.credited.fetch_add(bytes, Ordering::AcqRel);
        shared.on_task_progress(bytes);
    }

    fn finalize(&self, result: Result<(), TaskError>) {
        // Progress was credited per hashed block, so a failed task stops
        // contributing at its failure point
        self.set_state(TaskState::Finalizing);

        let (terminal, outcome) = match result {
            Ok(()) => {
                let digests: Vec<_> = self
                    .slots
                    .iter()
                    .map(|slot| {
                        slot.lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .take()
                            .map(|accumulator| accumulator.finish())
                    })
                    .collect();
                let match_state = MatchState::evaluate(&self.expected, &digests);
                log::debug!(
                    "Task {} done: {} ({match_state:?})",
                    self.id,
                    self.display_path()
                );
                (
                    TaskState::Done,
                    TaskOutcome {
                        digests,
                        error: None,
                        match_state,
                    },
                )
            }
            Err(error) => {
                for slot in self.slots.iter() {
                    slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                }
                let terminal = if error.is_cancelled() {
                    log::debug!("Task {} cancelled: {}", self.id, self.display_path());
                    TaskState::Cancelled
                } else {
                    log::warn!("Failed to hash {}: {error}", self.display_path());
                    TaskState::Errored
                };
                let match_state = if self.expected.is_empty() {
                    MatchState::NoExpectedHash
                } else {
                    MatchState::AllMismatch
                };
                (
                    terminal,
                    TaskOutcome {
                        digests: vec![None; self.slots.len()],
                        error: Some(error),
                        match_state,
                    },
                )
            }
        };

        if self.outcome.set(outcome).is_err() {
            log::error!("Task {} finalized twice", self.id);
        }
        self.set_state(terminal);
    }

    fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<source>".to_string(), |path| path.display().to_string())
    }
}

impl fmt::Debug for FileHashTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHashTask")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("size", &self.size)
            .field("state", &self.state())
            .finish()
    }
}

/// One computed digest in a [`TaskReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
    pub index: AlgorithmIndex,
    pub algorithm: &'static str,
    pub digest: Vec<u8>,
}

/// Snapshot of a task's state and results
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub id: TaskId,
    pub path: Option<PathBuf>,
    pub size: u64,
    pub state: TaskState,
    pub error: Option<TaskError>,
    /// Digests of enabled algorithms in registry order
    pub digests: Vec<DigestEntry>,
    pub match_state: MatchState,
    pub matched_algorithm: Option<&'static str>,
}

impl TaskReport {
    /// Digest by algorithm id
    pub fn digest(&self, algorithm: &str) -> Option<&[u8]> {
        self.digests
            .iter()
            .find(|entry| entry.algorithm.eq_ignore_ascii_case(algorithm))
            .map(|entry| entry.digest.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(name: &str) -> AlgorithmIndex {
        AlgorithmRegistry::global().index_of(name).unwrap()
    }

    fn digests(entries: &[(&str, &[u8])]) -> Vec<Option<Vec<u8>>> {
        let mut digests = vec![None; AlgorithmRegistry::global().len()];
        for (name, digest) in entries {
            digests[index(name)] = Some(digest.to_vec());
        }
        digests
    }

    #[test]
    fn test_no_expected_hash() {
        let digests = digests(&[("crc32", b"\x01\x02\x03\x04")]);
        assert_eq!(MatchState::evaluate(&[], &digests), MatchState::NoExpectedHash);
    }

    #[test]
    fn test_all_mismatch() {
        let digests = digests(&[("crc32", b"\x01\x02\x03\x04"), ("sha256", &[7; 32])]);
        let expected = vec![vec![0xff; 4]];
        assert_eq!(MatchState::evaluate(&expected, &digests), MatchState::AllMismatch);
    }

    #[test]
    fn test_secure_match_beats_insecure_match() {
        let digests = digests(&[("crc32", b"\x01\x02\x03\x04"), ("sha256", &[7; 32])]);
        let expected = vec![b"\x01\x02\x03\x04".to_vec(), vec![7; 32]];
        assert_eq!(
            MatchState::evaluate(&expected, &digests),
            MatchState::MatchedAtAlgorithm(index("sha256"))
        );
    }

    #[test]
    fn test_first_insecure_match_wins_without_secure_match() {
        let digests = digests(&[("crc32", &[1; 4]), ("md5", &[2; 16]), ("sha256", &[3; 32])]);
        let expected = vec![vec![2; 16], vec![1; 4]];
        assert_eq!(
            MatchState::evaluate(&expected, &digests),
            MatchState::MatchedAtAlgorithm(index("crc32"))
        );
    }

    #[test]
    fn test_first_secure_match_in_registry_order() {
        let digests = digests(&[("sha256", &[3; 32]), ("blake3", &[3; 32])]);
        let expected = vec![vec![3; 32]];
        assert_eq!(
            MatchState::evaluate(&expected, &digests),
            MatchState::MatchedAtAlgorithm(index("sha256"))
        );
    }

    #[test]
    fn test_task_state_roundtrip() {
        for state in [
            TaskState::Opening,
            TaskState::Reading,
            TaskState::Hashing,
            TaskState::Finalizing,
            TaskState::Done,
            TaskState::Errored,
            TaskState::Cancelled,
        ] {
            assert_eq!(TaskState::from_u8(state as u8), state);
        }
        assert!(TaskState::Cancelled.is_terminal());
        assert!(!TaskState::Hashing.is_terminal());
    }

    #[test]
    #[should_panic(expected = "invalid task state 7")]
    fn test_task_state_rejects_unknown_byte() {
        TaskState::from_u8(7);
    }
}
