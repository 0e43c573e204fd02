//! Coordinator owning a batch of file hashing tasks
//!
//! The coordinator registers tasks, starts them on the current tokio runtime,
//! aggregates byte progress into discrete steps, and signals completion once
//! every task has reported, whether it succeeded, failed or was cancelled.

use crate::error::{InternalError, TaskError, ValidationError};
use crate::hashing::AlgorithmSelection;
use crate::latch::CountdownLatch;
use crate::memory::BlockPool;
use crate::progress::HashObserver;
use crate::source::{BlockSource, FileSource};
use crate::task::{FileHashTask, TaskId, TaskReport};
use crate::{CoreConfig, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Observer plus the last progress step it was told about
struct ObserverSlot {
    observer: Option<Arc<dyn HashObserver>>,
    last_step: Option<u32>,
}

/// State shared between the coordinator handle and its running tasks
pub(crate) struct Shared {
    pool: Arc<BlockPool>,
    selection: AlgorithmSelection,
    progress_resolution: u32,
    /// Tasks added so far; `None` once started
    pending: Mutex<Option<Vec<Arc<FileHashTask>>>>,
    /// Task arena, frozen at start
    tasks: OnceCell<Box<[Arc<FileHashTask>]>>,
    total_bytes: AtomicU64,
    hashed_bytes: AtomicU64,
    not_finished: OnceCell<CountdownLatch>,
    finished: watch::Sender<bool>,
    observer: Mutex<ObserverSlot>,
}

impl Shared {
    pub(crate) fn pool(&self) -> &Arc<BlockPool> {
        &self.pool
    }

    pub(crate) fn selection(&self) -> &AlgorithmSelection {
        &self.selection
    }

    pub(crate) fn task(&self, id: TaskId) -> Option<Arc<FileHashTask>> {
        self.tasks.get()?.get(id.index()).cloned()
    }

    fn lock_observer(&self) -> MutexGuard<'_, ObserverSlot> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<Vec<Arc<FileHashTask>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn step(&self, hashed: u64, total: u64) -> u32 {
        let hashed = hashed.min(total);
        let step = u128::from(hashed) * u128::from(self.progress_resolution) / u128::from(total);
        step as u32
    }

    /// Credit hashed bytes; observers hear only about step changes
    pub(crate) fn on_task_progress(&self, bytes: u64) {
        let total = self.total_bytes.load(Ordering::Acquire);
        if total == 0 || bytes == 0 {
            return;
        }

        let before = self.hashed_bytes.fetch_add(bytes, Ordering::AcqRel);
        let after = before.saturating_add(bytes);
        let (from, to) = (self.step(before, total), self.step(after, total));
        if from == to {
            return;
        }

        let mut slot = self.lock_observer();
        // Concurrent credits may arrive out of order; only report forward moves
        if slot.last_step.is_some_and(|last| last >= to) {
            return;
        }
        slot.last_step = Some(to);
        if let Some(observer) = &slot.observer {
            observer.on_progress(to);
        }
    }

    pub(crate) fn on_task_finished(&self, id: TaskId) {
        if let Some(observer) = &self.lock_observer().observer {
            observer.on_task_finished(id);
        }

        if self.not_finished.get().is_some_and(CountdownLatch::count_down) {
            self.all_finished();
        }
    }

    fn all_finished(&self) {
        log::debug!(
            "All tasks finished: {} of {} bytes credited",
            self.hashed_bytes.load(Ordering::Acquire),
            self.total_bytes.load(Ordering::Acquire)
        );
        if let Some(observer) = &self.lock_observer().observer {
            observer.on_all_finished();
        }
        self.finished.send_replace(true);
    }
}

/// Owner of a batch of [`FileHashTask`]s
///
/// Typical use: add tasks, attach an observer, [`start_all`](Self::start_all),
/// then [`wait`](Self::wait). Tasks keep the shared state alive while they
/// run, so dropping the coordinator does not stop them.
///
/// Observer callbacks run while an internal lock is held; an observer must not
/// attach or detach observers from inside a callback.
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    /// Create a coordinator with its own block pool
    pub fn new(config: CoreConfig, selection: AlgorithmSelection) -> Result<Self> {
        config.validate()?;
        let pool = BlockPool::new(config.block_size, config.max_allocations);
        Self::with_pool(pool, selection, config.progress_resolution)
    }

    /// Create a coordinator drawing blocks from an existing pool
    ///
    /// Coordinators sharing a pool share its memory bound.
    pub fn with_pool(
        pool: Arc<BlockPool>,
        selection: AlgorithmSelection,
        progress_resolution: u32,
    ) -> Result<Self> {
        if progress_resolution == 0 {
            return Err(
                ValidationError::invalid_configuration("progress_resolution must be positive")
                    .into(),
            );
        }

        let (finished, _) = watch::channel(false);
        Ok(Self {
            shared: Arc::new(Shared {
                pool,
                selection,
                progress_resolution,
                pending: Mutex::new(Some(Vec::new())),
                tasks: OnceCell::new(),
                total_bytes: AtomicU64::new(0),
                hashed_bytes: AtomicU64::new(0),
                not_finished: OnceCell::new(),
                finished,
                observer: Mutex::new(ObserverSlot {
                    observer: None,
                    last_step: None,
                }),
            }),
        })
    }

    /// Open `path` and register a task for it
    ///
    /// A file that cannot be opened is still registered: its task finishes
    /// with [`TaskError::OpenFailed`] once started.
    pub async fn add_task(
        &self,
        path: impl AsRef<Path>,
        expected_hashes: Vec<Vec<u8>>,
    ) -> Result<TaskId> {
        let path = path.as_ref();
        if self.is_started() {
            return Err(ValidationError::already_started("add_task").into());
        }

        match FileSource::open(path).await {
            Ok(source) => self.add_source(Arc::new(source), expected_hashes),
            Err(error) => {
                log::warn!("Failed to open {}: {error}", path.display());
                let error = TaskError::open_failed(&error);
                self.register(|id| {
                    FileHashTask::failed_open(id, path.to_path_buf(), error, expected_hashes)
                })
            }
        }
    }

    /// Open `path` and register a task for it, failing if it cannot be opened
    ///
    /// Unlike [`add_task`](Self::add_task), nothing is registered on failure
    /// and the open error is returned as [`Error::Io`](crate::Error::Io).
    pub async fn add_task_checked(
        &self,
        path: impl AsRef<Path>,
        expected_hashes: Vec<Vec<u8>>,
    ) -> Result<TaskId> {
        if self.is_started() {
            return Err(ValidationError::already_started("add_task_checked").into());
        }
        let source = FileSource::open(path).await?;
        self.add_source(Arc::new(source), expected_hashes)
    }

    /// Register a task reading from an arbitrary source
    pub fn add_source(
        &self,
        source: Arc<dyn BlockSource>,
        expected_hashes: Vec<Vec<u8>>,
    ) -> Result<TaskId> {
        let selection = &self.shared.selection;
        self.register(|id| FileHashTask::new(id, source, expected_hashes, selection))
    }

    fn register(&self, make: impl FnOnce(TaskId) -> FileHashTask) -> Result<TaskId> {
        let mut pending = self.shared.lock_pending();
        let tasks = pending
            .as_mut()
            .ok_or_else(|| ValidationError::already_started("add_task"))?;

        let id = TaskId::new(tasks.len());
        let task = make(id);
        self.shared
            .total_bytes
            .fetch_add(task.size(), Ordering::AcqRel);
        tasks.push(Arc::new(task));
        Ok(id)
    }

    /// Start every registered task on the current tokio runtime
    ///
    /// With no tasks, completion is signalled immediately. Can be called once.
    pub fn start_all(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| InternalError::no_runtime(e.to_string()))?;

        let tasks = self
            .shared
            .lock_pending()
            .take()
            .ok_or_else(|| ValidationError::already_started("start_all"))?;
        let count = tasks.len();

        if self
            .shared
            .not_finished
            .set(CountdownLatch::new(count))
            .is_err()
            || self.shared.tasks.set(tasks.into_boxed_slice()).is_err()
        {
            return Err(InternalError::assertion("coordinator started twice").into());
        }

        log::debug!(
            "Starting {count} tasks, {} bytes, {} algorithms",
            self.total_bytes(),
            self.shared.selection.len()
        );

        if count == 0 {
            self.shared.all_finished();
            return Ok(());
        }

        for task in self.shared.tasks.get().into_iter().flat_map(|tasks| tasks.iter()) {
            runtime.spawn(Arc::clone(task).run(Arc::clone(&self.shared)));
        }
        Ok(())
    }

    /// Ask every task to stop; with `wait`, return once all have finished
    pub async fn cancel(&self, wait: bool) {
        log::debug!("Cancelling {} tasks", self.len());
        for task in self.tasks() {
            task.request_cancel();
        }
        if wait {
            self.wait().await;
        }
    }

    /// Wait until every started task has finished
    ///
    /// Returns immediately if the coordinator was never started.
    pub async fn wait(&self) {
        if !self.is_started() {
            return;
        }
        let mut finished = self.shared.finished.subscribe();
        // The sender lives in `shared`, which we hold
        let _ = finished.wait_for(|done| *done).await;
    }

    /// Attach an observer, replacing any previous one
    pub fn attach_observer(&self, observer: Arc<dyn HashObserver>) {
        self.shared.lock_observer().observer = Some(observer);
    }

    /// Detach the observer; no callback reaches it after this returns
    pub fn detach_observer(&self) -> Option<Arc<dyn HashObserver>> {
        self.shared.lock_observer().observer.take()
    }

    /// Builder-style [`attach_observer`](Self::attach_observer)
    pub fn with_observer(self, observer: Arc<dyn HashObserver>) -> Self {
        self.attach_observer(observer);
        self
    }

    pub fn is_started(&self) -> bool {
        self.shared.tasks.get().is_some()
    }

    /// Whether every task has finished
    pub fn is_finished(&self) -> bool {
        *self.shared.finished.borrow()
    }

    /// Look up a task
    pub fn task(&self, id: TaskId) -> Option<Arc<FileHashTask>> {
        match self.shared.lock_pending().as_ref() {
            Some(pending) => pending.get(id.index()).cloned(),
            None => self.shared.task(id),
        }
    }

    /// All tasks in the order they were added
    pub fn tasks(&self) -> Vec<Arc<FileHashTask>> {
        match self.shared.lock_pending().as_ref() {
            Some(pending) => pending.clone(),
            None => self
                .shared
                .tasks
                .get()
                .map(|tasks| tasks.to_vec())
                .unwrap_or_default(),
        }
    }

    /// Reports for all tasks in the order they were added
    pub fn reports(&self) -> Vec<TaskReport> {
        self.tasks().iter().map(|task| task.report()).collect()
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the sizes of all registered tasks
    pub fn total_bytes(&self) -> u64 {
        self.shared.total_bytes.load(Ordering::Acquire)
    }

    /// Bytes credited so far
    pub fn hashed_bytes(&self) -> u64 {
        self.shared.hashed_bytes.load(Ordering::Acquire)
    }

    /// Current progress step out of [`progress_resolution`](Self::progress_resolution)
    pub fn progress(&self) -> u32 {
        let total = self.total_bytes();
        if total == 0 {
            return if self.is_finished() {
                self.shared.progress_resolution
            } else {
                0
            };
        }
        self.shared.step(self.hashed_bytes(), total)
    }

    pub fn progress_resolution(&self) -> u32 {
        self.shared.progress_resolution
    }

    pub fn selection(&self) -> &AlgorithmSelection {
        &self.shared.selection
    }

    pub fn pool(&self) -> &Arc<BlockPool> {
        &self.shared.pool
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("tasks", &self.len())
            .field("started", &self.is_started())
            .field("finished", &self.is_finished())
            .field("total_bytes", &self.total_bytes())
            .field("hashed_bytes", &self.hashed_bytes())
            .finish()
    }
}
