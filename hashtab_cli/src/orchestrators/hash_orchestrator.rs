//! Hash command orchestrator
//!
//! Drives one coordinator over the discovered files: registers tasks, wires
//! the progress renderer, waits for completion or an interrupt, and collects
//! the per-file reports.

use crate::progress::render_progress;
use anyhow::{Context, Result};
use hashtab_core::memory::PoolStats;
use hashtab_core::{AlgorithmSelection, ChannelObserver, Coordinator, CoreConfig, TaskReport};
use log::{debug, warn};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What to hash and how
#[derive(Debug, Clone)]
pub struct HashOptions {
    pub selection: AlgorithmSelection,
    /// Expected digests applied to every file
    pub expected: Vec<Vec<u8>>,
    pub show_progress: bool,
}

/// Outcome of one hash run
#[derive(Debug)]
pub struct HashRun {
    /// One report per input file, in input order
    pub reports: Vec<TaskReport>,
    pub elapsed: Duration,
    pub total_bytes: u64,
    /// Whether the run was interrupted
    pub cancelled: bool,
    pub pool: PoolStats,
}

/// Orchestrator for the hash command
pub struct HashOrchestrator {
    config: CoreConfig,
}

impl HashOrchestrator {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Hash `files`, cancelling on Ctrl-C
    pub async fn run(&self, files: &[PathBuf], options: HashOptions) -> Result<HashRun> {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Without a signal handler the run simply cannot be interrupted
                debug!("Ctrl-C handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(files, options, interrupt).await
    }

    /// Hash `files`, cancelling all tasks when `interrupt` completes first
    pub async fn run_until(
        &self,
        files: &[PathBuf],
        options: HashOptions,
        interrupt: impl Future<Output = ()>,
    ) -> Result<HashRun> {
        let start = Instant::now();
        let coordinator = Coordinator::new(self.config.clone(), options.selection)
            .context("Failed to create coordinator")?;

        for file in files {
            coordinator
                .add_task(file, options.expected.clone())
                .await
                .with_context(|| format!("Failed to add {}", file.display()))?;
        }
        debug!(
            "Hashing {} file(s), {} bytes, with {} algorithm(s)",
            coordinator.len(),
            coordinator.total_bytes(),
            coordinator.selection().len()
        );

        let renderer = if options.show_progress {
            let (observer, rx) = ChannelObserver::new();
            coordinator.attach_observer(Arc::new(observer));
            Some(tokio::spawn(render_progress(
                rx,
                coordinator.progress_resolution(),
                files.len(),
            )))
        } else {
            None
        };

        coordinator.start_all().context("Failed to start hashing")?;

        let cancelled = tokio::select! {
            _ = coordinator.wait() => false,
            _ = interrupt => {
                warn!("Interrupted, cancelling remaining files");
                coordinator.cancel(true).await;
                true
            }
        };

        // Completion was signalled, so the renderer has seen its last event
        coordinator.detach_observer();
        if let Some(handle) = renderer {
            let _ = handle.await;
        }

        Ok(HashRun {
            reports: coordinator.reports(),
            elapsed: start.elapsed(),
            total_bytes: coordinator.total_bytes(),
            cancelled,
            pool: coordinator.pool().stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashtab_core::TaskState;
    use hashtab_test_utils::TestFileBuilder;

    fn options(names: &[&str], expected: Vec<Vec<u8>>) -> HashOptions {
        HashOptions {
            selection: AlgorithmSelection::from_names(names).unwrap(),
            expected,
            show_progress: false,
        }
    }

    #[tokio::test]
    async fn test_run_reports_in_input_order() {
        let files = TestFileBuilder::new()
            .unwrap()
            .with_file("b.bin", b"second".to_vec())
            .unwrap()
            .with_file("a.bin", b"first".to_vec())
            .unwrap();

        let orchestrator = HashOrchestrator::new(CoreConfig::test());
        let run = orchestrator
            .run_until(&files.paths(), options(&["crc32"], vec![]), std::future::pending())
            .await
            .unwrap();

        assert!(!run.cancelled);
        assert_eq!(run.total_bytes, 11);
        let paths: Vec<_> = run.reports.iter().map(|r| r.path.clone().unwrap()).collect();
        assert_eq!(paths, files.paths());
        assert!(run.reports.iter().all(|r| r.state == TaskState::Done));
        assert!(run.pool.peak_outstanding <= CoreConfig::test().max_allocations);
    }

    #[tokio::test]
    async fn test_interrupt_cancels_everything() {
        let files = TestFileBuilder::new()
            .unwrap()
            .with_pattern_file("big.bin", 4 * 1024 * 1024, 1)
            .unwrap();

        let orchestrator = HashOrchestrator::new(CoreConfig::test());
        let run = orchestrator
            .run_until(&files.paths(), options(&["sha512"], vec![]), async {})
            .await
            .unwrap();

        assert!(run.cancelled);
        assert!(run.reports.iter().all(|r| r.state.is_terminal()));
    }

    #[tokio::test]
    async fn test_missing_file_still_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");

        let orchestrator = HashOrchestrator::new(CoreConfig::test());
        let run = orchestrator
            .run_until(
                std::slice::from_ref(&missing),
                options(&["md5"], vec![vec![0; 16]]),
                std::future::pending(),
            )
            .await
            .unwrap();

        assert_eq!(run.reports.len(), 1);
        assert_eq!(run.reports[0].state, TaskState::Errored);
    }
}
