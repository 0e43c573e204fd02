//! Completion signalling, cancellation and observer lifecycle

mod common;

use common::{coordinator, small_blocks};
use hashtab_core::{CoreConfig, MatchState, MemorySource, TaskError, TaskState};
use hashtab_test_utils::{Gate, RecordingObserver, pattern_bytes};
use std::sync::Arc;
use std::time::Duration;

async fn run_with_tasks(count: usize) -> Arc<RecordingObserver> {
    let coordinator = coordinator(&["crc32"], small_blocks(100, 2));
    let observer = Arc::new(RecordingObserver::new());
    coordinator.attach_observer(observer.clone());

    for seed in 0..count {
        coordinator
            .add_source(
                Arc::new(MemorySource::new(pattern_bytes(250, seed as u64))),
                vec![],
            )
            .unwrap();
    }
    coordinator.start_all().unwrap();
    coordinator.wait().await;
    observer
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_all_finished_fires_exactly_once() {
    for count in [0, 1, 2, 50] {
        let observer = run_with_tasks(count).await;
        assert_eq!(observer.all_finished_count(), 1, "{count} tasks");
        assert_eq!(observer.finished_tasks().len(), count);
        // Nothing is reported after completion
        assert_eq!(
            observer.events().last(),
            Some(&hashtab_core::HashEvent::AllFinished)
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_is_monotonic_and_reaches_resolution() {
    let observer = run_with_tasks(40).await;
    let steps = observer.progress_steps();
    assert!(steps.windows(2).all(|w| w[0] < w[1]), "{steps:?}");
    assert_eq!(steps.last(), Some(&256));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_stops_tasks_mid_read() {
    let coordinator = coordinator(&["sha256"], small_blocks(64, 4));
    let observer = Arc::new(RecordingObserver::new());
    coordinator.attach_observer(observer.clone());

    let gate = Gate::new();
    let sources: Vec<_> = (0..4)
        .map(|seed| Arc::new(gate.source(pattern_bytes(1024, seed))))
        .collect();
    for source in &sources {
        coordinator
            .add_source(source.clone(), vec![vec![0; 32]])
            .unwrap();
    }
    coordinator.start_all().unwrap();

    // Wait until every task is parked in its first read
    while sources.iter().any(|source| source.waiting() == 0) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    coordinator.cancel(false).await;
    gate.open();
    coordinator.wait().await;

    for task in coordinator.tasks() {
        assert_eq!(task.state(), TaskState::Cancelled);
        assert_eq!(task.error(), Some(&TaskError::Cancelled));
        assert_eq!(task.match_state(), MatchState::AllMismatch);
        assert!(task.report().digests.is_empty());
    }
    assert_eq!(observer.all_finished_count(), 1);
    // Every read was discarded, so nothing counts as hashed
    assert_eq!(coordinator.hashed_bytes(), 0);
    assert_eq!(coordinator.progress(), 0);
    assert!(observer.progress_steps().is_empty());
    assert_eq!(coordinator.pool().outstanding(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_and_wait_returns_once_all_finished() {
    let coordinator = coordinator(&["blake2b", "sha3-512"], small_blocks(256, 2));
    for seed in 0..16 {
        coordinator
            .add_source(
                Arc::new(MemorySource::new(pattern_bytes(64 * 1024, seed))),
                vec![],
            )
            .unwrap();
    }
    coordinator.start_all().unwrap();
    coordinator.cancel(true).await;

    assert!(coordinator.is_finished());
    assert!(coordinator.tasks().iter().all(|task| task.state().is_terminal()));
    assert_eq!(coordinator.pool().outstanding(), 0);
}

#[tokio::test]
async fn test_cancel_before_start_then_start() {
    let coordinator = coordinator(&["crc32"], CoreConfig::test());
    coordinator
        .add_source(Arc::new(MemorySource::new(vec![1; 10_000])), vec![])
        .unwrap();
    coordinator.cancel(true).await;
    coordinator.start_all().unwrap();
    coordinator.wait().await;

    assert_eq!(coordinator.tasks()[0].state(), TaskState::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_detached_observer_receives_nothing_more() {
    let coordinator = coordinator(&["crc32"], small_blocks(16, 1));
    let observer = Arc::new(RecordingObserver::new());
    coordinator.attach_observer(observer.clone());

    let gate = Gate::new();
    let source = Arc::new(gate.source(pattern_bytes(512, 1)));
    coordinator.add_source(source.clone(), vec![]).unwrap();
    coordinator.start_all().unwrap();

    while source.waiting() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(coordinator.detach_observer().is_some());
    let seen = observer.events().len();

    gate.open();
    coordinator.wait().await;
    assert_eq!(observer.events().len(), seen);
    assert_eq!(observer.all_finished_count(), 0);
}

#[tokio::test]
async fn test_wait_before_start_returns() {
    let coordinator = coordinator(&["crc32"], CoreConfig::test());
    coordinator.wait().await;
    assert!(!coordinator.is_finished());
}

#[tokio::test]
async fn test_observer_wait_helper() {
    let coordinator = coordinator(&["xxh64"], CoreConfig::test());
    let observer = Arc::new(RecordingObserver::new());
    coordinator.attach_observer(observer.clone());
    coordinator
        .add_source(Arc::new(MemorySource::new(pattern_bytes(9000, 5))), vec![])
        .unwrap();
    coordinator.start_all().unwrap();

    tokio::time::timeout(Duration::from_secs(10), observer.wait_all_finished())
        .await
        .expect("completion within timeout");
    coordinator.wait().await;
    assert!(coordinator.is_finished());
    assert_eq!(observer.all_finished_count(), 1);
}
