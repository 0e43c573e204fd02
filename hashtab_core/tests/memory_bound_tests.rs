//! Memory bound under contention

mod common;

use common::{coordinator, one_shot, small_blocks};
use hashtab_core::{AlgorithmSelection, BlockPool, Coordinator, MemorySource, TaskState};
use hashtab_test_utils::{FaultySource, pattern_bytes};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_outstanding_blocks_never_exceed_bound() {
    let coordinator = coordinator(&["crc32", "sha512", "blake2b"], small_blocks(1024, 4));
    let mut expected = Vec::new();
    for seed in 0..64 {
        let data = pattern_bytes(3000 + seed as usize * 97, seed);
        expected.push(one_shot("sha512", &data));
        coordinator
            .add_source(Arc::new(MemorySource::new(data)), vec![])
            .unwrap();
    }

    coordinator.start_all().unwrap();
    coordinator.wait().await;

    let stats = coordinator.pool().stats();
    assert!(stats.peak_outstanding <= 4, "peak {}", stats.peak_outstanding);
    assert_eq!(coordinator.pool().outstanding(), 0);
    assert_eq!(coordinator.pool().waiting(), 0);
    // 64 tasks on 4 blocks must have waited for each other
    assert!(stats.exhausted > 0);

    for (task, digest) in coordinator.tasks().iter().zip(expected) {
        assert_eq!(task.state(), TaskState::Done);
        assert_eq!(task.report().digest("sha512"), Some(digest.as_slice()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_block_serializes_tasks() {
    let coordinator = coordinator(&["md5"], small_blocks(512, 1));
    for seed in 0..8 {
        let source = FaultySource::new(pattern_bytes(2048, seed)).with_delay(Duration::from_millis(1));
        coordinator.add_source(Arc::new(source), vec![]).unwrap();
    }
    coordinator.start_all().unwrap();
    coordinator.wait().await;

    assert_eq!(coordinator.pool().peak_outstanding(), 1);
    assert!(coordinator.tasks().iter().all(|t| t.state() == TaskState::Done));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coordinators_sharing_a_pool_share_the_bound() {
    let pool = BlockPool::new(256, 2);
    let first = Coordinator::with_pool(
        Arc::clone(&pool),
        AlgorithmSelection::from_names(["crc32"]).unwrap(),
        100,
    )
    .unwrap();
    let second = Coordinator::with_pool(
        Arc::clone(&pool),
        AlgorithmSelection::from_names(["sha1"]).unwrap(),
        100,
    )
    .unwrap();

    for seed in 0..10 {
        first
            .add_source(Arc::new(MemorySource::new(pattern_bytes(4000, seed))), vec![])
            .unwrap();
        second
            .add_source(Arc::new(MemorySource::new(pattern_bytes(4000, seed))), vec![])
            .unwrap();
    }
    first.start_all().unwrap();
    second.start_all().unwrap();
    tokio::join!(first.wait(), second.wait());

    assert!(pool.peak_outstanding() <= 2);
    assert_eq!(pool.outstanding(), 0);
}
