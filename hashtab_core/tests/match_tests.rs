//! Expected-hash matching through the full pipeline

mod common;

use common::{coordinator, crc32, one_shot, sha256};
use hashtab_core::{AlgorithmRegistry, CoreConfig, MatchState, MemorySource, TaskId};
use hashtab_test_utils::pattern_bytes;
use std::sync::Arc;

async fn verdict(names: &[&str], data: &[u8], expected: Vec<Vec<u8>>) -> MatchState {
    let coordinator = coordinator(names, CoreConfig::test());
    let id: TaskId = coordinator
        .add_source(Arc::new(MemorySource::new(data.to_vec())), expected)
        .unwrap();
    coordinator.start_all().unwrap();
    coordinator.wait().await;
    coordinator.task(id).unwrap().match_state()
}

fn index(name: &str) -> usize {
    AlgorithmRegistry::global().index_of(name).unwrap()
}

#[tokio::test]
async fn test_secure_match_preferred() {
    let data = pattern_bytes(10_000, 1);
    let expected = vec![crc32(&data), sha256(&data)];
    assert_eq!(
        verdict(&["crc32", "sha256"], &data, expected).await,
        MatchState::MatchedAtAlgorithm(index("sha256"))
    );
}

#[tokio::test]
async fn test_insecure_match_when_no_secure_match() {
    let data = pattern_bytes(10_000, 2);
    let expected = vec![vec![0xaa; 32], crc32(&data)];
    assert_eq!(
        verdict(&["crc32", "sha256"], &data, expected).await,
        MatchState::MatchedAtAlgorithm(index("crc32"))
    );
}

#[tokio::test]
async fn test_mismatch_and_no_expectation() {
    let data = pattern_bytes(100, 3);
    assert_eq!(
        verdict(&["md5"], &data, vec![vec![0; 16]]).await,
        MatchState::AllMismatch
    );
    assert_eq!(verdict(&["md5"], &data, vec![]).await, MatchState::NoExpectedHash);
}

#[tokio::test]
async fn test_expected_hash_of_disabled_algorithm_does_not_match() {
    let data = pattern_bytes(500, 4);
    assert_eq!(
        verdict(&["crc32"], &data, vec![sha256(&data)]).await,
        MatchState::AllMismatch
    );
}

#[tokio::test]
async fn test_ed2k_match_is_insecure() {
    let data = pattern_bytes(20_000, 5);
    let expected = vec![one_shot("ed2k", &data), one_shot("tth", &data)];
    assert_eq!(
        verdict(&["ed2k", "tth"], &data, expected).await,
        MatchState::MatchedAtAlgorithm(index("tth"))
    );
}
