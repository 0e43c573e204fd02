//! Common test utilities for integration tests
//!
//! Shared helpers for building coordinators and computing reference digests
//! independently of the pipeline.

#![allow(dead_code)]

use hashtab_core::{AlgorithmRegistry, AlgorithmSelection, Coordinator, CoreConfig, HashParams};
use sha2::Digest;

/// Coordinator with the given algorithms and configuration
pub fn coordinator(names: &[&str], config: CoreConfig) -> Coordinator {
    let selection = AlgorithmSelection::from_names(names).expect("valid algorithm names");
    Coordinator::new(config, selection).expect("valid configuration")
}

/// Configuration with small blocks and a tight allocation bound
pub fn small_blocks(block_size: usize, max_allocations: usize) -> CoreConfig {
    CoreConfig {
        block_size,
        max_allocations,
        ..CoreConfig::default()
    }
}

/// One-shot digest through the registry, bypassing the pipeline
pub fn one_shot(name: &str, data: &[u8]) -> Vec<u8> {
    let (_, algorithm) = AlgorithmRegistry::global()
        .by_name(name)
        .expect("registered algorithm");
    algorithm
        .hash_bytes(data, &HashParams::default())
        .expect("default parameters are valid")
}

/// CRC32 via crc32fast, big-endian
pub fn crc32(data: &[u8]) -> Vec<u8> {
    crc32fast::hash(data).to_be_bytes().to_vec()
}

/// SHA-256 via sha2
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha2::Sha256::digest(data).to_vec()
}
