//! Test utilities for hashtab
//!
//! This crate provides fixture builders, recording observers and
//! fault-injecting block sources for testing the hashing pipeline.

pub mod builders;
pub mod mocks;
pub mod observer;

// Re-export commonly used types
pub use builders::{TestFileBuilder, pattern_bytes, temp_file_with};
pub use mocks::{Fault, FaultySource, Gate, GatedSource};
pub use observer::RecordingObserver;
