//! hashtab Core Library
//!
//! Concurrent, bounded-memory, multi-algorithm file hashing: every file is
//! read once in fixed-size blocks, each block is hashed by all enabled
//! algorithms in parallel, and the final digests are compared against
//! caller-supplied expected hashes.

pub mod coordinator;
mod dispatch;
pub mod error;
pub mod hashing;
pub mod latch;
pub mod memory;
pub mod progress;
pub mod source;
pub mod task;

// Re-export main types
pub use coordinator::Coordinator;
pub use dispatch::UnitTag;
pub use error::{Error, Result, TaskError};
pub use hashing::{
    AlgorithmIndex, AlgorithmRegistry, AlgorithmSelection, AlgorithmSpec, HashAccumulator,
    HashAlgorithmImpl, HashParams,
};
pub use memory::{BlockGuard, BlockPool, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_ALLOCATIONS};
pub use progress::{ChannelObserver, FnObserver, HashEvent, HashObserver, NullObserver};
pub use source::{BlockSource, FileSource, MemorySource};
pub use task::{DigestEntry, FileHashTask, MatchState, TaskId, TaskReport, TaskState};

use error::ValidationError;

/// Default number of discrete progress steps
pub const DEFAULT_PROGRESS_RESOLUTION: u32 = 256;

/// Core hashing configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Size of each read block in bytes
    pub block_size: usize,
    /// Upper bound on blocks outstanding at once
    pub max_allocations: usize,
    /// Number of discrete steps progress is reported in
    pub progress_resolution: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_allocations: DEFAULT_MAX_ALLOCATIONS,
            progress_resolution: DEFAULT_PROGRESS_RESOLUTION,
        }
    }
}

impl CoreConfig {
    /// Create a test configuration
    pub fn test() -> Self {
        Self {
            block_size: 4 * 1024, // 4KB blocks to exercise many reads per file
            max_allocations: 8,
            progress_resolution: DEFAULT_PROGRESS_RESOLUTION,
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ValidationError::invalid_configuration("block_size must be positive").into());
        }
        if self.max_allocations == 0 {
            return Err(
                ValidationError::invalid_configuration("max_allocations must be positive").into(),
            );
        }
        if self.progress_resolution == 0 {
            return Err(
                ValidationError::invalid_configuration("progress_resolution must be positive")
                    .into(),
            );
        }
        Ok(())
    }
}
