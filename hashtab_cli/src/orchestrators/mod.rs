//! Command orchestrators
//!
//! Orchestrators coordinate between the CLI layer and the core library.

pub mod hash_orchestrator;

pub use hash_orchestrator::{HashOptions, HashOrchestrator, HashRun};
