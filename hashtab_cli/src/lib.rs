//! Library half of the `hashtab` command line tool
//!
//! Everything the binary needs besides argument parsing lives here so it can
//! be exercised from integration tests.

pub mod config;
pub mod error;
pub mod file_discovery;
pub mod orchestrators;
pub mod output;
pub mod paths;
pub mod progress;
pub mod terminal;
