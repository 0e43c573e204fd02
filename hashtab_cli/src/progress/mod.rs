//! Progress reporting module for the CLI
//!
//! The coordinator's [`ChannelObserver`](hashtab_core::ChannelObserver)
//! feeds events to a renderer task that drives an `indicatif` bar.

pub mod renderer;
pub mod utils;

// Re-export main helpers
pub use renderer::{ProgressRenderer, render_progress};
pub use utils::{format_bytes, format_duration, format_throughput};
