//! Input file discovery
//!
//! Turns the paths given on the command line into the list of files to hash:
//! files are taken as-is, directories are walked and filtered with include
//! and exclude glob patterns.

mod filter;
mod walker;

pub use filter::{FileFilter, PatternMatcher};
pub use walker::{FileDiscovery, FileDiscoveryOptions};

use std::path::{Path, PathBuf};

/// Result of file discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path to the discovered file
    pub path: PathBuf,
    /// Size of the file in bytes at discovery time
    pub size: u64,
}

/// Error type for file discovery operations
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Result type for file discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Expand command-line paths into files, in argument order
///
/// Explicit file arguments bypass the patterns; directory contents are
/// filtered and sorted by name.
pub fn collect_inputs(paths: &[PathBuf], options: &FileDiscoveryOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in FileDiscovery::new(path, options.clone())? {
                files.push(entry?.path);
            }
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(DiscoveryError::PathNotFound(path.clone()));
        }
    }
    Ok(files)
}

/// Convenience function to discover files in a directory
pub fn discover_files(path: &Path, options: FileDiscoveryOptions) -> Result<Vec<DiscoveredFile>> {
    FileDiscovery::new(path, options)?.collect()
}
