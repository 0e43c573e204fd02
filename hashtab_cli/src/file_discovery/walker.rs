//! Directory walker for file discovery

use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{DiscoveredFile, DiscoveryError, Result, filter::FileFilter};

/// Options for file discovery
#[derive(Debug, Clone, Default)]
pub struct FileDiscoveryOptions {
    /// Patterns to include (glob patterns)
    pub include_patterns: Vec<String>,
    /// Patterns to exclude (glob patterns, override includes)
    pub exclude_patterns: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Follow symbolic links
    pub follow_links: bool,
}

impl FileDiscoveryOptions {
    /// Create new options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// Streaming iterator over the matching files of one directory
pub struct FileDiscovery {
    walker: walkdir::IntoIter,
    filter: FileFilter,
}

impl FileDiscovery {
    pub fn new(path: &Path, options: FileDiscoveryOptions) -> Result<Self> {
        if !path.exists() {
            return Err(DiscoveryError::PathNotFound(path.to_path_buf()));
        }

        let filter = FileFilter::new(&options.include_patterns, &options.exclude_patterns)?;

        let mut walker = WalkDir::new(path)
            .follow_links(options.follow_links)
            .sort_by_file_name();
        if !options.recursive {
            walker = walker.max_depth(1);
        }

        Ok(Self {
            walker: walker.into_iter(),
            filter,
        })
    }

    fn should_include_entry(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_file() && self.filter.should_include(entry.path())
    }
}

impl Iterator for FileDiscovery {
    type Item = Result<DiscoveredFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if !self.should_include_entry(&entry) {
                        continue;
                    }
                    match entry.metadata() {
                        Ok(metadata) => {
                            return Some(Ok(DiscoveredFile {
                                path: entry.path().to_path_buf(),
                                size: metadata.len(),
                            }));
                        }
                        Err(e) => {
                            // Skip files we can't read metadata for
                            log::warn!("Failed to read metadata for {:?}: {}", entry.path(), e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Walk error: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_directory() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::write(base.join("disk1.iso"), b"test").unwrap();
        fs::write(base.join("disk2.img"), b"test").unwrap();
        fs::write(base.join("notes.txt"), b"test").unwrap();

        let subdir = base.join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("nested.iso"), b"test").unwrap();
        fs::write(subdir.join("nested.txt"), b"test").unwrap();

        dir
    }

    fn names(files: &[DiscoveredFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_discovery_recursive_with_patterns() {
        let dir = create_test_directory();
        let options = FileDiscoveryOptions::new()
            .with_include_patterns(vec!["*.iso".to_string(), "*.img".to_string()])
            .with_recursive(true);

        let files = super::super::discover_files(dir.path(), options).unwrap();
        assert_eq!(names(&files), vec!["disk1.iso", "disk2.img", "nested.iso"]);
        assert!(files.iter().all(|f| f.size == 4));
    }

    #[test]
    fn test_discovery_non_recursive() {
        let dir = create_test_directory();
        let files = super::super::discover_files(dir.path(), FileDiscoveryOptions::new()).unwrap();
        assert_eq!(names(&files), vec!["disk1.iso", "disk2.img", "notes.txt"]);
    }

    #[test]
    fn test_discovery_exclude_overrides_include() {
        let dir = create_test_directory();
        let options = FileDiscoveryOptions::new()
            .with_include_patterns(vec!["*.iso".to_string()])
            .with_exclude_patterns(vec!["**/subdir/*".to_string()])
            .with_recursive(true);

        let files = super::super::discover_files(dir.path(), options).unwrap();
        assert_eq!(names(&files), vec!["disk1.iso"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(FileDiscovery::new(&dir.path().join("gone"), FileDiscoveryOptions::new()).is_err());
    }
}
