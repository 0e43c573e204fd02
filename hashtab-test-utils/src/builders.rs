//! Builders for test files with known content

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Deterministic pseudo-random bytes
///
/// The same `(len, seed)` always yields the same content, so tests can hash
/// the buffer directly to get reference digests.
pub fn pattern_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed ^ 0x9e37_79b9_7f4a_7c15;
    (0..len)
        .map(|_| {
            // xorshift64*
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            (state.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 56) as u8
        })
        .collect()
}

/// Builder for files written into a private temporary directory
pub struct TestFileBuilder {
    dir: TempDir,
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl TestFileBuilder {
    /// Create a new builder with an empty temporary directory
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
            files: Vec::new(),
        })
    }

    /// Add a file with explicit content
    pub fn with_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> std::io::Result<Self> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = content.into();
        std::fs::write(&path, &content)?;
        self.files.push((path, content));
        Ok(self)
    }

    /// Add a file of `len` pattern bytes
    pub fn with_pattern_file(self, name: &str, len: usize, seed: u64) -> std::io::Result<Self> {
        self.with_file(name, pattern_bytes(len, seed))
    }

    /// Root of the temporary directory
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Paths of all files added so far
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(path, _)| path.clone()).collect()
    }

    /// Content written for `path`
    pub fn content(&self, path: &Path) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, content)| content.as_slice())
    }

    /// Files with their content, in insertion order
    pub fn files(&self) -> &[(PathBuf, Vec<u8>)] {
        &self.files
    }
}

/// Write `content` into a standalone temporary file
pub fn temp_file_with(content: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_deterministic() {
        assert_eq!(pattern_bytes(1000, 7), pattern_bytes(1000, 7));
        assert_ne!(pattern_bytes(1000, 7), pattern_bytes(1000, 8));
        assert_eq!(pattern_bytes(0, 1), Vec::<u8>::new());
    }

    #[test]
    fn test_builder_writes_files() {
        let builder = TestFileBuilder::new()
            .unwrap()
            .with_file("a.bin", b"abc".to_vec())
            .unwrap()
            .with_pattern_file("nested/b.bin", 64, 1)
            .unwrap();

        let paths = builder.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"abc");
        assert_eq!(std::fs::read(&paths[1]).unwrap().len(), 64);
        assert_eq!(builder.content(&paths[1]), Some(pattern_bytes(64, 1).as_slice()));
    }
}
