//! Positional block sources
//!
//! A [`BlockSource`] is anything a task can read fixed ranges from. Files are
//! the normal case; tests substitute in-memory and fault-injecting sources.

use crate::error::IoError;
use crate::memory::BlockGuard;
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Random-access byte source with a size fixed at open time
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Total number of bytes the source will deliver
    fn size(&self) -> u64;

    /// Path shown in reports, if the source has one
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Read exactly `len` bytes at `offset` into `block`
    ///
    /// On success the returned guard's filled length is `len`. On failure the
    /// block is dropped, which returns it to its pool.
    async fn read_at(&self, offset: u64, block: BlockGuard, len: usize) -> io::Result<BlockGuard>;
}

/// Whether a read error is temporary resource exhaustion worth retrying
pub fn is_transient(error: &io::Error) -> bool {
    if matches!(
        error.kind(),
        io::ErrorKind::OutOfMemory | io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    error.raw_os_error().is_some_and(is_transient_os_code)
}

#[cfg(unix)]
fn is_transient_os_code(code: i32) -> bool {
    matches!(code, libc::ENOMEM | libc::ENOBUFS | libc::EAGAIN)
}

#[cfg(windows)]
fn is_transient_os_code(code: i32) -> bool {
    // ERROR_NOT_ENOUGH_MEMORY, ERROR_OUTOFMEMORY, ERROR_NO_SYSTEM_RESOURCES,
    // ERROR_WORKING_SET_QUOTA
    matches!(code, 8 | 14 | 1450 | 1453)
}

#[cfg(not(any(unix, windows)))]
fn is_transient_os_code(_code: i32) -> bool {
    false
}

/// A regular file opened for positional reads
#[derive(Debug)]
pub struct FileSource {
    file: Arc<File>,
    size: u64,
    path: PathBuf,
}

impl FileSource {
    /// Open `path` and record its size
    ///
    /// Anything other than a regular file is rejected with
    /// [`IoErrorKind::NotAFile`](crate::error::IoErrorKind::NotAFile).
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref().to_path_buf();
        let with_path = |error: io::Error| IoError::from_std(error).with_path(&path);

        let file = tokio::fs::File::open(&path).await.map_err(with_path)?;
        let metadata = file.metadata().await.map_err(with_path)?;
        if !metadata.is_file() {
            return Err(IoError::not_a_file(&path));
        }

        Ok(Self {
            file: Arc::new(file.into_std().await),
            size: metadata.len(),
            path,
        })
    }
}

#[async_trait]
impl BlockSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    async fn read_at(
        &self,
        offset: u64,
        mut block: BlockGuard,
        len: usize,
    ) -> io::Result<BlockGuard> {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || {
            read_exact_at(&file, block.buffer_mut(len), offset)?;
            block.set_filled(len);
            Ok(block)
        })
        .await
        .map_err(|e| io::Error::other(format!("read worker failed: {e}")))?
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ));
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Bytes held in memory, mainly for tests and small inputs
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Arc<[u8]>,
    label: Option<PathBuf>,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            data: data.into(),
            label: None,
        }
    }

    /// Report `label` as this source's path
    pub fn with_label(mut self, label: impl Into<PathBuf>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[async_trait]
impl BlockSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn path(&self) -> Option<&Path> {
        self.label.as_deref()
    }

    async fn read_at(
        &self,
        offset: u64,
        mut block: BlockGuard,
        len: usize,
    ) -> io::Result<BlockGuard> {
        let start = usize::try_from(offset).map_err(io::Error::other)?;
        let source = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        let buffer = block.buffer_mut(len);
        if buffer.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "read larger than block",
            ));
        }
        buffer.copy_from_slice(source);
        block.set_filled(len);
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoErrorKind;
    use crate::memory::BlockPool;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_file_source_reads_ranges() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();
        file.flush().unwrap();

        let source = FileSource::open(file.path()).await.unwrap();
        assert_eq!(source.size(), 10);
        assert_eq!(source.path(), Some(file.path()));

        let pool = BlockPool::new(4, 1);
        let block = source.read_at(4, pool.acquire().await, 4).await.unwrap();
        assert_eq!(block.data(), b"4567");

        // Reading past the end fails and gives the block back to the pool
        let error = source.read_at(8, block, 4).await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_open_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let error = FileSource::open(dir.path()).await.unwrap_err();
        assert_eq!(error.kind, IoErrorKind::NotAFile);
        assert_eq!(error.path.as_deref(), Some(dir.path()));
        assert!(error.to_string().starts_with("Not a regular file"));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let error = FileSource::open("/definitely/not/here.bin").await.unwrap_err();
        assert_eq!(error.kind, IoErrorKind::FileNotFound);
        assert_eq!(error.path.as_deref(), Some(Path::new("/definitely/not/here.bin")));
        assert!(error.os_code().is_some());
        assert_eq!(error.to_string(), "File not found: /definitely/not/here.bin");
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new(b"hello world".to_vec()).with_label("greeting");
        let pool = BlockPool::new(8, 1);
        let block = source.read_at(6, pool.acquire().await, 5).await.unwrap();
        assert_eq!(block.data(), b"world");
        assert_eq!(source.path(), Some(Path::new("greeting")));
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::OutOfMemory)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::UnexpectedEof)));

        #[cfg(unix)]
        {
            assert!(is_transient(&io::Error::from_raw_os_error(libc::ENOBUFS)));
            assert!(!is_transient(&io::Error::from_raw_os_error(libc::EIO)));
        }
    }
}
