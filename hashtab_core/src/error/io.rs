//! I/O related error types

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O error with additional context
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IoErrorKind {
    /// File not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// Path exists but is not a regular file
    NotAFile,
    /// Generic I/O error
    Other,
}

impl IoErrorKind {
    /// Classify a standard library error kind
    pub fn classify(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => Self::FileNotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::IsADirectory => Self::NotAFile,
            _ => Self::Other,
        }
    }
}

impl IoError {
    /// Create a not-a-file error (directories, sockets, ...)
    pub fn not_a_file(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::NotAFile,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        Self {
            kind: IoErrorKind::classify(source.kind()),
            path: None,
            source: Some(source),
        }
    }

    /// Create an I/O error with a path
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    /// Raw OS error code of the underlying error, if there is one
    pub fn os_code(&self) -> Option<i32> {
        self.source.as_ref().and_then(std::io::Error::raw_os_error)
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::FileNotFound, Some(path)) => {
            format!("File not found: {}", path.display())
        }
        (IoErrorKind::FileNotFound, None) => "File not found".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied for file: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::NotAFile, Some(path)) => {
            format!("Not a regular file: {}", path.display())
        }
        (IoErrorKind::NotAFile, None) => "Not a regular file".to_string(),
        (IoErrorKind::Other, path) => {
            let prefix = match path {
                Some(path) => format!("I/O error on {}", path.display()),
                None => "I/O error".to_string(),
            };
            match &error.source {
                Some(source) => format!("{prefix}: {source}"),
                None => prefix,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_a_file_error() {
        let path = Path::new("/test/folder");
        let error = IoError::not_a_file(path);

        assert_eq!(error.kind, IoErrorKind::NotAFile);
        assert_eq!(error.path, Some(path.to_path_buf()));
        assert!(error.source.is_none());
        assert_eq!(error.to_string(), "Not a regular file: /test/folder");
    }

    #[test]
    fn test_permission_denied_with_path() {
        let path = Path::new("/root/protected.iso");
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Access denied");
        let error = IoError::from_std(io_error).with_path(path);

        assert_eq!(error.kind, IoErrorKind::PermissionDenied);
        assert!(error.source.is_some());
        assert_eq!(
            error.to_string(),
            "Permission denied for file: /root/protected.iso"
        );
    }

    #[test]
    fn test_from_std_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "Not found");
        let error = IoError::from_std(io_error);

        assert_eq!(error.kind, IoErrorKind::FileNotFound);
        assert!(error.path.is_none());
        assert!(error.source.is_some());
    }

    #[test]
    fn test_os_code_is_forwarded() {
        let error = IoError::from_std(io::Error::from_raw_os_error(5));
        assert_eq!(error.os_code(), Some(5));
        assert_eq!(IoError::not_a_file(Path::new("x")).os_code(), None);
    }

    #[test]
    fn test_other_error_with_path() {
        let error = IoError::from_std(io::Error::other("disk on fire")).with_path(Path::new("/a.bin"));

        assert_eq!(error.kind, IoErrorKind::Other);
        assert!(error.to_string().contains("/a.bin"));
        assert!(error.to_string().contains("disk on fire"));
    }
}
