//! Per-file failure recorded on a finished task

use super::io::{IoError, IoErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Terminal failure of a single file hashing task
///
/// Transient resource exhaustion is retried inside the task and therefore
/// has no variant here.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskError {
    /// The file could not be opened or its size could not be determined
    #[error("Failed to open file: {message}")]
    OpenFailed {
        #[serde(rename = "io_kind")]
        kind: IoErrorKind,
        os_code: Option<i32>,
        message: String,
    },

    /// A read failed (or could not be started) for a non-transient reason
    #[error("Read failed: {message}")]
    ReadFailed {
        os_code: Option<i32>,
        message: String,
    },

    /// The task observed the cancellation flag
    #[error("Hashing cancelled")]
    Cancelled,

    /// A bug inside the pipeline, such as a panicking accumulator
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TaskError {
    /// Record an open failure; the message keeps the path
    pub fn open_failed(source: &IoError) -> Self {
        Self::OpenFailed {
            kind: source.kind,
            os_code: source.os_code(),
            message: source.to_string(),
        }
    }

    /// Build a read failure from the OS error
    pub fn read_failed(source: &std::io::Error) -> Self {
        Self::ReadFailed {
            os_code: source.raw_os_error(),
            message: source.to_string(),
        }
    }

    /// Build an internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// OS error code carried by open/read failures
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::OpenFailed { os_code, .. } | Self::ReadFailed { os_code, .. } => *os_code,
            Self::Cancelled | Self::Internal { .. } => None,
        }
    }

    /// Whether this failure was caused by cancellation rather than I/O
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
