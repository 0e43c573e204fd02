//! Error types for the hashtab core library
//!
//! Errors returned from the public API are grouped into I/O, validation and
//! internal categories. Per-file failures that happen while a hashing run is
//! in flight never surface through [`Error`]; they are recorded on the task
//! as a [`TaskError`] so that one bad file never aborts its siblings.

use thiserror::Error;

pub mod internal;
pub mod io;
pub mod task;
pub mod validation;

pub use self::io::{IoError, IoErrorKind};
pub use self::task::TaskError;
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the hashtab core library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),
}
