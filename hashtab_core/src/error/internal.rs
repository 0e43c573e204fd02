//! Internal library error types

use thiserror::Error;

/// Internal library errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// Coordinator was used outside of a tokio runtime
    #[error("No tokio runtime available: {message}")]
    NoRuntime { message: String },

    /// A hash unit panicked while updating an accumulator
    #[error("Hash unit for algorithm '{algorithm}' panicked")]
    HashUnitPanicked { algorithm: String },

    /// Internal assertion failure
    #[error("Internal assertion failed: {message}")]
    Assertion { message: String },
}

impl InternalError {
    /// Create a missing runtime error
    pub fn no_runtime(message: impl Into<String>) -> Self {
        Self::NoRuntime {
            message: message.into(),
        }
    }

    /// Create a panicked hash unit error
    pub fn hash_unit_panicked(algorithm: &str) -> Self {
        Self::HashUnitPanicked {
            algorithm: algorithm.to_string(),
        }
    }

    /// Create an internal assertion failure error
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }
}
