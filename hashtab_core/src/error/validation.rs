//! Validation related error types

use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Algorithm name not present in the registry
    #[error("Unknown hash algorithm: {name}")]
    UnknownAlgorithm { name: String },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Operation not allowed once the coordinator has been started
    #[error("Coordinator already started: {operation} is no longer allowed")]
    AlreadyStarted { operation: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an unknown algorithm error
    pub fn unknown_algorithm(name: &str) -> Self {
        Self::UnknownAlgorithm {
            name: name.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an already started error
    pub fn already_started(operation: &str) -> Self {
        Self::AlreadyStarted {
            operation: operation.to_string(),
        }
    }
}
