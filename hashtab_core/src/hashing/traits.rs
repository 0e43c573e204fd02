//! Core traits for the hash algorithm catalogue

use crate::Result;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Parameters for algorithms whose output size is configurable
///
/// Only extendable-output functions accept `output_bits`; every other
/// algorithm rejects a non-empty parameter set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashParams {
    /// Requested output length in bits
    pub output_bits: Option<u32>,
}

impl HashParams {
    /// Parameters requesting a specific output length
    pub fn with_bits(bits: u32) -> Self {
        Self {
            output_bits: Some(bits),
        }
    }

    /// Whether no parameter was given
    pub fn is_empty(&self) -> bool {
        self.output_bits.is_none()
    }
}

/// Description of the single parameter a parameterized algorithm accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSchema {
    /// Parameter name as shown to users
    pub name: &'static str,
    /// Output length used when no parameter is given
    pub default_bits: u32,
    /// Largest accepted output length
    pub max_bits: u32,
}

impl ParamSchema {
    /// Validate `params` and compute the output size in bytes
    pub fn output_size(&self, params: &HashParams) -> Option<usize> {
        let bits = params.output_bits.unwrap_or(self.default_bits);
        if bits == 0 || !bits.is_multiple_of(8) || bits > self.max_bits {
            return None;
        }
        usize::try_from(bits / 8).ok()
    }
}

/// Descriptor of one algorithm in the registry
pub trait HashAlgorithmImpl: Send + Sync {
    /// Unique identifier for this algorithm
    fn id(&self) -> &'static str;

    /// Display name for user interfaces
    fn display_name(&self) -> &'static str;

    /// Whether a match under this algorithm is a cryptographic confirmation
    fn is_secure(&self) -> bool;

    /// Output size in bytes when no parameters are given
    fn default_output_size(&self) -> usize;

    /// Parameter schema, for algorithms with configurable output
    fn param_schema(&self) -> Option<ParamSchema> {
        None
    }

    /// Create an accumulator producing `output_size` bytes
    ///
    /// Callers must have validated `output_size` through
    /// [`check_params`](Self::check_params).
    fn create_accumulator(&self, output_size: usize) -> Box<dyn HashAccumulator>;

    /// Validate parameters without allocating an accumulator
    fn check_params(&self, params: &HashParams) -> Option<usize> {
        match self.param_schema() {
            Some(schema) => schema.output_size(params),
            None if params.is_empty() => Some(self.default_output_size()),
            None => None,
        }
    }
}

impl<'a> dyn HashAlgorithmImpl + 'a {
    /// Validate `params` and build a fresh accumulator
    pub fn make_accumulator(&self, params: &HashParams) -> Result<Box<dyn HashAccumulator>> {
        let output_size = self
            .check_params(params)
            .ok_or_else(|| invalid_params(self, params))?;
        Ok(self.create_accumulator(output_size))
    }

    /// Hash an in-memory buffer in one go
    pub fn hash_bytes(&self, data: &[u8], params: &HashParams) -> Result<Vec<u8>> {
        let mut accumulator = self.make_accumulator(params)?;
        accumulator.update(data);
        Ok(accumulator.finish())
    }
}

/// Describe why `params` were rejected by `algorithm`
pub(crate) fn invalid_params(algorithm: &dyn HashAlgorithmImpl, params: &HashParams) -> ValidationError {
    let reason = match (algorithm.param_schema(), params.output_bits) {
        (None, _) => "algorithm takes no parameters".to_string(),
        (Some(schema), Some(bits)) => format!(
            "{} must be a non-zero multiple of 8 no larger than {}, got {bits}",
            schema.name, schema.max_bits
        ),
        (Some(schema), None) => format!("invalid default {}", schema.name),
    };
    ValidationError::invalid_parameter(algorithm.id(), &reason)
}

/// Running hash state for one algorithm slot of one file
///
/// An accumulator is only ever updated by one thread at a time; blocks arrive
/// in file order.
pub trait HashAccumulator: Send {
    /// Feed the next block of the file
    fn update(&mut self, data: &[u8]);

    /// Consume the accumulator and produce the digest
    fn finish(self: Box<Self>) -> Vec<u8>;

    /// Length in bytes of the digest [`finish`](Self::finish) returns
    fn output_size(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: ParamSchema = ParamSchema {
        name: "bits",
        default_bits: 256,
        max_bits: 4096,
    };

    #[test]
    fn test_schema_uses_default_bits() {
        assert_eq!(SCHEMA.output_size(&HashParams::default()), Some(32));
    }

    #[test]
    fn test_schema_rejects_partial_bytes() {
        assert_eq!(SCHEMA.output_size(&HashParams::with_bits(12)), None);
        assert_eq!(SCHEMA.output_size(&HashParams::with_bits(0)), None);
    }

    #[test]
    fn test_schema_rejects_overflow() {
        assert_eq!(SCHEMA.output_size(&HashParams::with_bits(4104)), None);
        assert_eq!(SCHEMA.output_size(&HashParams::with_bits(u32::MAX - 7)), None);
        assert_eq!(SCHEMA.output_size(&HashParams::with_bits(4096)), Some(512));
    }
}
