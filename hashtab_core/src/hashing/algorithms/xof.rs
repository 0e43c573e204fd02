//! Extendable-output functions (SHAKE128, SHAKE256, BLAKE3)
//!
//! These take a `bits` parameter selecting the digest length.

use crate::hashing::traits::{HashAccumulator, HashAlgorithmImpl, ParamSchema};
use sha3::digest::{ExtendableOutput, Update};
use sha3::{Shake128, Shake256};

/// Largest output any XOF in the catalogue will produce
const MAX_XOF_BITS: u32 = 16_384;

/// Which extendable-output function an algorithm descriptor builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XofVariant {
    Shake128,
    Shake256,
    Blake3,
}

pub struct XofAlgorithm {
    variant: XofVariant,
}

impl XofAlgorithm {
    pub const fn new(variant: XofVariant) -> Self {
        Self { variant }
    }

    fn default_bits(&self) -> u32 {
        match self.variant {
            XofVariant::Shake128 | XofVariant::Blake3 => 256,
            XofVariant::Shake256 => 512,
        }
    }
}

enum XofState {
    Shake128(Shake128),
    Shake256(Shake256),
    Blake3(Box<blake3::Hasher>),
}

struct XofAccumulator {
    state: XofState,
    output_size: usize,
}

impl HashAccumulator for XofAccumulator {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            XofState::Shake128(hasher) => Update::update(hasher, data),
            XofState::Shake256(hasher) => Update::update(hasher, data),
            XofState::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        let mut out = vec![0u8; self.output_size];
        match self.state {
            XofState::Shake128(hasher) => hasher.finalize_xof_into(&mut out),
            XofState::Shake256(hasher) => hasher.finalize_xof_into(&mut out),
            XofState::Blake3(hasher) => hasher.finalize_xof().fill(&mut out),
        }
        out
    }

    fn output_size(&self) -> usize {
        self.output_size
    }
}

impl HashAlgorithmImpl for XofAlgorithm {
    fn id(&self) -> &'static str {
        match self.variant {
            XofVariant::Shake128 => "shake128",
            XofVariant::Shake256 => "shake256",
            XofVariant::Blake3 => "blake3",
        }
    }

    fn display_name(&self) -> &'static str {
        match self.variant {
            XofVariant::Shake128 => "SHAKE128",
            XofVariant::Shake256 => "SHAKE256",
            XofVariant::Blake3 => "BLAKE3",
        }
    }

    fn is_secure(&self) -> bool {
        true
    }

    fn default_output_size(&self) -> usize {
        (self.default_bits() / 8) as usize
    }

    fn param_schema(&self) -> Option<ParamSchema> {
        Some(ParamSchema {
            name: "bits",
            default_bits: self.default_bits(),
            max_bits: MAX_XOF_BITS,
        })
    }

    fn create_accumulator(&self, output_size: usize) -> Box<dyn HashAccumulator> {
        let state = match self.variant {
            XofVariant::Shake128 => XofState::Shake128(Shake128::default()),
            XofVariant::Shake256 => XofState::Shake256(Shake256::default()),
            XofVariant::Blake3 => XofState::Blake3(Box::new(blake3::Hasher::new())),
        };
        Box::new(XofAccumulator { state, output_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashParams;

    fn xof(variant: XofVariant, data: &[u8], params: &HashParams) -> Vec<u8> {
        let algorithm: &dyn HashAlgorithmImpl = &XofAlgorithm::new(variant);
        algorithm.hash_bytes(data, params).unwrap()
    }

    #[test]
    fn test_default_lengths() {
        let none = HashParams::default();
        assert_eq!(xof(XofVariant::Shake128, b"", &none).len(), 32);
        assert_eq!(xof(XofVariant::Shake256, b"", &none).len(), 64);
        assert_eq!(xof(XofVariant::Blake3, b"", &none).len(), 32);
    }

    #[test]
    fn test_known_vectors() {
        let none = HashParams::default();
        assert_eq!(
            hex::encode(xof(XofVariant::Shake128, b"", &none)),
            "7f9c2ba4e88f827d616045507605853ed73b8093f6efbc88eb1a6eacfa66ef26"
        );
        assert_eq!(
            hex::encode(xof(XofVariant::Blake3, b"", &none)),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_longer_output_extends_shorter() {
        let short = xof(XofVariant::Blake3, b"abc", &HashParams::with_bits(256));
        let long = xof(XofVariant::Blake3, b"abc", &HashParams::with_bits(1024));
        assert_eq!(long.len(), 128);
        assert_eq!(&long[..32], short.as_slice());
    }

    #[test]
    fn test_invalid_bits_rejected() {
        let algorithm: &dyn HashAlgorithmImpl = &XofAlgorithm::new(XofVariant::Shake256);
        assert!(algorithm.make_accumulator(&HashParams::with_bits(0)).is_err());
        assert!(algorithm.make_accumulator(&HashParams::with_bits(100)).is_err());
        assert!(
            algorithm
                .make_accumulator(&HashParams::with_bits(MAX_XOF_BITS + 8))
                .is_err()
        );
    }
}
