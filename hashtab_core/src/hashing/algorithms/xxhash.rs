//! xxHash family (XXH32, XXH64, XXH3-64, XXH3-128)
//!
//! Digests are emitted in the canonical big-endian form `xxhsum` prints.

use crate::hashing::traits::{HashAccumulator, HashAlgorithmImpl};
use xxhash_rust::xxh3::Xxh3;
use xxhash_rust::xxh32::Xxh32;
use xxhash_rust::xxh64::Xxh64;

/// Which xxHash function an algorithm descriptor builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XxhVariant {
    Xxh32,
    Xxh64,
    Xxh3_64,
    Xxh3_128,
}

impl XxhVariant {
    fn output_size(self) -> usize {
        match self {
            XxhVariant::Xxh32 => 4,
            XxhVariant::Xxh64 | XxhVariant::Xxh3_64 => 8,
            XxhVariant::Xxh3_128 => 16,
        }
    }
}

pub struct XxhAlgorithm {
    variant: XxhVariant,
}

impl XxhAlgorithm {
    pub const fn new(variant: XxhVariant) -> Self {
        Self { variant }
    }
}

enum XxhAccumulator {
    Xxh32(Xxh32),
    Xxh64(Xxh64),
    Xxh3_64(Box<Xxh3>),
    Xxh3_128(Box<Xxh3>),
}

impl HashAccumulator for XxhAccumulator {
    fn update(&mut self, data: &[u8]) {
        match self {
            XxhAccumulator::Xxh32(hasher) => hasher.update(data),
            XxhAccumulator::Xxh64(hasher) => hasher.update(data),
            XxhAccumulator::Xxh3_64(hasher) | XxhAccumulator::Xxh3_128(hasher) => {
                hasher.update(data)
            }
        }
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        match *self {
            XxhAccumulator::Xxh32(hasher) => hasher.digest().to_be_bytes().to_vec(),
            XxhAccumulator::Xxh64(hasher) => hasher.digest().to_be_bytes().to_vec(),
            XxhAccumulator::Xxh3_64(hasher) => hasher.digest().to_be_bytes().to_vec(),
            XxhAccumulator::Xxh3_128(hasher) => hasher.digest128().to_be_bytes().to_vec(),
        }
    }

    fn output_size(&self) -> usize {
        match self {
            XxhAccumulator::Xxh32(_) => 4,
            XxhAccumulator::Xxh64(_) | XxhAccumulator::Xxh3_64(_) => 8,
            XxhAccumulator::Xxh3_128(_) => 16,
        }
    }
}

impl HashAlgorithmImpl for XxhAlgorithm {
    fn id(&self) -> &'static str {
        match self.variant {
            XxhVariant::Xxh32 => "xxh32",
            XxhVariant::Xxh64 => "xxh64",
            XxhVariant::Xxh3_64 => "xxh3",
            XxhVariant::Xxh3_128 => "xxh128",
        }
    }

    fn display_name(&self) -> &'static str {
        match self.variant {
            XxhVariant::Xxh32 => "XXH32",
            XxhVariant::Xxh64 => "XXH64",
            XxhVariant::Xxh3_64 => "XXH3-64",
            XxhVariant::Xxh3_128 => "XXH3-128",
        }
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn default_output_size(&self) -> usize {
        self.variant.output_size()
    }

    fn create_accumulator(&self, _output_size: usize) -> Box<dyn HashAccumulator> {
        Box::new(match self.variant {
            XxhVariant::Xxh32 => XxhAccumulator::Xxh32(Xxh32::new(0)),
            XxhVariant::Xxh64 => XxhAccumulator::Xxh64(Xxh64::new(0)),
            XxhVariant::Xxh3_64 => XxhAccumulator::Xxh3_64(Box::new(Xxh3::new())),
            XxhVariant::Xxh3_128 => XxhAccumulator::Xxh3_128(Box::new(Xxh3::new())),
        })
    }
}
