//! CRC32 checksum implementation

use crate::hashing::traits::{HashAccumulator, HashAlgorithmImpl};
use crc32fast::Hasher as Crc32Hasher;

pub struct Crc32Algorithm;

/// CRC32 accumulator; the digest is the checksum in big-endian order
struct Crc32Accumulator {
    hasher: Crc32Hasher,
}

impl HashAccumulator for Crc32Accumulator {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().to_be_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        4
    }
}

impl HashAlgorithmImpl for Crc32Algorithm {
    fn id(&self) -> &'static str {
        "crc32"
    }

    fn display_name(&self) -> &'static str {
        "CRC32"
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn default_output_size(&self) -> usize {
        4
    }

    fn create_accumulator(&self, _output_size: usize) -> Box<dyn HashAccumulator> {
        Box::new(Crc32Accumulator {
            hasher: Crc32Hasher::new(),
        })
    }
}
