//! ED2K hash algorithm implementation

use crate::hashing::traits::{HashAccumulator, HashAlgorithmImpl};
use md4::{Digest, Md4};

/// ED2K hash variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ed2kVariant {
    /// Blue variant: Standard ED2K implementation
    Blue,
    /// Red variant: appends MD4 of empty data when the file size is an exact
    /// multiple of the chunk size (and larger than one chunk)
    Red,
}

pub struct Ed2kAlgorithm {
    variant: Ed2kVariant,
}

impl Ed2kAlgorithm {
    /// Create a new ED2K algorithm with default Red variant
    pub fn new() -> Self {
        Self {
            variant: Ed2kVariant::Red,
        }
    }

    /// Create a new ED2K algorithm with specific variant
    pub fn with_variant(variant: Ed2kVariant) -> Self {
        Self { variant }
    }
}

impl Default for Ed2kAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming ED2K state
///
/// Chunks are hashed incrementally, so memory use is one MD4 state plus 16
/// bytes per completed chunk regardless of how the file is split into blocks.
struct Ed2kAccumulator {
    chunk: Md4,
    bytes_in_chunk: usize,
    chunk_hashes: Vec<u8>,
    total_bytes: u64,
    variant: Ed2kVariant,
}

impl Ed2kAccumulator {
    const CHUNK_SIZE: usize = 9_728_000;

    fn new(variant: Ed2kVariant) -> Self {
        Self {
            chunk: Md4::new(),
            bytes_in_chunk: 0,
            chunk_hashes: Vec::new(),
            total_bytes: 0,
            variant,
        }
    }

    fn close_chunk(&mut self) {
        let chunk = std::mem::take(&mut self.chunk);
        self.chunk_hashes.extend_from_slice(&chunk.finalize());
        self.bytes_in_chunk = 0;
    }
}

impl HashAccumulator for Ed2kAccumulator {
    fn update(&mut self, data: &[u8]) {
        let mut remaining = data;

        while !remaining.is_empty() {
            let take = remaining.len().min(Self::CHUNK_SIZE - self.bytes_in_chunk);
            self.chunk.update(&remaining[..take]);
            self.bytes_in_chunk += take;
            remaining = &remaining[take..];

            if self.bytes_in_chunk == Self::CHUNK_SIZE {
                self.close_chunk();
            }
        }

        self.total_bytes += data.len() as u64;
    }

    fn finish(mut self: Box<Self>) -> Vec<u8> {
        let chunk_size = Self::CHUNK_SIZE as u64;

        // Smaller than one chunk: plain MD4 of the data
        if self.total_bytes < chunk_size {
            return self.chunk.finalize().to_vec();
        }

        // Exactly one chunk: both variants use the chunk hash directly
        if self.total_bytes == chunk_size {
            return self.chunk_hashes;
        }

        if self.bytes_in_chunk > 0 {
            self.close_chunk();
        }

        if self.variant == Ed2kVariant::Red && self.total_bytes.is_multiple_of(chunk_size) {
            self.chunk_hashes
                .extend_from_slice(&Md4::new().finalize());
        }

        Md4::digest(&self.chunk_hashes).to_vec()
    }

    fn output_size(&self) -> usize {
        16
    }
}

impl HashAlgorithmImpl for Ed2kAlgorithm {
    fn id(&self) -> &'static str {
        "ed2k"
    }

    fn display_name(&self) -> &'static str {
        "ED2K"
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn default_output_size(&self) -> usize {
        16
    }

    fn create_accumulator(&self, _output_size: usize) -> Box<dyn HashAccumulator> {
        Box::new(Ed2kAccumulator::new(self.variant))
    }
}
