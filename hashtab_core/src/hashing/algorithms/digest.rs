//! Fixed-output algorithms backed by RustCrypto `Digest` implementations
//!
//! MD4, MD5, SHA-1, the SHA-2 and SHA-3 families and BLAKE2 all share one
//! accumulator type; only the id, display name and secure flag differ.

use crate::hashing::traits::{HashAccumulator, HashAlgorithmImpl};
use sha2::Digest;
use std::marker::PhantomData;

/// Algorithm descriptor for any fixed-output [`Digest`]
pub struct DigestAlgorithm<D> {
    id: &'static str,
    display_name: &'static str,
    secure: bool,
    _digest: PhantomData<fn() -> D>,
}

impl<D> DigestAlgorithm<D> {
    pub const fn new(id: &'static str, display_name: &'static str, secure: bool) -> Self {
        Self {
            id,
            display_name,
            secure,
            _digest: PhantomData,
        }
    }
}

struct DigestAccumulator<D> {
    hasher: D,
}

impl<D> HashAccumulator for DigestAccumulator<D>
where
    D: Digest + Send,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        Digest::finalize(self.hasher).to_vec()
    }

    fn output_size(&self) -> usize {
        <D as Digest>::output_size()
    }
}

impl<D> HashAlgorithmImpl for DigestAlgorithm<D>
where
    D: Digest + Send + 'static,
{
    fn id(&self) -> &'static str {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn default_output_size(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn create_accumulator(&self, _output_size: usize) -> Box<dyn HashAccumulator> {
        Box::new(DigestAccumulator { hasher: D::new() })
    }
}
