//! Hash algorithm implementations

use super::registry::AlgorithmRegistry;

mod crc32;
mod digest;
pub mod ed2k;
mod tth;
mod xof;
mod xxhash;

use digest::DigestAlgorithm;
use xof::{XofAlgorithm, XofVariant};
use xxhash::{XxhAlgorithm, XxhVariant};

/// Register all built-in algorithms with the registry
///
/// Registration order is the public registry order: checksums first, then
/// legacy digests, then the secure families.
pub(crate) fn register_all(registry: &mut AlgorithmRegistry) {
    registry.register(crc32::Crc32Algorithm);
    registry.register(XxhAlgorithm::new(XxhVariant::Xxh32));
    registry.register(XxhAlgorithm::new(XxhVariant::Xxh64));
    registry.register(XxhAlgorithm::new(XxhVariant::Xxh3_64));
    registry.register(XxhAlgorithm::new(XxhVariant::Xxh3_128));
    registry.register(DigestAlgorithm::<md4::Md4>::new("md4", "MD4", false));
    registry.register(DigestAlgorithm::<md5::Md5>::new("md5", "MD5", false));
    registry.register(ed2k::Ed2kAlgorithm::new());
    registry.register(DigestAlgorithm::<sha1::Sha1>::new("sha1", "SHA-1", false));
    registry.register(tth::TthAlgorithm);
    registry.register(DigestAlgorithm::<sha2::Sha224>::new("sha224", "SHA-224", true));
    registry.register(DigestAlgorithm::<sha2::Sha256>::new("sha256", "SHA-256", true));
    registry.register(DigestAlgorithm::<sha2::Sha384>::new("sha384", "SHA-384", true));
    registry.register(DigestAlgorithm::<sha2::Sha512>::new("sha512", "SHA-512", true));
    registry.register(DigestAlgorithm::<sha3::Sha3_224>::new("sha3-224", "SHA3-224", true));
    registry.register(DigestAlgorithm::<sha3::Sha3_256>::new("sha3-256", "SHA3-256", true));
    registry.register(DigestAlgorithm::<sha3::Sha3_384>::new("sha3-384", "SHA3-384", true));
    registry.register(DigestAlgorithm::<sha3::Sha3_512>::new("sha3-512", "SHA3-512", true));
    registry.register(XofAlgorithm::new(XofVariant::Shake128));
    registry.register(XofAlgorithm::new(XofVariant::Shake256));
    registry.register(DigestAlgorithm::<blake2::Blake2s256>::new(
        "blake2s",
        "BLAKE2s-256",
        true,
    ));
    registry.register(DigestAlgorithm::<blake2::Blake2b512>::new(
        "blake2b",
        "BLAKE2b-512",
        true,
    ));
    registry.register(XofAlgorithm::new(XofVariant::Blake3));
}
