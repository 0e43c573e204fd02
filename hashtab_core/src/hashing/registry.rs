//! Central registry for hash algorithm implementations

use super::traits::HashAlgorithmImpl;
use once_cell::sync::OnceCell;
use std::collections::HashMap;

/// Position of an algorithm in the registry
///
/// Indices are stable for the lifetime of the process; tasks use them to
/// address their accumulator slots.
pub type AlgorithmIndex = usize;

/// Central registry for all hash algorithms
pub struct AlgorithmRegistry {
    algorithms: Vec<Box<dyn HashAlgorithmImpl>>,
    by_id: HashMap<&'static str, AlgorithmIndex>,
}

impl AlgorithmRegistry {
    /// Create a new empty registry
    fn new() -> Self {
        Self {
            algorithms: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Get the global registry instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceCell<AlgorithmRegistry> = OnceCell::new();
        INSTANCE.get_or_init(|| {
            let mut registry = Self::new();
            super::algorithms::register_all(&mut registry);
            log::debug!("Hash algorithm registry initialized with {} algorithms", registry.len());
            registry
        })
    }

    /// Register a new algorithm at the next index
    ///
    /// Ids are unique; registering an id twice is a programming error.
    pub(crate) fn register(&mut self, algorithm: impl HashAlgorithmImpl + 'static) {
        let id = algorithm.id();
        assert!(
            !self.by_id.contains_key(id),
            "hash algorithm '{id}' registered twice"
        );
        self.by_id.insert(id, self.algorithms.len());
        self.algorithms.push(Box::new(algorithm));
    }

    /// Get algorithm by index
    pub fn get(&self, index: AlgorithmIndex) -> Option<&dyn HashAlgorithmImpl> {
        self.algorithms.get(index).map(|a| a.as_ref())
    }

    /// Look an algorithm up by id, ignoring case
    pub fn by_name(&self, name: &str) -> Option<(AlgorithmIndex, &dyn HashAlgorithmImpl)> {
        let index = self.index_of(name)?;
        Some((index, self.algorithms[index].as_ref()))
    }

    /// Index of the algorithm with the given id, ignoring case
    pub fn index_of(&self, name: &str) -> Option<AlgorithmIndex> {
        let normalized = name.trim().to_ascii_lowercase();
        self.by_id.get(normalized.as_str()).copied()
    }

    /// List all registered algorithms in registry order
    pub fn list(&self) -> impl ExactSizeIterator<Item = &dyn HashAlgorithmImpl> {
        self.algorithms.iter().map(|a| a.as_ref())
    }

    /// Number of registered algorithms
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashParams;

    #[test]
    fn test_ids_are_unique_and_indexed() {
        let registry = AlgorithmRegistry::global();
        for (index, algorithm) in registry.list().enumerate() {
            assert_eq!(registry.index_of(algorithm.id()), Some(index));
        }
    }

    #[test]
    fn test_order_is_stable() {
        let first: Vec<_> = AlgorithmRegistry::global().list().map(|a| a.id()).collect();
        let second: Vec<_> = AlgorithmRegistry::global().list().map(|a| a.id()).collect();
        assert_eq!(first, second);
        assert_eq!(first.first(), Some(&"crc32"));
    }

    #[test]
    fn test_lookup_ignores_case() {
        let registry = AlgorithmRegistry::global();
        let (index, algorithm) = registry.by_name("SHA256").unwrap();
        assert_eq!(algorithm.id(), "sha256");
        assert_eq!(registry.get(index).unwrap().id(), "sha256");
        assert!(registry.by_name("sha-9000").is_none());
    }

    #[test]
    fn test_output_sizes_cover_checksums_to_xofs() {
        let registry = AlgorithmRegistry::global();
        let size = |name: &str| {
            registry
                .by_name(name)
                .unwrap()
                .1
                .check_params(&HashParams::default())
        };

        assert_eq!(size("crc32"), Some(4));
        assert_eq!(size("sha512"), Some(64));
        assert_eq!(size("blake3"), Some(32));

        let (_, shake) = registry.by_name("shake128").unwrap();
        assert_eq!(shake.check_params(&HashParams::with_bits(1024)), Some(128));
    }

    #[test]
    fn test_fixed_algorithms_reject_parameters() {
        let (_, md5) = AlgorithmRegistry::global().by_name("md5").unwrap();
        assert_eq!(md5.check_params(&HashParams::with_bits(128)), None);
    }
}
