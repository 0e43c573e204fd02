//! Hash algorithm catalogue for the hashtab core library
//!
//! This module contains the algorithm registry, the accumulator trait every
//! algorithm implements, and the selection type used to enable a subset of
//! the registry for a hashing run.

use crate::{Result, error::ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod algorithms;
mod registry;
mod traits;

pub use algorithms::ed2k::Ed2kVariant;
pub use registry::{AlgorithmIndex, AlgorithmRegistry};
pub use traits::{HashAccumulator, HashAlgorithmImpl, HashParams, ParamSchema};

/// An algorithm name with optional parameters, as written by users
///
/// The textual form is `name` or `name:bits`, e.g. `sha256` or `blake3:512`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "HashParams::is_empty")]
    pub params: HashParams,
}

impl AlgorithmSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashParams::default(),
        }
    }

    pub fn with_bits(name: impl Into<String>, bits: u32) -> Self {
        Self {
            name: name.into(),
            params: HashParams::with_bits(bits),
        }
    }
}

impl fmt::Display for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params.output_bits {
            Some(bits) => write!(f, "{}:{bits}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for AlgorithmSpec {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, bits) = match s.split_once(':') {
            Some((name, bits)) => (name.trim(), Some(bits.trim())),
            None => (s, None),
        };

        if name.is_empty() {
            return Err(ValidationError::invalid_configuration("empty algorithm name").into());
        }

        let params = match bits {
            Some(bits) => {
                let bits = bits.parse::<u32>().map_err(|_| {
                    ValidationError::invalid_parameter(name, &format!("'{bits}' is not a bit length"))
                })?;
                HashParams::with_bits(bits)
            }
            None => HashParams::default(),
        };

        Ok(Self {
            name: name.to_string(),
            params,
        })
    }
}

/// One enabled algorithm, resolved against the registry
#[derive(Clone, Copy)]
pub struct SelectedAlgorithm {
    pub index: AlgorithmIndex,
    pub id: &'static str,
    pub params: HashParams,
    pub output_size: usize,
    pub secure: bool,
    descriptor: &'static dyn HashAlgorithmImpl,
}

impl fmt::Debug for SelectedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedAlgorithm")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("params", &self.params)
            .field("output_size", &self.output_size)
            .field("secure", &self.secure)
            .finish()
    }
}

impl SelectedAlgorithm {
    fn new(
        index: AlgorithmIndex,
        descriptor: &'static dyn HashAlgorithmImpl,
        params: HashParams,
        output_size: usize,
    ) -> Self {
        Self {
            index,
            id: descriptor.id(),
            params,
            output_size,
            secure: descriptor.is_secure(),
            descriptor,
        }
    }

    /// Registry descriptor of this algorithm
    pub fn descriptor(&self) -> &'static dyn HashAlgorithmImpl {
        self.descriptor
    }

    /// Build a fresh accumulator for this slot
    pub fn make_accumulator(&self) -> Box<dyn HashAccumulator> {
        self.descriptor().create_accumulator(self.output_size)
    }
}

/// The set of algorithms enabled for a hashing run
///
/// Entries are kept in registry order with at most one entry per algorithm;
/// enabling an algorithm twice replaces its parameters.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmSelection {
    selected: Vec<SelectedAlgorithm>,
}

impl AlgorithmSelection {
    /// An empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a list of `name[:bits]` strings
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::new();
        for name in names {
            let spec: AlgorithmSpec = name.as_ref().parse()?;
            selection.enable(&spec)?;
        }
        Ok(selection)
    }

    /// Every registry algorithm with default parameters
    pub fn all() -> Self {
        let selected = AlgorithmRegistry::global()
            .list()
            .enumerate()
            .map(|(index, algorithm)| {
                SelectedAlgorithm::new(
                    index,
                    algorithm,
                    HashParams::default(),
                    algorithm.default_output_size(),
                )
            })
            .collect();
        Self { selected }
    }

    /// Enable one algorithm, validating its parameters
    pub fn enable(&mut self, spec: &AlgorithmSpec) -> Result<()> {
        let (index, algorithm) = AlgorithmRegistry::global()
            .by_name(&spec.name)
            .ok_or_else(|| ValidationError::unknown_algorithm(&spec.name))?;

        let output_size = algorithm
            .check_params(&spec.params)
            .ok_or_else(|| traits::invalid_params(algorithm, &spec.params))?;

        let entry = SelectedAlgorithm::new(index, algorithm, spec.params, output_size);

        match self.selected.binary_search_by_key(&index, |s| s.index) {
            Ok(position) => self.selected[position] = entry,
            Err(position) => self.selected.insert(position, entry),
        }
        Ok(())
    }

    /// Enabled algorithms in registry order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SelectedAlgorithm> {
        self.selected.iter()
    }

    /// Entry for a registry index, if enabled
    pub fn get(&self, index: AlgorithmIndex) -> Option<&SelectedAlgorithm> {
        self.selected
            .binary_search_by_key(&index, |s| s.index)
            .ok()
            .map(|position| &self.selected[position])
    }

    /// Number of enabled algorithms
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl<'a> IntoIterator for &'a AlgorithmSelection {
    type Item = &'a SelectedAlgorithm;
    type IntoIter = std::slice::Iter<'a, SelectedAlgorithm>;

    fn into_iter(self) -> Self::IntoIter {
        self.selected.iter()
    }
}
