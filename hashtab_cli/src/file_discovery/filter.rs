//! File filtering using glob patterns

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::{DiscoveryError, Result};

/// Pattern matcher using GlobSet for efficient matching
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    globset: GlobSet,
    patterns: Vec<String>,
}

impl PatternMatcher {
    /// Create a new pattern matcher from glob patterns
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| DiscoveryError::InvalidPattern(format!("{pattern}: {e}")))?;
            builder.add(glob);
        }

        let globset = builder
            .build()
            .map_err(|e| DiscoveryError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            globset,
            patterns: patterns.to_vec(),
        })
    }

    /// Check if a path matches any of the patterns
    pub fn matches(&self, path: &Path) -> bool {
        self.globset.is_match(path)
    }

    /// Get the original patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Include/exclude filter; excludes win
#[derive(Debug)]
pub struct FileFilter {
    include_matcher: Option<PatternMatcher>,
    exclude_matcher: Option<PatternMatcher>,
}

impl FileFilter {
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self> {
        let matcher = |patterns: &[String]| {
            (!patterns.is_empty())
                .then(|| PatternMatcher::new(patterns))
                .transpose()
        };

        Ok(Self {
            include_matcher: matcher(include_patterns)?,
            exclude_matcher: matcher(exclude_patterns)?,
        })
    }

    /// Check if a file should be included
    ///
    /// Without include patterns everything not excluded is included.
    pub fn should_include(&self, path: &Path) -> bool {
        if let Some(ref exclude) = self.exclude_matcher
            && exclude.matches(path)
        {
            return false;
        }

        self.include_matcher
            .as_ref()
            .is_none_or(|include| include.matches(path))
    }
}
