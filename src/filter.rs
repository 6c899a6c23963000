//! Name-based exclusion rules.
//!
//! Decides which entries of a repository are left out of both the rendered
//! tree and the content section. Every rule looks at a single path component
//! (the entry's own name) and is matched case-insensitively.

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fmt;
use std::str::FromStr;

/// A single case-insensitive rule matched against an entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    /// The whole name equals the value.
    Exact(String),
    /// The name starts with the value.
    Prefix(String),
    /// The name contains the value anywhere.
    Contains(String),
    /// The name matches a glob such as `*.lock`.
    Glob(String),
}

impl NamePattern {
    fn matches_lowercase(&self, name: &str) -> bool {
        match self {
            Self::Exact(value) => name == value,
            Self::Prefix(value) => name.starts_with(value.as_str()),
            Self::Contains(value) => name.contains(value.as_str()),
            // compiled separately into the GlobSet
            Self::Glob(_) => false,
        }
    }
}

impl FromStr for NamePattern {
    type Err = Error;

    /// Parses `exact:NAME`, `prefix:TEXT`, `contains:TEXT` or `glob:PATTERN`.
    /// Input without a recognised kind is treated as a glob.
    fn from_str(s: &str) -> Result<Self> {
        let pattern = match s.split_once(':') {
            Some(("exact", value)) => Self::Exact(value.to_lowercase()),
            Some(("prefix", value)) => Self::Prefix(value.to_lowercase()),
            Some(("contains", value)) => Self::Contains(value.to_lowercase()),
            Some(("glob", value)) => Self::Glob(value.to_string()),
            _ => Self::Glob(s.to_string()),
        };

        let value = match &pattern {
            Self::Exact(v) | Self::Prefix(v) | Self::Contains(v) | Self::Glob(v) => v,
        };
        if value.is_empty() {
            return Err(Error::config(format!("Empty exclusion pattern '{s}'")));
        }

        Ok(pattern)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "exact:{v}"),
            Self::Prefix(v) => write!(f, "prefix:{v}"),
            Self::Contains(v) => write!(f, "contains:{v}"),
            Self::Glob(v) => write!(f, "glob:{v}"),
        }
    }
}

/// Configuration for name-based exclusion.
///
/// The default policy drops hidden files (which covers `.env`), `README*`,
/// `requirements.txt*` and `prerequisites*` files, and prunes `.git`
/// directories.
#[derive(Debug, Clone)]
pub struct ExclusionConfig {
    patterns: Vec<NamePattern>,
    pruned_dirs: Vec<String>,
    match_directories: bool,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                NamePattern::Prefix(".".to_string()),
                NamePattern::Prefix("readme".to_string()),
                NamePattern::Prefix("requirements.txt".to_string()),
                NamePattern::Prefix("prerequisites".to_string()),
            ],
            pruned_dirs: vec![".git".to_string()],
            match_directories: false,
        }
    }
}

impl ExclusionConfig {
    /// Creates a configuration with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that excludes nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            pruned_dirs: Vec::new(),
            match_directories: false,
        }
    }

    /// Adds a name pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: NamePattern) -> Self {
        let pattern = match pattern {
            NamePattern::Exact(v) => NamePattern::Exact(v.to_lowercase()),
            NamePattern::Prefix(v) => NamePattern::Prefix(v.to_lowercase()),
            NamePattern::Contains(v) => NamePattern::Contains(v.to_lowercase()),
            glob @ NamePattern::Glob(_) => glob,
        };
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
        self
    }

    /// Prunes every directory with this exact name, subtree included.
    #[must_use]
    pub fn prune_dir(mut self, name: impl Into<String>) -> Self {
        let name = name.into().to_lowercase();
        if !self.pruned_dirs.contains(&name) {
            self.pruned_dirs.push(name);
        }
        self
    }

    /// Applies name patterns to directories too.
    ///
    /// A matching directory is dropped together with its subtree.
    #[must_use]
    pub const fn match_directories(mut self, enabled: bool) -> Self {
        self.match_directories = enabled;
        self
    }

    /// Keeps hidden files by dropping the leading-dot rule.
    #[must_use]
    pub fn include_hidden(mut self) -> Self {
        self.patterns
            .retain(|p| *p != NamePattern::Prefix(".".to_string()));
        self
    }
}

/// Predicate deciding whether an entry is left out of the output.
///
/// `name` is the entry's final path component.
pub trait NameFilter {
    /// Returns true if the entry must be omitted.
    fn is_excluded(&self, name: &str, is_dir: bool) -> bool;
}

impl<F> NameFilter for F
where
    F: Fn(&str, bool) -> bool,
{
    fn is_excluded(&self, name: &str, is_dir: bool) -> bool {
        self(name, is_dir)
    }
}

/// Compiled form of an [`ExclusionConfig`].
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    literals: Vec<NamePattern>,
    globs: GlobSet,
    pruned_dirs: Vec<String>,
    match_directories: bool,
}

impl ExclusionSet {
    /// Compiles the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a glob pattern is invalid.
    pub fn new(config: &ExclusionConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut literals = Vec::new();

        for pattern in &config.patterns {
            match pattern {
                NamePattern::Glob(glob) => {
                    let glob = GlobBuilder::new(glob)
                        .case_insensitive(true)
                        .literal_separator(true)
                        .build()
                        .map_err(|e| {
                            Error::config(format!("Invalid glob pattern '{glob}': {e}"))
                        })?;
                    builder.add(glob);
                }
                literal => literals.push(literal.clone()),
            }
        }

        let globs = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))?;

        Ok(Self {
            literals,
            globs,
            pruned_dirs: config.pruned_dirs.clone(),
            match_directories: config.match_directories,
        })
    }

    /// Returns true if `name` matches any pattern, regardless of entry kind.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.literals.iter().any(|p| p.matches_lowercase(&lowered)) || self.globs.is_match(name)
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        // the default config has no globs, so compilation cannot fail
        let config = ExclusionConfig::default();
        Self {
            literals: config.patterns,
            globs: GlobSet::empty(),
            pruned_dirs: config.pruned_dirs,
            match_directories: config.match_directories,
        }
    }
}

impl NameFilter for ExclusionSet {
    fn is_excluded(&self, name: &str, is_dir: bool) -> bool {
        if is_dir {
            let lowered = name.to_lowercase();
            if self.pruned_dirs.iter().any(|d| *d == lowered) {
                return true;
            }
            return self.match_directories && self.matches(name);
        }
        self.matches(name)
    }
}
