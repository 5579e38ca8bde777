//! Path exclusion matching.
//!
//! # Responsibilities
//! - Match framework/internal path prefixes (case-sensitive)
//! - Match static asset extensions (case-insensitive)
//! - Match "file-looking" final segments (`name.ext`)
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Compiled once from config, immutable afterwards
//! - No regex to guarantee O(n) matching

use crate::config::AssetConfig;

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches a path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches a file extension, ignoring ASCII case.
#[derive(Debug, Clone)]
pub struct ExtensionMatcher {
    /// Lowercased, including the leading dot.
    extension: String,
}

impl ExtensionMatcher {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().to_ascii_lowercase(),
        }
    }
}

impl Matcher for ExtensionMatcher {
    fn matches(&self, path: &str) -> bool {
        let ext = self.extension.as_bytes();
        let path = path.as_bytes();
        path.len() >= ext.len() && path[path.len() - ext.len()..].eq_ignore_ascii_case(ext)
    }
}

/// Matches a final path segment that starts like `[\w-]+\.\w`, so
/// `app.js`, `jquery.min.js` and `main.abc123.js` all count as files.
#[derive(Debug, Clone, Default)]
pub struct DottedFileMatcher;

impl Matcher for DottedFileMatcher {
    fn matches(&self, path: &str) -> bool {
        let last = path.rsplit('/').next().unwrap_or_default();
        let Some((stem, rest)) = last.split_once('.') else {
            return false;
        };
        !stem.is_empty()
            && stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && rest
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Build the exclusion set described by an [`AssetConfig`].
    pub fn from_config(config: &AssetConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        for prefix in &config.excluded_prefixes {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }
        for ext in &config.extensions {
            matchers.push(Box::new(ExtensionMatcher::new(ext.clone())));
        }
        if config.exclude_dotted_files {
            matchers.push(Box::new(DottedFileMatcher));
        }
        Self::new(matchers)
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}
