//! Key Pattern Matching
//!
//! Patterns used by `invalidate`. A pattern containing `*` is a glob over the
//! whole key (`*` matches any run of characters, everything else is literal).
//! Any other pattern matches keys that contain it as a substring.

use regex::Regex;

/// Compiled invalidation pattern
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Anchored glob compiled to a regex
    Glob(Regex),
    /// Plain substring containment
    Substring(String),
}

impl KeyPattern {
    /// Compile a pattern. Never fails: a glob that can't be compiled is
    /// matched as a literal substring instead.
    pub fn parse(pattern: &str) -> Self {
        if !pattern.contains('*') {
            return KeyPattern::Substring(pattern.to_string());
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        match Regex::new(&format!("^{}$", body)) {
            Ok(regex) => KeyPattern::Glob(regex),
            Err(e) => {
                tracing::warn!(pattern, "Invalid glob pattern, matching as substring: {}", e);
                KeyPattern::Substring(pattern.to_string())
            }
        }
    }

    /// Whether `key` matches
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Glob(regex) => regex.is_match(key),
            KeyPattern::Substring(needle) => key.contains(needle.as_str()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
