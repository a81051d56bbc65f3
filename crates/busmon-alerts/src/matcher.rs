//! Entity-name pattern matching.
//!
//! Rules may carry an entity pattern restricting which queues and
//! subscriptions they apply to. Patterns are compiled once, case-insensitively,
//! under [`PatternLimits`]; text that does not compile is matched as a
//! case-insensitive substring instead.

use std::collections::HashMap;

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::PatternLimits;

/// Cached outcome of compiling one pattern text.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// The pattern compiled within limits.
    Compiled(Regex),
    /// The pattern is not a valid regex, or exceeded the limits.
    Invalid,
}

impl CompiledPattern {
    fn matches(&self, entity_name: &str, raw: &str) -> bool {
        match self {
            Self::Compiled(re) => re.is_match(entity_name),
            Self::Invalid => contains_ignore_case(entity_name, raw),
        }
    }
}

/// Compiles and caches entity patterns.
#[derive(Debug, Default)]
pub struct PatternMatcher {
    limits: PatternLimits,
    cache: RwLock<HashMap<String, CompiledPattern>>,
}

impl PatternMatcher {
    /// Creates a matcher with the given compile limits.
    #[must_use]
    pub fn new(limits: PatternLimits) -> Self {
        Self {
            limits,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true if `entity_name` is covered by `pattern`.
    ///
    /// A missing or empty pattern covers every entity.
    pub fn matches(&self, entity_name: &str, pattern: Option<&str>) -> bool {
        let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
            return true;
        };

        if let Some(compiled) = self.cache.read().get(pattern) {
            return compiled.matches(entity_name, pattern);
        }

        let compiled = self.compile_cached(pattern);
        compiled.matches(entity_name, pattern)
    }

    /// Returns true if `pattern` compiles as a regex within limits.
    pub fn is_valid(&self, pattern: &str) -> bool {
        if let Some(compiled) = self.cache.read().get(pattern) {
            return matches!(compiled, CompiledPattern::Compiled(_));
        }
        matches!(self.compile_cached(pattern), CompiledPattern::Compiled(_))
    }

    /// Number of distinct pattern texts seen so far.
    #[must_use]
    pub fn cached_patterns(&self) -> usize {
        self.cache.read().len()
    }

    fn compile_cached(&self, pattern: &str) -> CompiledPattern {
        let mut cache = self.cache.write();
        // Another thread may have compiled it between our read and write.
        cache
            .entry(pattern.to_string())
            .or_insert_with(|| self.compile(pattern))
            .clone()
    }

    fn compile(&self, pattern: &str) -> CompiledPattern {
        if pattern.len() > self.limits.max_pattern_len {
            debug!(
                len = pattern.len(),
                max = self.limits.max_pattern_len,
                "entity pattern too long, using substring match"
            );
            return CompiledPattern::Invalid;
        }

        match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(self.limits.size_limit)
            .dfa_size_limit(self.limits.dfa_size_limit)
            .nest_limit(self.limits.nest_limit)
            .build()
        {
            Ok(re) => CompiledPattern::Compiled(re),
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "invalid entity pattern, using substring match");
                CompiledPattern::Invalid
            }
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
