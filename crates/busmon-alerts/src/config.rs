//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Limits applied when compiling entity patterns.
///
/// Matching with a compiled pattern is linear in the entity name length, so
/// bounding the compiled program bounds the cost of every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternLimits {
    /// Maximum size of the compiled program, in bytes.
    pub size_limit: usize,
    /// Maximum size of the lazy DFA cache, in bytes.
    pub dfa_size_limit: usize,
    /// Maximum nesting depth of the pattern syntax.
    pub nest_limit: u32,
    /// Patterns longer than this are never compiled.
    pub max_pattern_len: usize,
}

impl Default for PatternLimits {
    fn default() -> Self {
        Self {
            size_limit: 1024 * 1024,
            dfa_size_limit: 2 * 1024 * 1024,
            nest_limit: 64,
            max_pattern_len: 1024,
        }
    }
}

/// Configuration for the alert engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where rules are persisted. `None` keeps rules in memory only.
    pub rules_path: Option<PathBuf>,
    /// Limits for entity pattern compilation.
    pub pattern_limits: PatternLimits,
    /// Capacity of the broadcast notification stream.
    pub notification_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            pattern_limits: PatternLimits::default(),
            notification_buffer: 256,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration that persists rules at `path`.
    #[must_use]
    pub fn with_rules_path(path: impl Into<PathBuf>) -> Self {
        Self {
            rules_path: Some(path.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert!(config.rules_path.is_none());
        assert_eq!(config.notification_buffer, 256);
        assert_eq!(config.pattern_limits.size_limit, 1024 * 1024);
        assert_eq!(config.pattern_limits.nest_limit, 64);
    }

    #[test]
    fn with_rules_path() {
        let config = EngineConfig::with_rules_path("/var/lib/busmon/rules.json");
        assert_eq!(
            config.rules_path.as_deref(),
            Some(std::path::Path::new("/var/lib/busmon/rules.json"))
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"pattern_limits": {"max_pattern_len": 64}}"#).unwrap();
        assert_eq!(config.pattern_limits.max_pattern_len, 64);
        assert_eq!(config.pattern_limits.nest_limit, 64);
        assert_eq!(config.notification_buffer, 256);
    }
}
