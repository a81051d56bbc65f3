//! Error types for the busmon-alerts crate.

use thiserror::Error;

/// Errors that can occur in the alerting engine.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Invalid alert rule configuration.
    #[error("invalid alert rule: {reason}")]
    InvalidRule {
        /// The reason the rule is invalid.
        reason: String,
    },

    /// A rule with the same ID is already registered.
    #[error("rule already exists: {id}")]
    DuplicateRule {
        /// The conflicting rule ID.
        id: String,
    },

    /// Alert rule with the given ID was not found.
    #[error("rule not found: {id}")]
    RuleNotFound {
        /// The rule ID that was not found.
        id: String,
    },

    /// Reading or writing the rules file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_rule() {
        let err = AlertError::InvalidRule {
            reason: "empty name".to_string(),
        };
        assert_eq!(err.to_string(), "invalid alert rule: empty name");
    }

    #[test]
    fn error_display_duplicate_rule() {
        let err = AlertError::DuplicateRule {
            id: "rule-1".to_string(),
        };
        assert_eq!(err.to_string(), "rule already exists: rule-1");
    }

    #[test]
    fn error_display_rule_not_found() {
        let err = AlertError::RuleNotFound {
            id: "dlq-orders".to_string(),
        };
        assert_eq!(err.to_string(), "rule not found: dlq-orders");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: AlertError = io_err.into();
        assert!(matches!(err, AlertError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("invalid json");
        assert!(json_err.is_err());
        let alert_err: AlertError = json_err.unwrap_err().into();
        assert!(matches!(alert_err, AlertError::SerializationError(_)));
    }
}
