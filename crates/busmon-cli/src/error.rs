//! CLI error types.

use busmon_alerts::AlertError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration or input file.
    #[error("configuration error: {0}")]
    Config(String),
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Rule not found.
    #[error("rule not found: {0}")]
    RuleNotFound(String),
    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
    /// Engine error.
    #[error(transparent)]
    Alert(#[from] AlertError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
