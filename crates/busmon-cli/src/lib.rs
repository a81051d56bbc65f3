//! # busmon-cli
//!
//! Busmon command-line interface.
//!
//! Provides commands for:
//! - Managing alert rules stored in a JSON rules file
//! - Evaluating the rules once against a metrics snapshot
//! - Raising test alerts for a rule
//!
//! Every invocation opens the rules file through a fresh
//! [`busmon_alerts::AlertEngine`], so open alerts and acknowledgments live
//! only for the duration of one command.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::Path;

use busmon_alerts::{AlertEngine, EngineConfig};
use tracing::debug;

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{AddRuleArgs, Cli, Commands, Format, RuleCommands};
pub use error::CliError;
pub use output::OutputFormat;

/// Opens an engine backed by the rules file at `path`, loading any rules it
/// already holds. A missing file starts an empty rule list.
///
/// # Errors
///
/// Returns [`CliError::Config`] if the file exists but cannot be read, so a
/// later write never replaces rules that failed to load.
pub fn open_engine(path: &Path) -> Result<AlertEngine, CliError> {
    let engine = AlertEngine::with_config(EngineConfig::with_rules_path(path));
    let loaded = engine
        .try_load_rules()
        .map_err(|e| CliError::Config(format!("cannot read rules file {}: {e}", path.display())))?;
    debug!(path = %path.display(), loaded, "opened rules file");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use busmon_alerts::{AlertRule, AlertType};

    #[test]
    fn open_engine_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = open_engine(&dir.path().join("rules.json")).expect("open");
        assert_eq!(engine.rule_count(), 0);
    }

    #[test]
    fn open_engine_reloads_saved_rules() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");

        let engine = open_engine(&path).expect("open");
        engine
            .add_rule(
                AlertRule::builder("Big", AlertType::QueueSizeThreshold, 1024.0)
                    .id("big")
                    .build()
                    .expect("valid rule"),
            )
            .expect("add");

        let reopened = open_engine(&path).expect("reopen");
        assert!(reopened.get_rule("big").is_some());
    }

    #[test]
    fn open_engine_rejects_unreadable_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[1, 2,]").expect("write");

        let err = open_engine(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("cannot read rules file")));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "[1, 2,]");
    }
}
