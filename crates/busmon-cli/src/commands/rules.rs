//! Rule management command implementation.
//!
//! Handles rule listing, creation, deletion, and enabling/disabling.

use std::io::Write;

use busmon_alerts::{AlertEngine, AlertRule};
use serde::Serialize;
use tracing::warn;

use crate::cli::{AddRuleArgs, RuleCommands};
use crate::error::CliError;
use crate::output::{OutputFormat, RuleInfo, RuleList, TableDisplay};

/// Handler for rule subcommands.
pub struct RuleCommand<'a> {
    engine: &'a AlertEngine,
}

impl<'a> RuleCommand<'a> {
    /// Creates a new rule command handler.
    #[must_use]
    pub const fn new(engine: &'a AlertEngine) -> Self {
        Self { engine }
    }

    /// Executes the rule subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the rule does not exist, is invalid, or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &RuleCommands,
    ) -> Result<(), CliError> {
        match command {
            RuleCommands::List => self.list(out, format),
            RuleCommands::Add(args) => self.add(out, format, args),
            RuleCommands::Remove { id } => self.remove(out, format, id),
            RuleCommands::Enable { id } => self.set_enabled(out, format, id, true),
            RuleCommands::Disable { id } => self.set_enabled(out, format, id, false),
        }
    }

    fn list<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let list = RuleList {
            rules: self.engine.rules().iter().map(RuleInfo::from).collect(),
        };
        format.write(out, &list)
    }

    fn add<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &AddRuleArgs,
    ) -> Result<(), CliError> {
        let mut builder = AlertRule::builder(args.name.clone(), args.alert_type.into(), args.threshold)
            .severity(args.severity.into())
            .enabled(!args.disabled);
        if let Some(id) = &args.id {
            if id.trim().is_empty() {
                return Err(CliError::InvalidArgument("--id must not be blank".into()));
            }
            builder = builder.id(id.clone());
        }
        if let Some(pattern) = &args.pattern {
            builder = builder.entity_pattern(pattern.clone());
        }
        let rule = builder.build()?;

        let mut message = format!("Rule '{}' created", rule.name);
        if let Some(pattern) = rule.entity_pattern.as_deref() {
            if !self.engine.matcher().is_valid(pattern) {
                warn!(pattern, "entity pattern is not a valid regex, matching as substring");
                message.push_str(" (pattern matches as plain text)");
            }
        }

        let id = rule.id.clone();
        self.engine.add_rule(rule)?;
        self.persist()?;

        format.write(
            out,
            &RuleResponse {
                success: true,
                id,
                message,
            },
        )
    }

    fn remove<W: Write>(&self, out: &mut W, format: &OutputFormat, id: &str) -> Result<(), CliError> {
        if self.engine.remove_rule(id) == 0 {
            return Err(CliError::RuleNotFound(id.to_string()));
        }
        self.persist()?;

        format.write(
            out,
            &RuleResponse {
                success: true,
                id: id.to_string(),
                message: format!("Rule '{id}' removed"),
            },
        )
    }

    fn set_enabled<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        enabled: bool,
    ) -> Result<(), CliError> {
        let rule = self
            .engine
            .get_rule(id)
            .ok_or_else(|| CliError::RuleNotFound(id.to_string()))?;

        let state = if enabled { "enabled" } else { "disabled" };
        let message = if self.engine.set_rule_enabled(id, enabled) {
            self.persist()?;
            format!("Rule '{}' {state}", rule.name)
        } else {
            format!("Rule '{}' already {state}", rule.name)
        };

        format.write(
            out,
            &RuleResponse {
                success: true,
                id: id.to_string(),
                message,
            },
        )
    }

    /// Confirms the rule list reached disk. Each run starts from the file, so
    /// an unsaved change would be lost.
    fn persist(&self) -> Result<(), CliError> {
        self.engine
            .persist_rules()
            .map_err(|e| CliError::Config(format!("failed to write rules file: {e}")))
    }
}

// Output types

/// Rule operation response.
#[derive(Debug, Clone, Serialize)]
pub struct RuleResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Rule ID.
    pub id: String,
    /// Response message.
    pub message: String,
}

impl TableDisplay for RuleResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let icon = if self.success { "✓" } else { "✗" };
        writeln!(writer, "{icon} {}", self.message)?;
        writeln!(writer, "  ID: {}", self.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AlertTypeArg, Format, SeverityArg};
    use busmon_alerts::{AlertSeverity, AlertType};

    fn add_args(name: &str) -> AddRuleArgs {
        AddRuleArgs {
            name: name.into(),
            alert_type: AlertTypeArg::DeadLetter,
            severity: SeverityArg::Critical,
            threshold: 10.0,
            pattern: None,
            id: Some("dlq-10".into()),
            disabled: false,
        }
    }

    fn run(engine: &AlertEngine, format: Format, command: &RuleCommands) -> Result<String, CliError> {
        let mut buf = Vec::new();
        RuleCommand::new(engine).execute(&mut buf, &OutputFormat::new(format), command)?;
        Ok(String::from_utf8(buf).expect("utf8"))
    }

    #[test]
    fn add_creates_rule() {
        let engine = AlertEngine::new();
        let output = run(&engine, Format::Table, &RuleCommands::Add(add_args("DLQ"))).expect("add");

        assert!(output.contains("Rule 'DLQ' created"));
        let rule = engine.get_rule("dlq-10").expect("stored");
        assert_eq!(rule.alert_type, AlertType::DeadLetterThreshold);
        assert_eq!(rule.severity, AlertSeverity::Critical);
        assert!(rule.is_enabled);
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let engine = AlertEngine::new();
        run(&engine, Format::Table, &RuleCommands::Add(add_args("first"))).expect("add");
        let err = run(&engine, Format::Table, &RuleCommands::Add(add_args("second"))).unwrap_err();
        assert!(matches!(err, CliError::Alert(_)));
        assert_eq!(engine.rule_count(), 1);
    }

    #[test]
    fn add_rejects_blank_name() {
        let engine = AlertEngine::new();
        let err = run(&engine, Format::Table, &RuleCommands::Add(add_args("   "))).unwrap_err();
        assert!(matches!(err, CliError::Alert(_)));
        assert_eq!(engine.rule_count(), 0);
    }

    #[test]
    fn add_rejects_blank_id() {
        let engine = AlertEngine::new();
        let mut args = add_args("DLQ");
        args.id = Some(" ".into());
        let err = run(&engine, Format::Table, &RuleCommands::Add(args)).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn add_flags_invalid_pattern() {
        let engine = AlertEngine::new();
        let mut args = add_args("Bracketed");
        args.pattern = Some("orders[".into());
        let output = run(&engine, Format::Table, &RuleCommands::Add(args)).expect("add");
        assert!(output.contains("plain text"));
    }

    #[test]
    fn add_disabled() {
        let engine = AlertEngine::new();
        let mut args = add_args("Off");
        args.disabled = true;
        run(&engine, Format::Table, &RuleCommands::Add(args)).expect("add");
        assert!(!engine.get_rule("dlq-10").expect("stored").is_enabled);
    }

    #[test]
    fn remove_unknown_rule_fails() {
        let engine = AlertEngine::new();
        let err = run(&engine, Format::Table, &RuleCommands::Remove { id: "nope".into() }).unwrap_err();
        assert!(matches!(err, CliError::RuleNotFound(id) if id == "nope"));
    }

    #[test]
    fn disable_then_enable() {
        let engine = AlertEngine::new();
        run(&engine, Format::Table, &RuleCommands::Add(add_args("DLQ"))).expect("add");

        let output = run(&engine, Format::Table, &RuleCommands::Disable { id: "dlq-10".into() })
            .expect("disable");
        assert!(output.contains("Rule 'DLQ' disabled"));
        assert!(!engine.get_rule("dlq-10").expect("stored").is_enabled);

        let output = run(&engine, Format::Table, &RuleCommands::Disable { id: "dlq-10".into() })
            .expect("disable");
        assert!(output.contains("already disabled"));

        run(&engine, Format::Table, &RuleCommands::Enable { id: "dlq-10".into() }).expect("enable");
        assert!(engine.get_rule("dlq-10").expect("stored").is_enabled);
    }

    #[test]
    fn mutations_fail_when_rules_file_cannot_be_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        std::fs::create_dir_all(&path).expect("mkdir");
        let engine = AlertEngine::with_config(busmon_alerts::EngineConfig::with_rules_path(&path));

        let err = run(&engine, Format::Table, &RuleCommands::Add(add_args("DLQ"))).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("failed to write rules file")));

        let err = run(&engine, Format::Table, &RuleCommands::Disable { id: "dlq-10".into() }).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));

        let err = run(&engine, Format::Table, &RuleCommands::Remove { id: "dlq-10".into() }).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn list_json() {
        let engine = AlertEngine::new();
        run(&engine, Format::Table, &RuleCommands::Add(add_args("DLQ"))).expect("add");

        let output = run(&engine, Format::Json, &RuleCommands::List).expect("list");
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed["rules"][0]["id"], "dlq-10");
        assert_eq!(parsed["rules"][0]["severity"], "Critical");
    }
}
