//! Rule test command implementation.

use std::io::Write;

use busmon_alerts::{AlertEngine, LogChannel};

use crate::error::CliError;
use crate::output::{AlertList, OutputFormat};

/// Handler for the test command.
pub struct TestCommand<'a> {
    engine: &'a AlertEngine,
}

impl<'a> TestCommand<'a> {
    /// Creates a new test command handler.
    #[must_use]
    pub const fn new(engine: &'a AlertEngine) -> Self {
        Self { engine }
    }

    /// Raises a test alert for the stored rule `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::RuleNotFound`] for unknown rules.
    pub fn execute<W: Write>(&self, out: &mut W, format: &OutputFormat, id: &str) -> Result<(), CliError> {
        let rule = self
            .engine
            .get_rule(id)
            .ok_or_else(|| CliError::RuleNotFound(id.to_string()))?;

        self.engine.add_channel(Box::new(LogChannel::default()));
        let event = self.engine.test_rule(&rule);

        format.write(out, &AlertList::from_events(&[event]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use busmon_alerts::{AlertRule, AlertType, TEST_ENTITY_NAME};

    #[test]
    fn test_alert_uses_rule_threshold() {
        let engine = AlertEngine::new();
        engine
            .add_rule(
                AlertRule::builder("Idle", AlertType::InactivityThreshold, 30.0)
                    .id("idle-30")
                    .build()
                    .expect("valid rule"),
            )
            .expect("add");

        let mut buf = Vec::new();
        TestCommand::new(&engine)
            .execute(&mut buf, &OutputFormat::new(Format::Json), "idle-30")
            .expect("test");

        let parsed: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(parsed["alerts"][0]["entity"], TEST_ENTITY_NAME);
        assert_eq!(parsed["alerts"][0]["value"], 30.0);
        assert_eq!(engine.active_alerts().len(), 1);
    }

    #[test]
    fn unknown_rule_fails() {
        let engine = AlertEngine::new();
        let mut buf = Vec::new();
        let err = TestCommand::new(&engine)
            .execute(&mut buf, &OutputFormat::default(), "missing")
            .unwrap_err();
        assert!(matches!(err, CliError::RuleNotFound(_)));
        assert!(buf.is_empty());
    }
}
