//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use busmon_alerts::{AlertEvent, AlertRule};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

// ============================================================================
// Rules
// ============================================================================

/// Rule summary row.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    /// Rule ID.
    pub id: String,
    /// Rule name.
    pub name: String,
    /// Alert type.
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Severity.
    pub severity: String,
    /// Threshold value.
    pub threshold: f64,
    /// Whether the rule is evaluated.
    pub enabled: bool,
    /// Entity pattern, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl From<&AlertRule> for RuleInfo {
    fn from(rule: &AlertRule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            alert_type: rule.alert_type.to_string(),
            severity: rule.severity.to_string(),
            threshold: rule.threshold,
            enabled: rule.is_enabled,
            pattern: rule.entity_pattern.clone(),
        }
    }
}

/// List of rules.
#[derive(Debug, Clone, Serialize)]
pub struct RuleList {
    /// Rules in insertion order.
    pub rules: Vec<RuleInfo>,
}

impl TableDisplay for RuleList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.rules.is_empty() {
            writeln!(writer, "No rules found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<36}  {:<24}  {:<22}  {:<8}  {:>12}  {:<7}  PATTERN",
            "ID", "NAME", "TYPE", "SEVERITY", "THRESHOLD", "ENABLED"
        )?;
        writeln!(writer, "{}", "─".repeat(130))?;

        for rule in &self.rules {
            writeln!(
                writer,
                "{:<36}  {:<24}  {:<22}  {:<8}  {:>12}  {:<7}  {}",
                truncate(&rule.id, 36),
                truncate(&rule.name, 24),
                rule.alert_type,
                rule.severity,
                rule.threshold,
                if rule.enabled { "yes" } else { "no" },
                rule.pattern.as_deref().unwrap_or("-"),
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} rules", self.rules.len())?;
        Ok(())
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// Alert summary row.
#[derive(Debug, Clone, Serialize)]
pub struct AlertInfo {
    /// Alert instance ID.
    pub id: String,
    /// ID of the rule that fired.
    pub rule_id: String,
    /// Name of the rule that fired.
    pub rule_name: String,
    /// Severity.
    pub severity: String,
    /// Entity name.
    pub entity: String,
    /// Entity kind.
    pub entity_type: String,
    /// Observed value.
    pub value: f64,
    /// Rule threshold at trigger time.
    pub threshold: f64,
    /// When the alert triggered (RFC 3339).
    pub triggered_at: String,
    /// Whether the alert has been acknowledged.
    pub acknowledged: bool,
}

impl From<&AlertEvent> for AlertInfo {
    fn from(event: &AlertEvent) -> Self {
        Self {
            id: event.id.clone(),
            rule_id: event.rule.id.clone(),
            rule_name: event.rule.name.clone(),
            severity: event.rule.severity.to_string(),
            entity: event.entity_name.clone(),
            entity_type: event.entity_type.to_string(),
            value: event.current_value,
            threshold: event.rule.threshold,
            triggered_at: event.timestamp.to_rfc3339(),
            acknowledged: event.is_acknowledged,
        }
    }
}

/// List of alerts.
#[derive(Debug, Clone, Serialize)]
pub struct AlertList {
    /// Alerts in trigger order.
    pub alerts: Vec<AlertInfo>,
}

impl AlertList {
    /// Builds a list from engine events.
    #[must_use]
    pub fn from_events(events: &[AlertEvent]) -> Self {
        Self {
            alerts: events.iter().map(AlertInfo::from).collect(),
        }
    }
}

impl TableDisplay for AlertList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.alerts.is_empty() {
            writeln!(writer, "No alerts triggered")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<8}  {:<24}  {:<32}  {:<12}  {:>12}  {:>12}",
            "SEVERITY", "RULE", "ENTITY", "KIND", "VALUE", "THRESHOLD"
        )?;
        writeln!(writer, "{}", "─".repeat(110))?;

        for alert in &self.alerts {
            writeln!(
                writer,
                "{:<8}  {:<24}  {:<32}  {:<12}  {:>12}  {:>12}",
                alert.severity,
                truncate(&alert.rule_name, 24),
                truncate(&alert.entity, 32),
                alert.entity_type,
                alert.value,
                alert.threshold,
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} alerts", self.alerts.len())?;
        Ok(())
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
