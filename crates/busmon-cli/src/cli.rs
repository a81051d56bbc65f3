//! Command-line argument parsing with clap.

use std::path::PathBuf;

use busmon_alerts::{AlertSeverity, AlertType};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Busmon - alert rules for message-queue monitoring.
#[derive(Parser, Debug, Clone)]
#[command(name = "busmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Rules file to read and update.
    #[arg(short, long, env = "BUSMON_RULES", default_value = "busmon-rules.json")]
    pub rules: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Alert rule management.
    Rules {
        /// Rule subcommand to execute.
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// Evaluate the rules once against a snapshot file.
    ///
    /// The file holds `{"queues": [...], "subscriptions": [...]}`.
    Evaluate {
        /// Path to the snapshot JSON file.
        #[arg(short, long)]
        snapshot: PathBuf,
    },

    /// Raise a test alert for a stored rule.
    Test {
        /// Rule ID to test.
        id: String,
    },
}

/// Rule subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum RuleCommands {
    /// List all rules.
    List,

    /// Create a rule.
    Add(AddRuleArgs),

    /// Delete a rule.
    Remove {
        /// Rule ID to delete.
        id: String,
    },

    /// Enable a rule.
    Enable {
        /// Rule ID to enable.
        id: String,
    },

    /// Disable a rule.
    Disable {
        /// Rule ID to disable.
        id: String,
    },
}

/// Arguments for creating a rule.
#[derive(Args, Debug, Clone)]
pub struct AddRuleArgs {
    /// Rule name.
    #[arg(short, long)]
    pub name: String,

    /// Metric the rule watches.
    #[arg(short = 't', long = "type", value_enum)]
    pub alert_type: AlertTypeArg,

    /// Alert severity.
    #[arg(short, long, value_enum, default_value_t = SeverityArg::Warning)]
    pub severity: SeverityArg,

    /// Fire when the metric reaches this value (minutes for inactivity).
    #[arg(long)]
    pub threshold: f64,

    /// Entity-name pattern (regex; invalid patterns match as substrings).
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Use this ID instead of a generated one.
    #[arg(long)]
    pub id: Option<String>,

    /// Create the rule disabled.
    #[arg(long)]
    pub disabled: bool,
}

/// Alert type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlertTypeArg {
    /// Dead-letter message count.
    DeadLetter,
    /// Active message count.
    MessageCount,
    /// Queue size in bytes.
    QueueSize,
    /// Minutes since last access.
    Inactivity,
}

impl From<AlertTypeArg> for AlertType {
    fn from(arg: AlertTypeArg) -> Self {
        match arg {
            AlertTypeArg::DeadLetter => Self::DeadLetterThreshold,
            AlertTypeArg::MessageCount => Self::MessageCountThreshold,
            AlertTypeArg::QueueSize => Self::QueueSizeThreshold,
            AlertTypeArg::Inactivity => Self::InactivityThreshold,
        }
    }
}

/// Severity argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Critical.
    Critical,
}

impl From<SeverityArg> for AlertSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Self::Info,
            SeverityArg::Warning => Self::Warning,
            SeverityArg::Critical => Self::Critical,
        }
    }
}
