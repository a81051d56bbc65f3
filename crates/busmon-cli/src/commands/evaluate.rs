//! Snapshot evaluation command implementation.

use std::fs;
use std::io::Write;
use std::path::Path;

use busmon_alerts::{AlertEngine, LogChannel, QueueSnapshot, SubscriptionSnapshot};
use serde::Deserialize;
use tracing::info;

use crate::error::CliError;
use crate::output::{AlertList, OutputFormat};

/// Metrics captured by a poller, as read from disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotFile {
    /// Queue metrics.
    pub queues: Vec<QueueSnapshot>,
    /// Subscription metrics.
    pub subscriptions: Vec<SubscriptionSnapshot>,
}

impl SnapshotFile {
    /// Reads and parses a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn read(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("invalid snapshot {}: {e}", path.display())))
    }
}

/// Handler for the evaluate command.
pub struct EvaluateCommand<'a> {
    engine: &'a AlertEngine,
}

impl<'a> EvaluateCommand<'a> {
    /// Creates a new evaluate command handler.
    #[must_use]
    pub const fn new(engine: &'a AlertEngine) -> Self {
        Self { engine }
    }

    /// Evaluates every enabled rule against the snapshot at `path` and
    /// prints the alerts that fired.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be read or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        path: &Path,
    ) -> Result<(), CliError> {
        let snapshot = SnapshotFile::read(path)?;
        info!(
            queues = snapshot.queues.len(),
            subscriptions = snapshot.subscriptions.len(),
            rules = self.engine.rule_count(),
            "evaluating snapshot"
        );

        self.engine.add_channel(Box::new(LogChannel::default()));
        let fired = self.engine.evaluate(&snapshot.queues, &snapshot.subscriptions);

        format.write(out, &AlertList::from_events(&fired))
    }
}
