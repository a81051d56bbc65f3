//! Authoritative rule list with JSON file persistence.
//!
//! The store lives inside the engine's state lock. Every mutation writes the
//! full rule list back to disk before returning, so a caller that observes a
//! rule change can rely on it being on disk. Persistence failures are logged
//! and never surface to the caller.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AlertError, Result};
use crate::types::{AlertRule, AlertSeverity, AlertType};

/// On-disk representation of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RuleRecord {
    id: String,
    name: String,
    #[serde(rename = "Type")]
    alert_type: String,
    severity: String,
    threshold: f64,
    is_enabled: bool,
    entity_pattern: Option<String>,
}

impl From<&AlertRule> for RuleRecord {
    fn from(rule: &AlertRule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            alert_type: rule.alert_type.as_str().to_string(),
            severity: rule.severity.as_str().to_string(),
            threshold: rule.threshold,
            is_enabled: rule.is_enabled,
            entity_pattern: rule.entity_pattern.clone(),
        }
    }
}

impl TryFrom<RuleRecord> for AlertRule {
    type Error = AlertError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        let alert_type: AlertType = record.alert_type.parse().map_err(|e| AlertError::InvalidRule {
            reason: format!("{e}"),
        })?;
        let severity: AlertSeverity = record.severity.parse().map_err(|e| AlertError::InvalidRule {
            reason: format!("{e}"),
        })?;

        let rule = Self {
            id: record.id,
            name: record.name,
            alert_type,
            severity,
            threshold: record.threshold,
            is_enabled: record.is_enabled,
            entity_pattern: record.entity_pattern.filter(|p| !p.is_empty()),
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// In-memory rule list, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: Vec<AlertRule>,
    path: Option<PathBuf>,
}

impl RuleStore {
    /// Creates an empty store that persists to `path`, if given.
    ///
    /// Nothing is read from disk until [`RuleStore::load`] is called.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            rules: Vec::new(),
            path,
        }
    }

    /// Creates a store with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// All rules in insertion order.
    #[must_use]
    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Clones of the rules that are currently enabled.
    #[must_use]
    pub fn enabled(&self) -> Vec<AlertRule> {
        self.rules.iter().filter(|r| r.is_enabled).cloned().collect()
    }

    /// Looks up a rule by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AlertRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends a rule and persists.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::DuplicateRule` if the ID is taken, or
    /// `AlertError::InvalidRule` if the rule fails validation.
    pub fn add(&mut self, rule: AlertRule) -> Result<()> {
        rule.validate()?;
        if self.get(&rule.id).is_some() {
            return Err(AlertError::DuplicateRule { id: rule.id });
        }

        info!(rule_id = %rule.id, rule_name = %rule.name, alert_type = %rule.alert_type, "added alert rule");
        self.rules.push(rule);
        self.save();
        Ok(())
    }

    /// Removes every rule with the given ID and persists if anything changed.
    ///
    /// Returns the number of rules removed.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        let removed = before - self.rules.len();

        if removed > 0 {
            info!(rule_id = %id, "removed alert rule");
            self.save();
        }
        removed
    }

    /// Replaces the rule with the same ID and persists.
    ///
    /// Returns `false`, without touching the file, if no such rule exists, the
    /// replacement is invalid, or it equals the stored rule.
    pub fn update(&mut self, rule: AlertRule) -> bool {
        if let Err(e) = rule.validate() {
            warn!(rule_id = %rule.id, error = %e, "rejected invalid rule update");
            return false;
        }
        let Some(slot) = self.rules.iter_mut().find(|r| r.id == rule.id) else {
            debug!(rule_id = %rule.id, "update for unknown rule ignored");
            return false;
        };
        if *slot == rule {
            return false;
        }

        info!(rule_id = %rule.id, rule_name = %rule.name, enabled = rule.is_enabled, "updated alert rule");
        *slot = rule;
        self.save();
        true
    }

    /// Enables or disables a rule. Delegates to [`RuleStore::update`].
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.get(id) {
            Some(rule) => {
                let updated = rule.with_enabled(enabled);
                self.update(updated)
            }
            None => false,
        }
    }

    /// Writes all rules to the backing file.
    ///
    /// Returns `true` if the rules are on disk. Failures are logged.
    pub fn save(&self) -> bool {
        let Some(path) = self.path.as_deref() else {
            debug!("no rules path configured, skipping save");
            return false;
        };

        match self.try_save() {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save alert rules");
                false
            }
        }
    }

    /// Writes all rules to the backing file, reporting failures.
    ///
    /// A store without a backing file has nothing to write and succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn try_save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        write_rules(path, &self.rules)?;
        debug!(path = %path.display(), count = self.rules.len(), "saved alert rules");
        Ok(())
    }

    /// Replaces the in-memory rules with the contents of the backing file.
    ///
    /// Unreadable files leave the current rules in place. Returns the number
    /// of rules loaded.
    pub fn load(&mut self) -> usize {
        match self.try_load() {
            Ok(count) => count,
            Err(e) => {
                debug!(error = %e, "failed to load alert rules");
                0
            }
        }
    }

    /// Replaces the in-memory rules with the contents of the backing file,
    /// reporting files that exist but cannot be read.
    ///
    /// A missing file or a store without a backing file loads nothing and
    /// leaves the current rules in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON array. The current rules are left in place.
    pub fn try_load(&mut self) -> Result<usize> {
        let Some(path) = self.path.as_deref() else {
            debug!("no rules path configured, skipping load");
            return Ok(0);
        };

        match read_rules(path) {
            Ok(rules) => {
                debug!(path = %path.display(), count = rules.len(), "loaded alert rules");
                self.rules = rules;
                Ok(self.rules.len())
            }
            Err(AlertError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no rules file yet");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

/// Serializes `rules` to `path` via a temp file and rename.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written.
pub fn write_rules(path: &Path, rules: &[AlertRule]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let records: Vec<RuleRecord> = rules.iter().map(RuleRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads rules from `path`, dropping records that do not describe a valid rule.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array.
pub fn read_rules(path: &Path) -> Result<Vec<AlertRule>> {
    let contents = fs::read_to_string(path)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&contents)?;

    let mut rules: Vec<AlertRule> = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let rule = serde_json::from_value::<RuleRecord>(value)
            .map_err(AlertError::from)
            .and_then(AlertRule::try_from);

        match rule {
            Ok(rule) if rules.iter().any(|r| r.id == rule.id) => {
                debug!(index, rule_id = %rule.id, "dropping duplicate rule record");
            }
            Ok(rule) => rules.push(rule),
            Err(e) => debug!(index, error = %e, "dropping unreadable rule record"),
        }
    }

    Ok(rules)
}
