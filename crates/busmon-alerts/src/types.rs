//! Core types for the alerting engine.
//!
//! This module provides the fundamental types used throughout the busmon-alerts crate:
//! - [`AlertSeverity`]: The severity level of an alert
//! - [`AlertType`]: Which metric a rule watches
//! - [`EntityKind`]: What kind of entity an alert was raised against
//! - [`AlertRule`]: A user-defined threshold rule
//! - [`AlertEvent`]: A materialized breach of a rule against one entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::dedup::DedupKey;
use crate::error::{AlertError, Result};

/// Entity name used for alerts produced by [`crate::AlertEngine::test_rule`].
pub const TEST_ENTITY_NAME: &str = "[Test Entity]";

/// Error returned when parsing one of the symbolic enum names fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

impl ParseKindError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// The severity level of an alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Informational alert, no action required.
    Info,
    /// Warning alert, should be investigated.
    #[default]
    Warning,
    /// Critical alert, requires immediate attention.
    Critical,
}

impl AlertSeverity {
    /// All severities, lowest first.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warning, Self::Critical];

    /// Returns the symbolic name used in the rules file.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| ParseKindError::new("severity", s))
    }
}

/// The metric a rule compares against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    /// Number of messages in the dead-letter sub-queue.
    DeadLetterThreshold,
    /// Number of active messages.
    MessageCountThreshold,
    /// Queue size in bytes. Subscriptions have no size and never trigger.
    QueueSizeThreshold,
    /// Minutes since the entity was last accessed.
    InactivityThreshold,
}

impl AlertType {
    /// All alert types.
    pub const ALL: [Self; 4] = [
        Self::DeadLetterThreshold,
        Self::MessageCountThreshold,
        Self::QueueSizeThreshold,
        Self::InactivityThreshold,
    ];

    /// Returns the symbolic name used in the rules file.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeadLetterThreshold => "DeadLetterThreshold",
            Self::MessageCountThreshold => "MessageCountThreshold",
            Self::QueueSizeThreshold => "QueueSizeThreshold",
            Self::InactivityThreshold => "InactivityThreshold",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ParseKindError::new("alert type", s))
    }
}

/// The kind of entity an alert was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A queue.
    Queue,
    /// A topic subscription.
    Subscription,
    /// A synthetic entity used by rule tests.
    Test,
}

impl EntityKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "Queue",
            Self::Subscription => "Subscription",
            Self::Test => "Test",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined threshold rule.
///
/// Rules are values: changing a rule means building a new one with the same
/// `id` and handing it to [`crate::AlertEngine::update_rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique identifier for the rule. Never changes after creation.
    pub id: String,
    /// Human-readable name for the rule.
    pub name: String,
    /// The metric this rule watches.
    pub alert_type: AlertType,
    /// The severity of alerts generated by this rule.
    pub severity: AlertSeverity,
    /// Alerts fire when the metric is at or above this value.
    pub threshold: f64,
    /// Whether this rule is evaluated.
    pub is_enabled: bool,
    /// Optional entity-name pattern restricting which entities the rule covers.
    pub entity_pattern: Option<String>,
}

impl AlertRule {
    /// Maximum allowed length for rule names.
    pub const MAX_NAME_LENGTH: usize = 256;

    /// Creates a new alert rule builder.
    pub fn builder(name: impl Into<String>, alert_type: AlertType, threshold: f64) -> AlertRuleBuilder {
        AlertRuleBuilder::new(name, alert_type, threshold)
    }

    /// Returns a copy of this rule with `is_enabled` replaced.
    #[must_use]
    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            is_enabled: enabled,
            ..self.clone()
        }
    }

    /// Returns true if the metric value crosses this rule's threshold.
    #[must_use]
    pub fn is_breached_by(&self, value: f64) -> bool {
        value >= self.threshold
    }

    /// Checks the fields a rule must satisfy to be registered.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` if the id or name is empty, the name
    /// is too long, or the threshold is not a finite number.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(AlertError::InvalidRule {
                reason: "rule id cannot be empty".to_string(),
            });
        }

        if self.name.trim().is_empty() {
            return Err(AlertError::InvalidRule {
                reason: "rule name cannot be empty".to_string(),
            });
        }

        if self.name.len() > Self::MAX_NAME_LENGTH {
            return Err(AlertError::InvalidRule {
                reason: format!(
                    "rule name exceeds maximum length of {} characters",
                    Self::MAX_NAME_LENGTH
                ),
            });
        }

        if !self.threshold.is_finite() {
            return Err(AlertError::InvalidRule {
                reason: format!("threshold must be a finite number, got {}", self.threshold),
            });
        }

        Ok(())
    }
}

/// Builder for creating [`AlertRule`] instances.
#[derive(Debug)]
pub struct AlertRuleBuilder {
    id: Option<String>,
    name: String,
    alert_type: AlertType,
    severity: AlertSeverity,
    threshold: f64,
    enabled: bool,
    entity_pattern: Option<String>,
}

impl AlertRuleBuilder {
    fn new(name: impl Into<String>, alert_type: AlertType, threshold: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            alert_type,
            severity: AlertSeverity::Warning,
            threshold,
            enabled: true,
            entity_pattern: None,
        }
    }

    /// Uses a fixed ID instead of generating one.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub const fn severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets whether the rule is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Restricts the rule to entities whose names match `pattern`.
    ///
    /// An empty pattern is stored as no pattern.
    #[must_use]
    pub fn entity_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.entity_pattern = if pattern.is_empty() { None } else { Some(pattern) };
        self
    }

    /// Builds the [`AlertRule`].
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` if the rule fails [`AlertRule::validate`].
    pub fn build(self) -> Result<AlertRule> {
        let rule = AlertRule {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name,
            alert_type: self.alert_type,
            severity: self.severity,
            threshold: self.threshold,
            is_enabled: self.enabled,
            entity_pattern: self.entity_pattern,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// A breach of a rule against one entity at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique identifier for this alert instance.
    pub id: String,
    /// The rule as it was when the alert triggered.
    pub rule: AlertRule,
    /// Name of the breaching entity.
    pub entity_name: String,
    /// Kind of the breaching entity.
    pub entity_type: EntityKind,
    /// The metric value that crossed the threshold.
    pub current_value: f64,
    /// When the alert triggered.
    pub timestamp: DateTime<Utc>,
    /// Whether a user has acknowledged the alert.
    pub is_acknowledged: bool,
}

impl AlertEvent {
    /// Creates a new, unacknowledged alert.
    #[must_use]
    pub fn new(
        rule: &AlertRule,
        entity_name: impl Into<String>,
        entity_type: EntityKind,
        current_value: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rule: rule.clone(),
            entity_name: entity_name.into(),
            entity_type,
            current_value,
            timestamp,
            is_acknowledged: false,
        }
    }

    /// Creates a synthetic alert for exercising a rule's notification path.
    #[must_use]
    pub fn test(rule: &AlertRule) -> Self {
        Self::new(rule, TEST_ENTITY_NAME, EntityKind::Test, rule.threshold, Utc::now())
    }

    /// Returns an acknowledged copy of this alert.
    #[must_use]
    pub fn acknowledged(&self) -> Self {
        Self {
            is_acknowledged: true,
            ..self.clone()
        }
    }

    /// Returns true for alerts produced by a rule test.
    #[must_use]
    pub fn is_test(&self) -> bool {
        self.entity_type == EntityKind::Test
    }

    /// Returns the dedup key for this alert, or `None` for test alerts.
    #[must_use]
    pub fn dedup_key(&self) -> Option<DedupKey> {
        if self.is_test() {
            return None;
        }
        Some(DedupKey::new(&self.rule.id, &self.entity_name, self.rule.alert_type))
    }
}
