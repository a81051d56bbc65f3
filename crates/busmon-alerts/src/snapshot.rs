//! Metric snapshots supplied by the poller.
//!
//! The engine never fetches metrics itself. The poller hands it the latest
//! [`QueueSnapshot`] and [`SubscriptionSnapshot`] values on every evaluation,
//! and [`MonitoredEntity`] maps each [`AlertType`] to the value a rule compares
//! against its threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AlertType, EntityKind};

/// Runtime metrics of one queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSnapshot {
    /// Queue name.
    pub name: String,
    /// Messages available for delivery.
    pub active_message_count: u64,
    /// Messages in the dead-letter sub-queue.
    pub dead_letter_count: u64,
    /// Messages scheduled for later delivery.
    pub scheduled_message_count: u64,
    /// Current size of the queue in bytes.
    pub size_in_bytes: u64,
    /// Last time the queue was sent to or received from.
    pub accessed_at: Option<DateTime<Utc>>,
}

impl QueueSnapshot {
    /// Creates an empty snapshot for the named queue.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the dead-letter count.
    #[must_use]
    pub const fn with_dead_letters(mut self, count: u64) -> Self {
        self.dead_letter_count = count;
        self
    }

    /// Sets the active message count.
    #[must_use]
    pub const fn with_active_messages(mut self, count: u64) -> Self {
        self.active_message_count = count;
        self
    }

    /// Sets the size in bytes.
    #[must_use]
    pub const fn with_size_in_bytes(mut self, bytes: u64) -> Self {
        self.size_in_bytes = bytes;
        self
    }

    /// Sets the last-access time.
    #[must_use]
    pub fn with_accessed_at(mut self, at: DateTime<Utc>) -> Self {
        self.accessed_at = Some(at);
        self
    }
}

/// Runtime metrics of one topic subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionSnapshot {
    /// Subscription name.
    pub name: String,
    /// Name of the topic the subscription belongs to.
    pub topic_name: String,
    /// Messages available for delivery.
    pub active_message_count: u64,
    /// Messages in the dead-letter sub-queue.
    pub dead_letter_count: u64,
    /// Last time the subscription was received from.
    pub accessed_at: Option<DateTime<Utc>>,
}

impl SubscriptionSnapshot {
    /// Creates an empty snapshot for `topic/name`.
    #[must_use]
    pub fn new(topic_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topic_name: topic_name.into(),
            ..Self::default()
        }
    }

    /// Sets the dead-letter count.
    #[must_use]
    pub const fn with_dead_letters(mut self, count: u64) -> Self {
        self.dead_letter_count = count;
        self
    }

    /// Sets the active message count.
    #[must_use]
    pub const fn with_active_messages(mut self, count: u64) -> Self {
        self.active_message_count = count;
        self
    }

    /// Sets the last-access time.
    #[must_use]
    pub fn with_accessed_at(mut self, at: DateTime<Utc>) -> Self {
        self.accessed_at = Some(at);
        self
    }
}

/// An entity rules can be evaluated against.
pub trait MonitoredEntity {
    /// Name used for pattern matching and dedup.
    fn entity_name(&self) -> String;

    /// What kind of entity this is.
    fn entity_kind(&self) -> EntityKind;

    /// Value of the metric watched by `alert_type`, as of `now`.
    fn metric(&self, alert_type: AlertType, now: DateTime<Utc>) -> f64;
}

impl MonitoredEntity for QueueSnapshot {
    fn entity_name(&self) -> String {
        self.name.clone()
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Queue
    }

    fn metric(&self, alert_type: AlertType, now: DateTime<Utc>) -> f64 {
        match alert_type {
            AlertType::DeadLetterThreshold => self.dead_letter_count as f64,
            AlertType::MessageCountThreshold => self.active_message_count as f64,
            AlertType::QueueSizeThreshold => self.size_in_bytes as f64,
            AlertType::InactivityThreshold => idle_minutes(self.accessed_at, now),
        }
    }
}

impl MonitoredEntity for SubscriptionSnapshot {
    fn entity_name(&self) -> String {
        format!("{}/{}", self.topic_name, self.name)
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Subscription
    }

    fn metric(&self, alert_type: AlertType, now: DateTime<Utc>) -> f64 {
        match alert_type {
            AlertType::DeadLetterThreshold => self.dead_letter_count as f64,
            AlertType::MessageCountThreshold => self.active_message_count as f64,
            AlertType::QueueSizeThreshold => 0.0,
            AlertType::InactivityThreshold => idle_minutes(self.accessed_at, now),
        }
    }
}

/// Minutes between the last access and `now`; 0 when unknown or in the future.
fn idle_minutes(accessed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    accessed_at.map_or(0.0, |at| {
        let millis = now.signed_duration_since(at).num_milliseconds().max(0);
        millis as f64 / 60_000.0
    })
}
