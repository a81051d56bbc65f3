//! Tracking of active, unacknowledged breaches.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::AlertType;

/// Identity of an ongoing breach: one rule, one entity, one metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    /// The rule that was breached.
    pub rule_id: String,
    /// The breaching entity.
    pub entity_name: String,
    /// The metric the rule watches.
    pub alert_type: AlertType,
}

impl DedupKey {
    /// Creates a key for the given breach.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, entity_name: impl Into<String>, alert_type: AlertType) -> Self {
        Self {
            rule_id: rule_id.into(),
            entity_name: entity_name.into(),
            alert_type,
        }
    }
}

/// Set of breaches that already have an unacknowledged alert.
#[derive(Debug, Default)]
pub struct DedupTracker {
    active: HashSet<DedupKey>,
}

impl DedupTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as active. Returns `true` if it was not already tracked.
    pub fn try_mark(&mut self, key: DedupKey) -> bool {
        self.active.insert(key)
    }

    /// Forgets `key` so the breach can alert again.
    pub fn unmark(&mut self, key: &DedupKey) -> bool {
        self.active.remove(key)
    }

    /// Returns true if `key` is currently tracked.
    #[must_use]
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.active.contains(key)
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
