//! Ordered log of raised alerts and their acknowledgment state.

use tracing::debug;

use crate::dedup::DedupTracker;
use crate::types::AlertEvent;

/// Alerts in the order they were raised.
///
/// Entries are never mutated in place: acknowledging swaps in an
/// acknowledged copy, so snapshots handed out earlier stay valid.
#[derive(Debug, Default)]
pub struct ActiveAlertLog {
    events: Vec<AlertEvent>,
}

impl ActiveAlertLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an alert.
    pub fn push(&mut self, event: AlertEvent) {
        self.events.push(event);
    }

    /// Clones the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AlertEvent> {
        self.events.clone()
    }

    /// Looks up an alert by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AlertEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Number of alerts, acknowledged or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of alerts awaiting acknowledgment.
    #[must_use]
    pub fn unacknowledged_count(&self) -> usize {
        self.events.iter().filter(|e| !e.is_acknowledged).count()
    }

    /// Marks an alert acknowledged and releases its dedup key.
    ///
    /// Returns `false` if no alert has this ID. Acknowledging twice is allowed
    /// but only the first call releases the key, since a newer alert for the
    /// same breach may hold it by then.
    pub fn acknowledge(&mut self, id: &str, dedup: &mut DedupTracker) -> bool {
        let Some(slot) = self.events.iter_mut().find(|e| e.id == id) else {
            return false;
        };

        if slot.is_acknowledged {
            debug!(alert_id = %id, "alert already acknowledged");
            return true;
        }

        let acked = slot.acknowledged();
        if let Some(key) = acked.dedup_key() {
            dedup.unmark(&key);
        }
        *slot = acked;
        true
    }

    /// Drops every acknowledged alert. Returns how many were removed.
    pub fn clear_acknowledged(&mut self) -> usize {
        let before = self.events.len();
        self.events.retain(|e| !e.is_acknowledged);
        before - self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertRule, AlertType, EntityKind};
    use chrono::Utc;

    fn rule() -> AlertRule {
        AlertRule::builder("DLQ", AlertType::DeadLetterThreshold, 10.0)
            .id("dlq")
            .build()
            .unwrap()
    }

    fn raise(log: &mut ActiveAlertLog, dedup: &mut DedupTracker, entity: &str) -> AlertEvent {
        let event = AlertEvent::new(&rule(), entity, EntityKind::Queue, 12.0, Utc::now());
        if let Some(key) = event.dedup_key() {
            assert!(dedup.try_mark(key));
        }
        log.push(event.clone());
        event
    }

    #[test]
    fn acknowledge_releases_key() {
        let mut log = ActiveAlertLog::new();
        let mut dedup = DedupTracker::new();
        let event = raise(&mut log, &mut dedup, "orders");

        assert!(log.acknowledge(&event.id, &mut dedup));
        assert!(dedup.is_empty());
        assert!(log.get(&event.id).unwrap().is_acknowledged);
        assert_eq!(log.unacknowledged_count(), 0);
    }

    #[test]
    fn acknowledge_unknown_id() {
        let mut log = ActiveAlertLog::new();
        let mut dedup = DedupTracker::new();
        assert!(!log.acknowledge("missing", &mut dedup));
    }

    #[test]
    fn second_acknowledge_keeps_newer_key() {
        let mut log = ActiveAlertLog::new();
        let mut dedup = DedupTracker::new();
        let first = raise(&mut log, &mut dedup, "orders");
        log.acknowledge(&first.id, &mut dedup);

        let second = raise(&mut log, &mut dedup, "orders");
        assert!(log.acknowledge(&first.id, &mut dedup));
        assert!(dedup.contains(&second.dedup_key().unwrap()));
    }

    #[test]
    fn acknowledging_test_alert_leaves_real_keys() {
        let mut log = ActiveAlertLog::new();
        let mut dedup = DedupTracker::new();
        raise(&mut log, &mut dedup, "orders");
        let test = AlertEvent::test(&rule());
        log.push(test.clone());

        assert!(log.acknowledge(&test.id, &mut dedup));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn clear_acknowledged_keeps_open_alerts() {
        let mut log = ActiveAlertLog::new();
        let mut dedup = DedupTracker::new();
        let a = raise(&mut log, &mut dedup, "a");
        let b = raise(&mut log, &mut dedup, "b");
        log.acknowledge(&a.id, &mut dedup);

        assert_eq!(log.clear_acknowledged(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].id, b.id);
        assert_eq!(log.clear_acknowledged(), 0);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut log = ActiveAlertLog::new();
        let mut dedup = DedupTracker::new();
        let event = raise(&mut log, &mut dedup, "orders");

        let before = log.snapshot();
        log.acknowledge(&event.id, &mut dedup);
        assert!(!before[0].is_acknowledged);
    }
}
