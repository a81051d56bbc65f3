//! Alert engine for evaluating rules and managing active alerts.
//!
//! This module provides the [`AlertEngine`] which is the main entry point
//! for the alerting system. It owns the rule list, the active alert log and
//! the dedup keys behind a single lock, evaluates rules against metric
//! snapshots, and notifies channels of changes.
//!
//! Lock discipline: evaluation snapshots the enabled rules, releases the lock
//! for the matching pass, then re-acquires it once to commit the whole batch.
//! Notifications are always sent after the lock is released.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::alert_log::ActiveAlertLog;
use crate::channels::{AlertNotification, ChannelHandle, NotificationChannel, Notifier};
use crate::config::EngineConfig;
use crate::dedup::DedupTracker;
use crate::error::{AlertError, Result};
use crate::matcher::PatternMatcher;
use crate::snapshot::{MonitoredEntity, QueueSnapshot, SubscriptionSnapshot};
use crate::store::RuleStore;
use crate::types::{AlertEvent, AlertRule};

/// Everything guarded by the engine lock.
#[derive(Debug)]
struct EngineState {
    rules: RuleStore,
    alerts: ActiveAlertLog,
    dedup: DedupTracker,
}

/// The alert engine is responsible for evaluating rules and managing alerts.
///
/// Cloning the engine yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    config: Arc<EngineConfig>,
    state: Arc<Mutex<EngineState>>,
    matcher: Arc<PatternMatcher>,
    notifier: Arc<Notifier>,
}

impl AlertEngine {
    /// Creates an in-memory engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with custom configuration.
    ///
    /// Rules are not read from disk until [`AlertEngine::load_rules`] is called.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let state = EngineState {
            rules: RuleStore::new(config.rules_path.clone()),
            alerts: ActiveAlertLog::new(),
            dedup: DedupTracker::new(),
        };

        Self {
            matcher: Arc::new(PatternMatcher::new(config.pattern_limits)),
            notifier: Arc::new(Notifier::new(config.notification_buffer)),
            state: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the entity pattern matcher.
    #[must_use]
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    // ============ Rule Management ============

    /// Adds a new alert rule and persists the rule list.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::DuplicateRule` if a rule with the same ID exists,
    /// or `AlertError::InvalidRule` if the rule fails validation.
    pub fn add_rule(&self, rule: AlertRule) -> Result<()> {
        self.state.lock().rules.add(rule)?;
        self.notifier.notify(&AlertNotification::RulesChanged);
        Ok(())
    }

    /// Removes a rule by ID. Returns the number of rules removed.
    pub fn remove_rule(&self, rule_id: &str) -> usize {
        let removed = self.state.lock().rules.remove(rule_id);
        if removed > 0 {
            self.notifier.notify(&AlertNotification::RulesChanged);
        }
        removed
    }

    /// Replaces the rule with the same ID.
    ///
    /// Returns `false` if it doesn't exist, is invalid, or is unchanged.
    pub fn update_rule(&self, rule: AlertRule) -> bool {
        let updated = self.state.lock().rules.update(rule);
        if updated {
            self.notifier.notify(&AlertNotification::RulesChanged);
        }
        updated
    }

    /// Enables or disables a rule. Returns `false` if it doesn't exist or
    /// already has that state.
    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> bool {
        let updated = self.state.lock().rules.set_enabled(rule_id, enabled);
        if updated {
            self.notifier.notify(&AlertNotification::RulesChanged);
        }
        updated
    }

    /// Gets a rule by ID.
    #[must_use]
    pub fn get_rule(&self, rule_id: &str) -> Option<AlertRule> {
        self.state.lock().rules.get(rule_id).cloned()
    }

    /// Gets a rule by ID, failing if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::RuleNotFound` if no rule has this ID.
    pub fn require_rule(&self, rule_id: &str) -> Result<AlertRule> {
        self.get_rule(rule_id).ok_or_else(|| AlertError::RuleNotFound {
            id: rule_id.to_string(),
        })
    }

    /// Returns all rules in insertion order.
    #[must_use]
    pub fn rules(&self) -> Vec<AlertRule> {
        self.state.lock().rules.rules().to_vec()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.state.lock().rules.len()
    }

    /// Writes the rule list to the configured file. Returns `true` on success.
    pub fn save_rules(&self) -> bool {
        self.state.lock().rules.save()
    }

    /// Writes the rule list to the configured file, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn persist_rules(&self) -> Result<()> {
        self.state.lock().rules.try_save()
    }

    /// Replaces the rule list with the configured file's contents.
    ///
    /// Returns the number of rules loaded; unreadable files leave the current
    /// rules in place.
    pub fn load_rules(&self) -> usize {
        match self.try_load_rules() {
            Ok(loaded) => loaded,
            Err(e) => {
                debug!(error = %e, "failed to load alert rules");
                0
            }
        }
    }

    /// Replaces the rule list with the configured file's contents, reporting
    /// a file that exists but cannot be read.
    ///
    /// Emits `RulesChanged` whenever the rule list differs afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or malformed. The
    /// current rules are left in place.
    pub fn try_load_rules(&self) -> Result<usize> {
        let (loaded, changed) = {
            let mut state = self.state.lock();
            let before = state.rules.rules().to_vec();
            let loaded = state.rules.try_load()?;
            (loaded, state.rules.rules() != before.as_slice())
        };
        if changed {
            self.notifier.notify(&AlertNotification::RulesChanged);
        }
        Ok(loaded)
    }

    // ============ Alert Management ============

    /// Returns all alerts in the order they were raised.
    #[must_use]
    pub fn active_alerts(&self) -> Vec<AlertEvent> {
        self.state.lock().alerts.snapshot()
    }

    /// Returns the number of alerts not yet acknowledged.
    #[must_use]
    pub fn unacknowledged_count(&self) -> usize {
        self.state.lock().alerts.unacknowledged_count()
    }

    /// Acknowledges an alert so the same breach can alert again.
    ///
    /// Returns `false` if no alert has this ID.
    pub fn acknowledge_alert(&self, alert_id: &str) -> bool {
        let acknowledged = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.alerts.acknowledge(alert_id, &mut state.dedup)
        };

        if acknowledged {
            info!(alert_id = %alert_id, "acknowledged alert");
            self.notifier.notify(&AlertNotification::AlertsChanged);
        }
        acknowledged
    }

    /// Removes every acknowledged alert. Returns how many were removed.
    pub fn clear_acknowledged_alerts(&self) -> usize {
        let removed = self.state.lock().alerts.clear_acknowledged();
        debug!(removed, "cleared acknowledged alerts");
        self.notifier.notify(&AlertNotification::AlertsChanged);
        removed
    }

    /// Raises a synthetic alert for `rule` without touching dedup state.
    pub fn test_rule(&self, rule: &AlertRule) -> AlertEvent {
        let event = AlertEvent::test(rule);
        self.state.lock().alerts.push(event.clone());

        info!(rule_id = %rule.id, rule_name = %rule.name, alert_id = %event.id, "test alert raised");
        self.notifier.notify(&AlertNotification::Triggered(event.clone()));
        self.notifier.notify(&AlertNotification::AlertsChanged);
        event
    }

    // ============ Channel Management ============

    /// Adds a notification channel.
    pub fn add_channel(&self, channel: Box<dyn NotificationChannel>) -> ChannelHandle {
        self.notifier.add_channel(channel)
    }

    /// Removes a notification channel. Returns `false` if the handle is unknown.
    pub fn remove_channel(&self, handle: ChannelHandle) -> bool {
        self.notifier.remove_channel(handle)
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.notifier.channel_count()
    }

    /// Subscribes to the notification stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlertNotification> {
        self.notifier.subscribe()
    }

    // ============ Evaluation ============

    /// Evaluates all enabled rules against the given snapshots.
    ///
    /// This should be called by the poller after every refresh. Returns the
    /// alerts that became active during this call.
    pub fn evaluate(
        &self,
        queues: &[QueueSnapshot],
        subscriptions: &[SubscriptionSnapshot],
    ) -> Vec<AlertEvent> {
        self.evaluate_at(queues, subscriptions, Utc::now())
    }

    /// Evaluates all enabled rules as of `now`.
    pub fn evaluate_at(
        &self,
        queues: &[QueueSnapshot],
        subscriptions: &[SubscriptionSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        let rules = self.state.lock().rules.enabled();

        let mut candidates = Vec::new();
        for rule in &rules {
            self.collect_breaches(rule, queues, now, &mut candidates);
            self.collect_breaches(rule, subscriptions, now, &mut candidates);
        }

        let fired = self.commit(candidates);

        for event in &fired {
            info!(
                rule_id = %event.rule.id,
                rule_name = %event.rule.name,
                entity = %event.entity_name,
                value = %event.current_value,
                "alert fired"
            );
            self.notifier.notify(&AlertNotification::Triggered(event.clone()));
        }
        if !fired.is_empty() {
            self.notifier.notify(&AlertNotification::AlertsChanged);
        }

        debug!(
            rules_evaluated = rules.len(),
            entities = queues.len() + subscriptions.len(),
            alerts_fired = fired.len(),
            "evaluation complete"
        );

        fired
    }

    /// Appends a candidate alert for every entity that matches and breaches `rule`.
    fn collect_breaches<E: MonitoredEntity>(
        &self,
        rule: &AlertRule,
        entities: &[E],
        now: DateTime<Utc>,
        out: &mut Vec<AlertEvent>,
    ) {
        for entity in entities {
            let name = entity.entity_name();
            if !self.matcher.matches(&name, rule.entity_pattern.as_deref()) {
                continue;
            }

            let value = entity.metric(rule.alert_type, now);
            if rule.is_breached_by(value) {
                out.push(AlertEvent::new(rule, name, entity.entity_kind(), value, now));
            }
        }
    }

    /// Atomically dedups and records a batch of candidates.
    ///
    /// Candidates built from a rule that was removed, disabled or edited since
    /// the snapshot are dropped.
    fn commit(&self, candidates: Vec<AlertEvent>) -> Vec<AlertEvent> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut fired = Vec::new();
        for event in candidates {
            if state.rules.get(&event.rule.id) != Some(&event.rule) {
                debug!(rule_id = %event.rule.id, "rule changed during evaluation, dropping candidate");
                continue;
            }

            let Some(key) = event.dedup_key() else {
                continue;
            };
            if state.dedup.try_mark(key) {
                state.alerts.push(event.clone());
                fired.push(event);
            }
        }

        fired
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}
