//! Threshold alerting for Busmon's message-queue monitoring.
//!
//! `busmon-alerts` decides which user-defined rules are breached by the
//! latest queue and subscription metrics, keeps one open alert per ongoing
//! breach, and tracks acknowledgment so a breach can alert again once a user
//! has handled it.
//!
//! # Features
//!
//! - **Threshold Rules**: Dead-letter, message-count, size and inactivity thresholds
//! - **Entity Patterns**: Case-insensitive regex scoping with substring fallback
//! - **Deduplication**: One unacknowledged alert per rule, entity and metric
//! - **Persistence**: Rules saved to a JSON file on every change
//! - **Notifications**: Synchronous channels and an async broadcast stream
//!
//! # Example
//!
//! ```rust
//! use busmon_alerts::{
//!     AlertEngine, AlertRule, AlertSeverity, AlertType, LogChannel, QueueSnapshot,
//! };
//!
//! let engine = AlertEngine::new();
//! engine.add_channel(Box::new(LogChannel::default()));
//!
//! let rule = AlertRule::builder("Prod dead letters", AlertType::DeadLetterThreshold, 10.0)
//!     .severity(AlertSeverity::Critical)
//!     .entity_pattern("^prod-")
//!     .build()
//!     .unwrap();
//! engine.add_rule(rule).unwrap();
//!
//! let queues = vec![QueueSnapshot::new("prod-orders").with_dead_letters(15)];
//! let fired = engine.evaluate(&queues, &[]);
//! assert_eq!(fired.len(), 1);
//!
//! // Still breaching, but already alerted.
//! assert!(engine.evaluate(&queues, &[]).is_empty());
//!
//! // Once acknowledged the breach can alert again.
//! engine.acknowledge_alert(&fired[0].id);
//! assert_eq!(engine.evaluate(&queues, &[]).len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod alert_log;
pub mod channels;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use alert_log::ActiveAlertLog;
pub use channels::{
    AlertNotification, CallbackChannel, ChannelHandle, LogChannel, NotificationChannel, Notifier,
};
pub use config::{EngineConfig, PatternLimits};
pub use dedup::{DedupKey, DedupTracker};
pub use engine::AlertEngine;
pub use error::{AlertError, Result};
pub use matcher::{CompiledPattern, PatternMatcher};
pub use snapshot::{MonitoredEntity, QueueSnapshot, SubscriptionSnapshot};
pub use store::RuleStore;
pub use types::{
    AlertEvent, AlertRule, AlertRuleBuilder, AlertSeverity, AlertType, EntityKind, ParseKindError,
    TEST_ENTITY_NAME,
};
