//! Notification delivery for alert and rule changes.
//!
//! This module provides the [`NotificationChannel`] trait and the
//! [`Notifier`] that fans notifications out to registered channels and to
//! async subscribers of a broadcast stream. The engine only calls into the
//! notifier after releasing its state lock, so channels are free to call back
//! into the engine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::types::AlertEvent;

/// A change the UI or a dispatcher may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "alert", rename_all = "snake_case")]
pub enum AlertNotification {
    /// A new alert became active.
    Triggered(AlertEvent),
    /// The active alert list changed; consumers should re-read it.
    AlertsChanged,
    /// The rule list changed; consumers should re-read it.
    RulesChanged,
}

impl AlertNotification {
    /// Returns the triggered alert, if this is a trigger notification.
    #[must_use]
    pub const fn alert(&self) -> Option<&AlertEvent> {
        match self {
            Self::Triggered(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Trait for notification channels.
///
/// Implement this trait to deliver alerts to a UI, a toast service or any
/// other sink. `send` runs on the thread that caused the notification.
pub trait NotificationChannel: Send + Sync + fmt::Debug {
    /// Returns the name of this channel.
    fn name(&self) -> &str;

    /// Delivers a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails. Failures are logged by the
    /// notifier and do not affect other channels.
    fn send(&self, notification: &AlertNotification) -> Result<()>;

    /// Returns true if this channel is enabled.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Handle returned when registering a channel, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(u64);

/// Channel that writes triggered alerts to `tracing`.
#[derive(Debug, Clone)]
pub struct LogChannel {
    name: String,
    enabled: bool,
}

impl LogChannel {
    /// Creates a new log channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    /// Sets whether the channel is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new("log")
    }
}

impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, notification: &AlertNotification) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        match notification {
            AlertNotification::Triggered(alert) => {
                error!(
                    rule = %alert.rule.name,
                    severity = %alert.rule.severity,
                    entity = %alert.entity_name,
                    entity_type = %alert.entity_type,
                    value = %alert.current_value,
                    threshold = %alert.rule.threshold,
                    "ALERT"
                );
            }
            AlertNotification::AlertsChanged => debug!(channel = %self.name, "alerts changed"),
            AlertNotification::RulesChanged => info!(channel = %self.name, "rules changed"),
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Channel that hands every notification to a closure.
pub struct CallbackChannel<F> {
    name: String,
    callback: F,
}

impl<F> CallbackChannel<F>
where
    F: Fn(&AlertNotification) + Send + Sync,
{
    /// Creates a channel that calls `callback` for every notification.
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> fmt::Debug for CallbackChannel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChannel").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<F> NotificationChannel for CallbackChannel<F>
where
    F: Fn(&AlertNotification) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, notification: &AlertNotification) -> Result<()> {
        (self.callback)(notification);
        Ok(())
    }
}

/// Fans notifications out to channels and broadcast subscribers.
#[derive(Debug)]
pub struct Notifier {
    next_handle: AtomicU64,
    channels: RwLock<Vec<(ChannelHandle, Arc<dyn NotificationChannel>)>>,
    stream: broadcast::Sender<AlertNotification>,
}

impl Notifier {
    /// Creates a notifier whose broadcast stream buffers `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (stream, _) = broadcast::channel(capacity.max(1));
        Self {
            next_handle: AtomicU64::new(1),
            channels: RwLock::new(Vec::new()),
            stream,
        }
    }

    /// Registers a channel.
    pub fn add_channel(&self, channel: Box<dyn NotificationChannel>) -> ChannelHandle {
        let handle = ChannelHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        info!(channel = %channel.name(), "added notification channel");
        self.channels.write().push((handle, Arc::from(channel)));
        handle
    }

    /// Unregisters a channel. Returns `false` if the handle is unknown.
    pub fn remove_channel(&self, handle: ChannelHandle) -> bool {
        let mut channels = self.channels.write();
        let before = channels.len();
        channels.retain(|(h, _)| *h != handle);
        before != channels.len()
    }

    /// Number of registered channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Returns a receiver for every notification sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlertNotification> {
        self.stream.subscribe()
    }

    /// Delivers `notification` to every enabled channel and to subscribers.
    ///
    /// Returns the number of channels that accepted it.
    pub fn notify(&self, notification: &AlertNotification) -> usize {
        // Snapshot so channels may register or unregister while being called.
        let channels: Vec<_> = self.channels.read().iter().map(|(_, c)| Arc::clone(c)).collect();

        let mut delivered = 0;
        for channel in channels.iter().filter(|c| c.is_enabled()) {
            match channel.send(notification) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(channel = %channel.name(), error = %e, "notification error"),
            }
        }

        // No receivers is the normal case for synchronous consumers.
        let _ = self.stream.send(notification.clone());
        delivered
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}
