//! User-facing notifications (toasts).
//!
//! Sinks are fire-and-forget: `notify` never blocks and never fails the caller.
//! Clients receive them live over the `/ws/notifications` feed.

pub mod ws;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub use ws::notification_routes;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title)
    }

    /// Attach a longer description.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Destination for notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, n: Notification) {
        let detail = n.message.as_deref().unwrap_or("");
        match n.kind {
            NotificationKind::Info | NotificationKind::Success => {
                info!(kind = ?n.kind, title = %n.title, detail, "Notification")
            }
            NotificationKind::Warning => warn!(title = %n.title, detail, "Notification"),
            NotificationKind::Error => error!(title = %n.title, detail, "Notification"),
        }
    }
}

/// Fans notifications out to any number of subscribers (e.g. connected UIs),
/// logging each one as well.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        TracingNotifier.notify(notification.clone());
        // Ok if nobody is listening
        let _ = self.tx.send(notification);
    }
}

/// Keeps every notification in memory. Handy in tests.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

impl NotificationSink for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_notifier_keeps_order() {
        let sink = CollectingNotifier::new();
        sink.notify(Notification::info("one"));
        sink.notify(Notification::error("two").with_message("details"));

        let seen = sink.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].title, "one");
        assert_eq!(seen[1].message.as_deref(), Some("details"));
        assert_eq!(sink.count(NotificationKind::Error), 1);

        assert_eq!(sink.take().len(), 2);
        assert!(sink.notifications().is_empty());
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let sink = BroadcastNotifier::new();
        let mut rx = sink.subscribe();
        sink.notify(Notification::success("saved"));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.kind, NotificationKind::Success);
        assert_eq!(got.title, "saved");
    }

    #[test]
    fn broadcast_without_subscribers_is_fine() {
        let sink = BroadcastNotifier::new();
        sink.notify(Notification::warning("nobody listening"));
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationKind::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
