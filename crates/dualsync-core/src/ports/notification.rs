//! Notification service port (driven/secondary port)
//!
//! Interface for surfacing per-item failures and end-of-run summaries to the
//! user. Implementations may print to a console, post a desktop toast, or
//! discard everything.
//!
//! Notifications are fire-and-forget; the engine never waits for user
//! interaction and never fails a run because delivery failed.

use serde::{Deserialize, Serialize};

/// Priority level for a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    /// Used for item failures
    High,
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// A notification to display to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Title of the notification (short, descriptive)
    pub title: String,
    /// Body text with details about the event
    pub body: String,
    pub priority: NotificationPriority,
    /// Category for grouping/filtering ("sync" or "error")
    pub category: String,
}

impl Notification {
    /// Creates a new notification with `Normal` priority and no category
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            priority: NotificationPriority::Normal,
            category: String::new(),
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Creates a run summary notification
    pub fn sync(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body).with_category("sync")
    }

    /// Creates an error notification with High priority
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body)
            .with_priority(NotificationPriority::High)
            .with_category("error")
    }

    /// True for notifications created through [`Notification::error`]
    pub fn is_error(&self) -> bool {
        self.category == "error"
    }
}

/// Port trait for user-facing notifications
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Delivers a notification to the user
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_notification_defaults() {
        let n = Notification::error("Sync error", "Message: boom, EntityId: 4");
        assert_eq!(n.priority, NotificationPriority::High);
        assert!(n.is_error());
    }

    #[test]
    fn test_sync_notification_defaults() {
        let n = Notification::sync("Sync finished", "ManualSync: 0 Files Uploaded");
        assert_eq!(n.priority, NotificationPriority::Normal);
        assert_eq!(n.category, "sync");
        assert!(!n.is_error());
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(NotificationPriority::High.to_string(), "high");
        assert_eq!(NotificationPriority::default(), NotificationPriority::Normal);
    }
}
