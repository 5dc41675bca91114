//! User notification adapters for the CLI
//!
//! [`ConsoleNotifier`] prints notifications through the output formatter.
//! [`SilentNotifier`] is installed when `notifications.enabled` is false.

use dualsync_core::ports::{INotificationService, Notification};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub struct ConsoleNotifier {
    format: OutputFormat,
    formatter: Box<dyn OutputFormatter>,
}

impl ConsoleNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            formatter: get_formatter(format),
        }
    }
}

#[async_trait::async_trait]
impl INotificationService for ConsoleNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.format.is_json() {
            let value = serde_json::json!({ "notification": notification });
            self.formatter.print_json(&value);
        } else if notification.is_error() {
            self.formatter
                .warn(&format!("{}: {}", notification.title, notification.body));
        } else {
            self.formatter.info(&notification.body);
        }
        Ok(())
    }
}

/// Drops every notification
pub struct SilentNotifier;

#[async_trait::async_trait]
impl INotificationService for SilentNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        tracing::debug!(title = %notification.title, "Notification suppressed");
        Ok(())
    }
}
