//! Console notifier for the CLI.

use crate::ports::notifier::{Notification, NotificationKind, Notifier};

/// Prints each notification to stderr and logs it.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(message = %notification.message, "notification");
                eprintln!("✓ {}", notification.message);
            }
            NotificationKind::Failure => {
                tracing::warn!(message = %notification.message, "notification");
                eprintln!("✗ {}", notification.message);
            }
        }
    }
}
