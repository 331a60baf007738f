//! Notifier port: the transient user-visible side channel.

use serde::Serialize;

/// Outcome reported by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The mutation went through.
    Success,
    /// The mutation failed.
    Failure,
}

/// A transient message about a mutation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Success or failure.
    pub kind: NotificationKind,
    /// Human-readable message.
    pub message: String,
}

impl Notification {
    /// A success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Success, message: message.into() }
    }

    /// A failure notification.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Failure, message: message.into() }
    }
}

/// Shows transient notifications to the user.
pub trait Notifier: Send + Sync {
    /// Reports one mutation outcome.
    fn notify(&self, notification: Notification);
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}
