//! Notifier that keeps every notification for later inspection.

use std::sync::Mutex;

use crate::ports::notifier::{Notification, NotificationKind, Notifier};

/// Collects notifications instead of showing them.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifier lock poisoned").clone()
    }

    /// Number of notifications of the given kind.
    #[must_use]
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.seen.lock().expect("notifier lock poisoned").iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().expect("notifier lock poisoned").push(notification);
    }
}
