//! Change feed port: a stream of remote insert/update/delete notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PortFuture;

/// Table a change notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    /// The `taken` table.
    #[serde(rename = "taken")]
    Tasks,
    /// The `clienten` table.
    #[serde(rename = "clienten")]
    Clients,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Tasks => "taken",
            Entity::Clients => "clienten",
        })
    }
}

/// Kind of change reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedOperation {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
    /// Unspecified change (`*`).
    #[serde(rename = "*")]
    Any,
}

impl fmt::Display for FeedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedOperation::Insert => "insert",
            FeedOperation::Update => "update",
            FeedOperation::Delete => "delete",
            FeedOperation::Any => "*",
        })
    }
}

/// One notification from the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Which table changed.
    pub entity: Entity,
    /// What happened to it.
    pub operation: FeedOperation,
}

impl ChangeEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(entity: Entity, operation: FeedOperation) -> Self {
        Self { entity, operation }
    }
}

/// Transport delivering change notifications from the remote store.
///
/// Notifications arrive regardless of which client made the change. The
/// transport (broadcast, polling, long-lived connection) stays behind this
/// trait.
pub trait ChangeFeedSource: Send + Sync {
    /// Waits for the next notification. `Ok(None)` means the feed closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    fn next_event(&self) -> PortFuture<'_, Option<ChangeEvent>>;
}
