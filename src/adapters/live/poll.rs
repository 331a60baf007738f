//! Polling change-feed source.
//!
//! Periodically lists `(id, updated_at)` for both tables and turns the
//! differences between two polls into insert/update/delete events. The first
//! poll only records a baseline.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ports::{ChangeEvent, ChangeFeedSource, Entity, FeedOperation, PortFuture};

/// Identity and modification time of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowVersion {
    /// Row identifier.
    pub id: Uuid,
    /// Last modification time, if the table tracks it.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lists row versions of a table.
pub trait VersionLister: Send + Sync {
    /// Returns the current `(id, updated_at)` of every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    fn list_versions(&self, entity: Entity) -> PortFuture<'_, Vec<RowVersion>>;
}

impl<T: VersionLister> VersionLister for std::sync::Arc<T> {
    fn list_versions(&self, entity: Entity) -> PortFuture<'_, Vec<RowVersion>> {
        (**self).list_versions(entity)
    }
}

type Versions = HashMap<Uuid, Option<DateTime<Utc>>>;

/// Operations that turn `old` into `new`, at most one of each kind.
#[must_use]
pub fn diff_versions(old: &Versions, new: &Versions) -> Vec<FeedOperation> {
    let mut ops = Vec::new();
    if new.keys().any(|id| !old.contains_key(id)) {
        ops.push(FeedOperation::Insert);
    }
    if new.iter().any(|(id, at)| old.get(id).is_some_and(|prev| prev != at)) {
        ops.push(FeedOperation::Update);
    }
    if old.keys().any(|id| !new.contains_key(id)) {
        ops.push(FeedOperation::Delete);
    }
    ops
}

#[derive(Default)]
struct PollState {
    known: HashMap<Entity, Versions>,
    pending: VecDeque<ChangeEvent>,
    primed: bool,
}

/// Change-feed source that polls a [`VersionLister`].
pub struct PollingFeed<L> {
    lister: L,
    interval: Duration,
    state: tokio::sync::Mutex<PollState>,
}

impl<L: VersionLister> PollingFeed<L> {
    /// Creates a feed polling every `interval`.
    pub fn new(lister: L, interval: Duration) -> Self {
        Self { lister, interval, state: tokio::sync::Mutex::new(PollState::default()) }
    }
}

impl<L: VersionLister> ChangeFeedSource for PollingFeed<L> {
    fn next_event(&self) -> PortFuture<'_, Option<ChangeEvent>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some(event));
                }
                if state.primed {
                    tokio::time::sleep(self.interval).await;
                }
                for entity in [Entity::Tasks, Entity::Clients] {
                    let rows = self.lister.list_versions(entity).await?;
                    let current: Versions =
                        rows.into_iter().map(|r| (r.id, r.updated_at)).collect();
                    let previous = state.known.insert(entity, current.clone());
                    if !state.primed {
                        continue;
                    }
                    let previous = previous.unwrap_or_default();
                    for operation in diff_versions(&previous, &current) {
                        state.pending.push_back(ChangeEvent::new(entity, operation));
                    }
                }
                state.primed = true;
            }
        })
    }
}
