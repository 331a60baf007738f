//! Client-side query cache over the remote store.
//!
//! Entries are keyed by query identity. A read returns the cached rows when
//! the entry is fresh and fetches otherwise. Mutations and change-feed events
//! only ever invalidate; the cache never patches rows locally.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::PortError;
use crate::model::{Client, Task};
use crate::ports::{Entity, TaskStore};

/// Identity of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// All tasks, most recently updated first.
    Tasks,
    /// All clients.
    Clients,
}

impl QueryKey {
    /// The cache region a change-feed entity maps to.
    #[must_use]
    pub fn for_entity(entity: Entity) -> Self {
        match entity {
            Entity::Tasks => QueryKey::Tasks,
            Entity::Clients => QueryKey::Clients,
        }
    }
}

#[derive(Debug, Clone)]
enum Cached {
    Tasks(Vec<Task>),
    Clients(Vec<Client>),
}

#[derive(Debug, Default)]
struct Slot {
    value: Option<Cached>,
    stale: bool,
    /// Bumped on every invalidation so a fetch that raced one is stored stale.
    generation: u64,
    fetches: u64,
}

/// In-memory cache of task and client lists.
#[derive(Debug, Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<QueryKey, Slot>>,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the task list, fetching it if the entry is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns the store error if a fetch was needed and failed.
    pub async fn tasks(&self, store: &dyn TaskStore) -> Result<Vec<Task>, PortError> {
        if let Some(Cached::Tasks(tasks)) = self.fresh(QueryKey::Tasks) {
            tracing::debug!(count = tasks.len(), "task cache hit");
            return Ok(tasks);
        }
        match self.refetch(QueryKey::Tasks, store).await? {
            Cached::Tasks(tasks) => Ok(tasks),
            Cached::Clients(_) => unreachable!("task query stored client rows"),
        }
    }

    /// Returns the client list, fetching it if the entry is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns the store error if a fetch was needed and failed.
    pub async fn clients(&self, store: &dyn TaskStore) -> Result<Vec<Client>, PortError> {
        if let Some(Cached::Clients(clients)) = self.fresh(QueryKey::Clients) {
            return Ok(clients);
        }
        match self.refetch(QueryKey::Clients, store).await? {
            Cached::Clients(clients) => Ok(clients),
            Cached::Tasks(_) => unreachable!("client query stored task rows"),
        }
    }

    /// Unconditionally re-fetches one query and stores the result.
    ///
    /// # Errors
    ///
    /// Returns the store error; the previous entry is kept as it was.
    async fn refetch(&self, key: QueryKey, store: &dyn TaskStore) -> Result<Cached, PortError> {
        let generation = self.with_slot(key, |slot| slot.generation);
        let value = match key {
            QueryKey::Tasks => Cached::Tasks(store.fetch_tasks().await?),
            QueryKey::Clients => Cached::Clients(store.fetch_clients().await?),
        };
        self.with_slot(key, |slot| {
            slot.value = Some(value.clone());
            slot.stale = slot.generation != generation;
            slot.fetches += 1;
        });
        tracing::debug!(?key, "query re-fetched");
        Ok(value)
    }

    /// Marks an entry stale. Returns `true` if a fresh entry was invalidated.
    ///
    /// Invalidating an entry that is already stale or missing is a no-op.
    pub fn invalidate(&self, key: QueryKey) -> bool {
        self.with_slot(key, |slot| {
            slot.generation += 1;
            let was_fresh = slot.value.is_some() && !slot.stale;
            slot.stale = true;
            was_fresh
        })
    }

    /// Returns `true` if the entry holds rows that have not been invalidated.
    #[must_use]
    pub fn is_fresh(&self, key: QueryKey) -> bool {
        self.fresh(key).is_some()
    }

    /// Number of completed fetches for a query.
    #[must_use]
    pub fn fetch_count(&self, key: QueryKey) -> u64 {
        self.with_slot(key, |slot| slot.fetches)
    }

    fn fresh(&self, key: QueryKey) -> Option<Cached> {
        self.with_slot(key, |slot| if slot.stale { None } else { slot.value.clone() })
    }

    fn with_slot<R>(&self, key: QueryKey, f: impl FnOnce(&mut Slot) -> R) -> R {
        let mut slots = self.slots.lock().expect("cache lock poisoned");
        f(slots.entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::model::Task;
    use chrono::Utc;
    use uuid::Uuid;

    fn store_with_tasks(n: u128) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 1..=n {
            store.insert_task(Task::new(Uuid::from_u128(i), Utc::now()));
        }
        store
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let store = store_with_tasks(2);
        let cache = QueryCache::new();

        assert_eq!(cache.tasks(&store).await.unwrap().len(), 2);
        assert_eq!(cache.tasks(&store).await.unwrap().len(), 2);
        assert_eq!(cache.fetch_count(QueryKey::Tasks), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let store = store_with_tasks(1);
        let cache = QueryCache::new();
        cache.tasks(&store).await.unwrap();

        store.insert_task(Task::new(Uuid::from_u128(9), Utc::now()));
        assert!(cache.invalidate(QueryKey::Tasks));
        assert!(!cache.is_fresh(QueryKey::Tasks));

        assert_eq!(cache.tasks(&store).await.unwrap().len(), 2);
        assert_eq!(cache.fetch_count(QueryKey::Tasks), 2);
    }

    #[tokio::test]
    async fn duplicate_invalidations_are_harmless() {
        let store = store_with_tasks(1);
        let cache = QueryCache::new();
        cache.tasks(&store).await.unwrap();

        assert!(cache.invalidate(QueryKey::Tasks));
        assert!(!cache.invalidate(QueryKey::Tasks));
        cache.tasks(&store).await.unwrap();
        assert_eq!(cache.fetch_count(QueryKey::Tasks), 2);
    }

    #[tokio::test]
    async fn invalidating_tasks_leaves_clients_fresh() {
        let store = store_with_tasks(1);
        let cache = QueryCache::new();
        cache.tasks(&store).await.unwrap();
        cache.clients(&store).await.unwrap();

        cache.invalidate(QueryKey::for_entity(Entity::Tasks));
        assert!(cache.is_fresh(QueryKey::Clients));
        assert!(!cache.is_fresh(QueryKey::Tasks));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_entry() {
        let store = store_with_tasks(1);
        let cache = QueryCache::new();
        cache.tasks(&store).await.unwrap();
        cache.invalidate(QueryKey::Tasks);

        store.faults().fail_next_fetch();
        assert!(cache.tasks(&store).await.is_err());
        assert_eq!(cache.fetch_count(QueryKey::Tasks), 1);
        assert!(!cache.is_fresh(QueryKey::Tasks));
    }
}
