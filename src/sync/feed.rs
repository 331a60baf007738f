//! Change-feed hub: per-entity publish/subscribe with explicit unsubscribe.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::cache::{QueryCache, QueryKey};
use crate::error::PortError;
use crate::ports::{ChangeEvent, ChangeFeedSource, Entity};

/// Handle returned by [`ChangeFeed::on_change`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    entity: Entity,
    handler: Handler,
}

/// Dispatches change events to the handlers registered for their entity.
#[derive(Default)]
pub struct ChangeFeed {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ChangeFeed {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every event about `entity`.
    pub fn on_change<F>(&self, entity: Entity, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.lock().push(Subscription { id, entity, handler: Arc::new(handler) });
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.lock();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Calls every handler registered for the event's entity and returns how many ran.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe themselves.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let handlers: Vec<Handler> = self
            .lock()
            .iter()
            .filter(|s| s.entity == event.entity)
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().expect("feed lock poisoned")
    }
}

/// Subscribes the cache to both tables so any remote change invalidates it.
pub fn bind_cache(feed: &ChangeFeed, cache: &Arc<QueryCache>) -> Vec<SubscriptionId> {
    [Entity::Tasks, Entity::Clients]
        .into_iter()
        .map(|entity| {
            let cache = Arc::clone(cache);
            feed.on_change(entity, move |event| {
                let key = QueryKey::for_entity(event.entity);
                if cache.invalidate(key) {
                    tracing::info!(
                        entity = %event.entity,
                        operation = %event.operation,
                        "remote change, cache invalidated"
                    );
                } else {
                    tracing::debug!(entity = %event.entity, "remote change for stale cache entry");
                }
            })
        })
        .collect()
}

/// Pulls one event from the source and publishes it. `Ok(None)` when the source closed.
///
/// # Errors
///
/// Returns the transport error from the source.
pub async fn deliver_next(
    source: &dyn ChangeFeedSource,
    feed: &ChangeFeed,
) -> Result<Option<ChangeEvent>, PortError> {
    let Some(event) = source.next_event().await? else {
        return Ok(None);
    };
    feed.publish(&event);
    Ok(Some(event))
}

/// Delivers events until the source closes. Returns the number delivered.
///
/// # Errors
///
/// Returns the transport error from the source.
pub async fn pump(source: &dyn ChangeFeedSource, feed: &ChangeFeed) -> Result<u64, PortError> {
    let mut delivered = 0;
    while deliver_next(source, feed).await?.is_some() {
        delivered += 1;
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::model::Task;
    use crate::ports::FeedOperation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn publish_reaches_only_matching_entity() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        feed.on_change(Entity::Clients, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(feed.publish(&ChangeEvent::new(Entity::Tasks, FeedOperation::Update)), 0);
        assert_eq!(feed.publish(&ChangeEvent::new(Entity::Clients, FeedOperation::Any)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribed_handler_is_not_called() {
        let feed = ChangeFeed::new();
        let id = feed.on_change(Entity::Tasks, |_| panic!("should not run"));
        assert!(feed.unsubscribe(id));
        assert!(!feed.unsubscribe(id));
        assert_eq!(feed.publish(&ChangeEvent::new(Entity::Tasks, FeedOperation::Insert)), 0);
    }

    #[tokio::test]
    async fn remote_write_invalidates_bound_cache() {
        let store = MemoryStore::new();
        store.insert_task(Task::new(Uuid::from_u128(1), chrono::Utc::now()));
        let cache = Arc::new(QueryCache::new());
        cache.tasks(&store).await.unwrap();

        let feed = ChangeFeed::new();
        let ids = bind_cache(&feed, &cache);
        assert_eq!(ids.len(), 2);
        let source = store.subscribe();

        // Another client inserts a task.
        store.insert_task(Task::new(Uuid::from_u128(2), chrono::Utc::now()));
        let event = deliver_next(&source, &feed).await.unwrap().unwrap();
        assert_eq!(event.operation, FeedOperation::Insert);
        assert!(!cache.is_fresh(QueryKey::Tasks));
        assert_eq!(cache.tasks(&store).await.unwrap().len(), 2);

        for id in ids {
            feed.unsubscribe(id);
        }
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn pump_stops_when_source_closes() {
        let store = MemoryStore::new();
        let source = store.subscribe();
        store.insert_task(Task::new(Uuid::from_u128(1), chrono::Utc::now()));
        store.insert_task(Task::new(Uuid::from_u128(2), chrono::Utc::now()));
        drop(store);

        let feed = ChangeFeed::new();
        assert_eq!(pump(&source, &feed).await.unwrap(), 2);
    }
}
