//! Reactive cache and change-feed synchronization.

pub mod cache;
pub mod feed;

pub use cache::{QueryCache, QueryKey};
pub use feed::{bind_cache, deliver_next, pump, ChangeFeed, SubscriptionId};
