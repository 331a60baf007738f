//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the board engine and an
//! external system (remote store, object storage, change feed, notifications,
//! time). Implementations live in `src/adapters/`.

pub mod change_feed;
pub mod clock;
pub mod notifier;
pub mod object_storage;
pub mod task_store;

use std::future::Future;
use std::pin::Pin;

use crate::error::PortError;

/// Boxed future type alias used by async ports to keep them dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;

pub use change_feed::{ChangeEvent, ChangeFeedSource, Entity, FeedOperation};
pub use clock::Clock;
pub use notifier::{Notification, NotificationKind, Notifier};
pub use object_storage::ObjectStorage;
pub use task_store::TaskStore;
