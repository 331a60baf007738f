//! In-memory adapters: a remote store with a broadcast change feed, a
//! stepping clock and a collecting notifier.

pub mod clock;
pub mod notifier;
pub mod store;

pub use clock::SteppingClock;
pub use notifier::CollectingNotifier;
pub use store::{Faults, MemoryFeed, MemorySnapshot, MemoryStore};
