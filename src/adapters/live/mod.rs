//! Live adapters for real external interactions.

pub mod clock;
pub mod notifier;
pub mod poll;
pub mod rest;

pub use clock::SystemClock;
pub use notifier::ConsoleNotifier;
pub use poll::{PollingFeed, RowVersion, VersionLister};
pub use rest::RestBackend;
