//! Clock port used to stamp store writes and session entries.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// The in-memory store stamps `updated_at` through this port, so tests can
/// pin the fetch order of tasks by controlling time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
