//! Deterministic clock for the in-memory store and tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::ports::clock::Clock;

/// Clock that starts at a fixed instant and advances one second per call.
///
/// Successive writes to the in-memory store therefore get strictly
/// increasing `updated_at` values.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    /// Creates a clock whose first reading is `start`.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self { next: Mutex::new(start) }
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().expect("clock lock poisoned");
        let current = *next;
        *next = current + Duration::seconds(1);
        current
    }
}
