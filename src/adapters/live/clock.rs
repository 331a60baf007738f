//! System clock.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
