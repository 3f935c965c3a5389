//! Wall-clock abstraction.
//!
//! The store asks a [`Clock`] for "now" instead of reading the system time
//! directly, so tests can pin clock-in/clock-out instants and "today".

use std::sync::Mutex;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, SubsecRound};

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    /// The current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// The current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the system's local time, truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use timesheet_tracker::clock::{Clock, FixedClock};
/// use chrono::{Duration, NaiveDateTime};
///
/// let start = NaiveDateTime::parse_from_str("2024-01-10 22:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let clock = FixedClock::new(start);
/// clock.advance(Duration::hours(8));
/// assert_eq!(clock.now(), start + Duration::hours(8));
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
