//! Clock abstraction so time-dependent session logic can be tested.
//!
//! Everything that reads "now" (slot classification, transition windows,
//! celebration deadlines, the wall-clock display) goes through [`Clock`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeZone, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get the current time in the local timezone.
    fn now_local(&self) -> DateTime<Local>;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Mock clock for testing with controllable time.
///
/// Clones share the same instant.
#[derive(Debug, Clone)]
pub struct MockClock {
    utc_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a new mock clock set to the given UTC time.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            utc_time: Arc::new(Mutex::new(time)),
        }
    }

    /// Create a mock clock whose `now_local` reads the given local wall time.
    ///
    /// Returns `None` for wall times that do not exist or are ambiguous
    /// (DST transitions).
    pub fn at_local(year: i32, month: u32, day: u32, hour: u32, min: u32) -> Option<Self> {
        let local = Local
            .with_ymd_and_hms(year, month, day, hour, min, 0)
            .single()?;
        Some(Self::new(local.with_timezone(&Utc)))
    }

    /// Set the mock clock to a new time.
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.utc_time.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.utc_time.lock().unwrap_or_else(PoisonError::into_inner);
        *time += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.utc_time.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_local(&self) -> DateTime<Local> {
        self.now_utc().with_timezone(&Local)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = Utc::now();
        let clock_time = clock.now_utc();
        let after = Utc::now();

        assert!(clock_time >= before);
        assert!(clock_time <= after);
    }

    #[test]
    fn test_mock_clock_set_time_moves_into_next_day() {
        let thursday_night = Utc.with_ymd_and_hms(2024, 6, 13, 23, 59, 0).unwrap();
        let clock = MockClock::new(thursday_night);
        assert_eq!(clock.now_utc().weekday(), chrono::Weekday::Thu);

        clock.set_time(thursday_night + chrono::Duration::minutes(1));
        assert_eq!(clock.now_utc().weekday(), chrono::Weekday::Fri);
        assert_eq!(clock.now_utc().hour(), 0);
    }

    #[test]
    fn test_mock_clock_advance() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let clock = MockClock::new(start);

        clock.advance(chrono::Duration::milliseconds(200));

        assert_eq!(clock.now_utc(), start + chrono::Duration::milliseconds(200));
    }

    #[test]
    fn test_mock_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let clock = MockClock::new(start);
        let shared = clock.clone();

        clock.advance(chrono::Duration::seconds(2));

        assert_eq!(shared.now_utc(), start + chrono::Duration::seconds(2));
    }

    #[test]
    fn test_mock_clock_at_local_round_trips_wall_time() {
        let clock = MockClock::at_local(2024, 6, 12, 13, 0).unwrap();
        let local = clock.now_local();

        assert_eq!(local.day(), 12);
        assert_eq!(local.hour(), 13);
        assert_eq!(local.minute(), 0);
    }
}
