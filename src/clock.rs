//! Wall-clock access and the date/timestamp formats used in artifact names.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local};

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `yyyy-MM-dd`, used for the per-day version folder
pub fn format_date(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// `HH-mm-ss-SSS`, used to keep artifact names unique within a day
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%H-%M-%S-%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32, ms: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, h, m, s)
            .unwrap()
            + Duration::milliseconds(ms as i64)
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&at(8, 5, 0, 0)), "2024-03-09");
    }

    #[test]
    fn test_format_timestamp_has_millis() {
        assert_eq!(format_timestamp(&at(8, 5, 7, 42)), "08-05-07-042");
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::new(at(23, 59, 59, 900));
        clock.advance(Duration::milliseconds(200));
        assert_eq!(format_date(&clock.now()), "2024-03-10");
    }
}
