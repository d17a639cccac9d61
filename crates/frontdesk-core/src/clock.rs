//! Wall-clock abstraction and the canonical stored timestamp format.
//!
//! Every timestamp written to the database goes through [`to_iso8601`], so
//! lexicographic comparison in SQL matches chronological order.

use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of "now" for cutoffs, backup dates and audit timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a settable instant. Used by tests.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard = instant;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Format an instant as stored in the database: `2025-01-31T09:15:00.000Z`.
pub fn to_iso8601(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp. Accepts any RFC 3339 offset and normalizes to UTC.
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso8601_is_millis_with_z_suffix() {
        let t = Utc.with_ymd_and_hms(2025, 1, 31, 9, 15, 0).unwrap();
        assert_eq!(to_iso8601(t), "2025-01-31T09:15:00.000Z");
    }

    #[test]
    fn iso8601_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(to_iso8601(earlier) < to_iso8601(later));
    }

    #[test]
    fn parse_normalizes_offsets() {
        let parsed = parse_iso8601("2025-01-31T10:15:00+01:00").unwrap();
        assert_eq!(to_iso8601(parsed), "2025-01-31T09:15:00.000Z");
        assert!(parse_iso8601("yesterday").is_none());
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now(), t0);
        let t1 = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        clock.set(t1);
        assert_eq!(clock.now(), t1);
    }
}
