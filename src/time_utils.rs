// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for timestamps, posting days and the client clock.

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, TimeZone, Utc};
use parking_lot::Mutex;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert stored epoch milliseconds into a UTC instant.
///
/// Out-of-range values clamp to the Unix epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

/// Half-open `[start, end)` window of the posting day containing `now`.
///
/// The day starts at local midnight in `offset`.
pub fn day_window(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = now.with_timezone(&offset).date_naive();
    // A fixed offset has exactly one mapping for every local time.
    let start = local_date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

/// Source of "now" for policies and screens.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_day_window_utc() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let (start, end) = day_window(utc("2024-03-10T17:45:00Z"), offset);
        assert_eq!(start, utc("2024-03-10T00:00:00Z"));
        assert_eq!(end, utc("2024-03-11T00:00:00Z"));
    }

    #[test]
    fn test_day_window_negative_offset_crosses_utc_date() {
        // 03:00 UTC on the 11th is still the 10th in UTC-8.
        let offset = FixedOffset::west_opt(8 * 3600).unwrap();
        let (start, end) = day_window(utc("2024-03-11T03:00:00Z"), offset);
        assert_eq!(start, utc("2024-03-10T08:00:00Z"));
        assert_eq!(end, utc("2024-03-11T08:00:00Z"));
    }

    #[test]
    fn test_day_window_at_exact_midnight_starts_new_day() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let (start, _) = day_window(utc("2024-03-11T00:00:00Z"), offset);
        assert_eq!(start, utc("2024-03-11T00:00:00Z"));
    }

    #[test]
    fn test_from_millis_round_trip() {
        let t = utc("2024-01-15T10:30:00Z");
        assert_eq!(from_millis(t.timestamp_millis()), t);
        assert_eq!(format_utc_rfc3339(t), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(utc("2024-01-15T10:00:00Z"));
        clock.advance(Duration::hours(25));
        assert_eq!(clock.now(), utc("2024-01-16T11:00:00Z"));
    }
}
