//! The rolling lookahead window.
//!
//! Feed timestamps are compared as naive wall-clock values: any timezone
//! suffix is dropped rather than converted.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// How far past `now` an activity may start and still be reported.
pub const LOOKAHEAD_DAYS: i64 = 7;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// The `[start of today, now + 7 days)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingWindow {
    day_start: NaiveDateTime,
    horizon: NaiveDateTime,
}

impl UpcomingWindow {
    /// Anchors the window at `now`.
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            day_start: now.date().and_time(NaiveTime::MIN),
            horizon: now + Duration::days(LOOKAHEAD_DAYS),
        }
    }

    pub const fn day_start(&self) -> NaiveDateTime {
        self.day_start
    }

    pub const fn horizon(&self) -> NaiveDateTime {
        self.horizon
    }

    /// An occurrence qualifies if it ends after today began and starts
    /// before the horizon.
    pub fn contains(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        end > self.day_start && start < self.horizon
    }

    /// Like [`contains`](Self::contains) for raw feed strings. Unparseable
    /// timestamps never qualify.
    pub fn admits(&self, start: &str, end: &str) -> bool {
        match (parse_feed_timestamp(start), parse_feed_timestamp(end)) {
            (Some(start), Some(end)) => self.contains(start, end),
            _ => false,
        }
    }
}

/// Parses a feed timestamp as a naive wall-clock value, ignoring any
/// timezone suffix.
pub fn parse_feed_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    let value = value.strip_suffix(['Z', 'z']).unwrap_or(value);
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        parse_feed_timestamp(value).expect("timestamp")
    }

    #[test]
    fn parses_feed_formats_ignoring_timezone() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();
        assert_eq!(parse_feed_timestamp("2026-10-20T17:00:00Z"), Some(expected));
        assert_eq!(
            parse_feed_timestamp("2026-10-20T17:00:00-07:00"),
            Some(expected)
        );
        assert_eq!(parse_feed_timestamp("2026-10-20T17:00:00"), Some(expected));
        assert_eq!(
            parse_feed_timestamp("2026-10-20 17:00:00.000"),
            Some(expected)
        );
        assert_eq!(
            parse_feed_timestamp("2026-10-20"),
            Some(expected.date().and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_feed_timestamp(""), None);
        assert_eq!(parse_feed_timestamp("next tuesday"), None);
    }

    #[test]
    fn window_spans_start_of_day_to_a_week_out() {
        let window = UpcomingWindow::at(at("2026-10-19T15:30:00"));
        assert_eq!(window.day_start(), at("2026-10-19T00:00:00"));
        assert_eq!(window.horizon(), at("2026-10-26T15:30:00"));
    }

    #[test]
    fn excludes_occurrences_that_ended_yesterday() {
        let window = UpcomingWindow::at(at("2026-10-19T15:30:00"));
        assert!(!window.admits("2026-10-17T17:00:00Z", "2026-10-18T17:00:00Z"));
        assert!(!window.admits("2026-10-17T17:00:00Z", "2026-10-19T00:00:00Z"));
    }

    #[test]
    fn includes_occurrences_in_progress_today() {
        let window = UpcomingWindow::at(at("2026-10-19T15:30:00"));
        assert!(window.admits("2026-10-12T17:00:00Z", "2026-10-19T09:00:00Z"));
        assert!(window.admits("2026-10-19T15:30:00", "2026-10-20T15:30:00"));
    }

    #[test]
    fn excludes_occurrences_beyond_the_horizon() {
        let window = UpcomingWindow::at(at("2026-10-19T15:30:00"));
        assert!(!window.admits("2026-10-27T15:30:00", "2026-10-28T15:30:00"));
        assert!(!window.admits("2026-10-26T15:30:00", "2026-10-28T15:30:00"));
        assert!(window.admits("2026-10-26T15:29:59", "2026-10-28T15:30:00"));
    }

    #[test]
    fn unparseable_timestamps_never_qualify() {
        let window = UpcomingWindow::at(at("2026-10-19T15:30:00"));
        assert!(!window.admits("", "2026-10-20T00:00:00"));
        assert!(!window.admits("2026-10-19T00:00:00", "soon"));
    }
}
