// ThreatLog - core/timestamp.rs
//
// Year-less syslog timestamp resolution ("Feb  6 08:11:01").
// Core layer: pure functions of the line and a reference instant.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Month abbreviations in calendar order. Index + 1 is the month number.
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Anchored `Mon DD HH:MM:SS` prefix. Day may be space-padded.
fn prefix_regex() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(
            r"^(?P<mon>[A-Z][a-z]{2})\s+(?P<day>\d{1,2})\s+(?P<h>\d{2}):(?P<m>\d{2}):(?P<s>\d{2})",
        )
        .expect("timestamp prefix regex is valid")
    })
}

/// Map a three-letter month abbreviation to 1-12.
pub fn month_number(abbrev: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| *m == abbrev)
        .map(|idx| idx as u32 + 1)
}

/// Resolve the timestamp prefix of `line` against `reference`.
///
/// The year is taken from `reference`. If the result would lie strictly after
/// `reference` it is moved back one year, so "Dec 31" read on "Jan 2" lands in
/// the previous December.
///
/// Returns `None` when the prefix is missing, the month is unknown, or the
/// fields do not form a real date/time in the chosen year.
pub fn resolve(line: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let caps = prefix_regex().captures(line)?;
    let month = month_number(caps.name("mon")?.as_str())?;
    let day: u32 = caps.name("day")?.as_str().parse().ok()?;
    let hour: u32 = caps.name("h")?.as_str().parse().ok()?;
    let minute: u32 = caps.name("m")?.as_str().parse().ok()?;
    let second: u32 = caps.name("s")?.as_str().parse().ok()?;

    let build = |year: i32| {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
    };

    let candidate = build(reference.year())?;
    if candidate > reference {
        build(reference.year() - 1)
    } else {
        Some(candidate)
    }
}

/// The local wall-clock instant, used as the reference when the caller
/// supplies none.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_month_lookup() {
        assert_eq!(month_number("Jan"), Some(1));
        assert_eq!(month_number("Dec"), Some(12));
        assert_eq!(month_number("Foo"), None);
        assert_eq!(month_number("jan"), None);
    }

    #[test]
    fn test_resolves_in_reference_year() {
        let ts = resolve(
            "Feb  6 08:11:01 host sshd[1]: msg",
            at(2026, 2, 6, 9, 0, 0),
        );
        assert_eq!(ts, Some(at(2026, 2, 6, 8, 11, 1)));
    }

    #[test]
    fn test_future_timestamp_rolls_back_one_year() {
        let ts = resolve("Dec 31 23:59:59 host sshd[1]: msg", at(2026, 1, 2, 0, 0, 0));
        assert_eq!(ts, Some(at(2025, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn test_equal_to_reference_is_not_rolled_back() {
        let reference = at(2026, 2, 6, 9, 0, 0);
        assert_eq!(resolve("Feb  6 09:00:00 h", reference), Some(reference));
    }

    #[test]
    fn test_december_read_in_february_is_previous_year() {
        // Dec 31 2026 is after Feb 6 2026, so it becomes Dec 31 2025.
        let ts = resolve("Dec 31 23:59:59 h", at(2026, 2, 6, 9, 0, 0));
        assert_eq!(ts, Some(at(2025, 12, 31, 23, 59, 59)));
        // Earlier in the same year stays put.
        let ts = resolve("Jan 15 10:00:00 h", at(2026, 2, 6, 9, 0, 0));
        assert_eq!(ts, Some(at(2026, 1, 15, 10, 0, 0)));
    }

    #[test]
    fn test_unknown_month_is_absent() {
        assert_eq!(resolve("Foo  6 08:11:01 h", at(2026, 2, 6, 9, 0, 0)), None);
    }

    #[test]
    fn test_invalid_calendar_date_is_absent() {
        assert_eq!(resolve("Apr 31 08:00:00 h", at(2026, 6, 1, 0, 0, 0)), None);
        assert_eq!(resolve("Feb 29 08:00:00 h", at(2026, 6, 1, 0, 0, 0)), None);
        assert_eq!(resolve("Feb  6 25:00:00 h", at(2026, 6, 1, 0, 0, 0)), None);
    }

    #[test]
    fn test_leap_day_rolled_into_non_leap_year_is_absent() {
        // Feb 29 2028 is after the reference, and Feb 29 2027 does not exist.
        assert_eq!(resolve("Feb 29 12:00:00 h", at(2028, 2, 1, 0, 0, 0)), None);
    }

    #[test]
    fn test_prefix_must_be_at_line_start() {
        assert_eq!(
            resolve("host Feb  6 08:11:01 sshd", at(2026, 2, 6, 9, 0, 0)),
            None
        );
        assert_eq!(resolve("", at(2026, 2, 6, 9, 0, 0)), None);
    }

    #[test]
    fn test_wall_clock_reference_never_in_future() {
        let now = local_now();
        if let Some(ts) = resolve("Jan  1 00:00:00 h", now) {
            assert!(ts <= now);
        }
    }
}
