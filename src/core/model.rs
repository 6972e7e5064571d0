// ThreatLog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

// =============================================================================
// Auth events (output of extraction)
// =============================================================================

/// Category of a recognised authentication event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FailedPassword,
    InvalidUser,
    AcceptedPassword,
}

impl EventKind {
    /// Stable machine-readable name, used in every output format.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FailedPassword => "failed_password",
            EventKind::InvalidUser => "invalid_user",
            EventKind::AcceptedPassword => "accepted_password",
        }
    }

    /// True for kinds that count towards the failure tables and scoring.
    pub fn is_failure(&self) -> bool {
        matches!(self, EventKind::FailedPassword | EventKind::InvalidUser)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recognised authentication event.
///
/// Created once per matching line and never mutated afterwards. Serialises
/// to the event export shape: `kind`, `ip`, `user`, `ts`, `raw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthEvent {
    pub kind: EventKind,

    /// Dotted-quad source address as written in the log. Octet ranges are
    /// not validated.
    pub ip: String,

    pub user: Option<String>,

    /// Resolved timestamp. `None` when the line had no usable
    /// `Mon DD HH:MM:SS` prefix.
    #[serde(rename = "ts", serialize_with = "serialize_opt_timestamp")]
    pub timestamp: Option<NaiveDateTime>,

    /// Original line with any leading byte-order-mark removed.
    pub raw: String,
}

impl AuthEvent {
    /// Timestamp rendered for display/export, or `None`.
    pub fn timestamp_text(&self) -> Option<String> {
        self.timestamp.map(format_timestamp)
    }
}

/// Render a timestamp in the report/export display format.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(constants::TIMESTAMP_DISPLAY_FORMAT).to_string()
}

fn serialize_opt_timestamp<S: Serializer>(
    ts: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(*ts)),
        None => serializer.serialize_none(),
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Runtime representation of a detection rule after validation and regex
/// compilation.
///
/// Built from `RuleDefinition` (the raw file structure) by
/// `core::rules::validate_and_compile`.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Caller-supplied identifier. Uniqueness is not enforced.
    pub id: String,

    /// Free-form description, carried through to the hit unchanged.
    pub description: String,

    /// Free-form severity label, carried through to the hit unchanged.
    pub severity: String,

    /// Compiled, unanchored pattern.
    pub pattern: Regex,
}

/// Aggregate result of one rule over the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub id: String,
    pub description: String,
    pub severity: String,
    /// Total number of matching lines (not capped).
    pub count: usize,
    /// First matching lines, in input order, at most `max_examples`.
    pub examples: Vec<String>,
}

// =============================================================================
// Report
// =============================================================================

/// One row of a top-N frequency table: `(key, count)`.
///
/// Serialises as a two-element array.
pub type CountRow = (String, usize);

/// Per-kind event counts in first-seen order. Kinds that never occurred are
/// absent rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindCounts(pub(crate) Vec<(EventKind, usize)>);

impl KindCounts {
    /// Count for `kind`, or `None` if the kind was never observed.
    pub fn get(&self, kind: EventKind) -> Option<usize> {
        self.0.iter().find(|(k, _)| *k == kind).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventKind, usize)> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts. Always equals the report's `total_events`.
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for KindCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (kind, count) in &self.0 {
            map.serialize_entry(kind.as_str(), count)?;
        }
        map.end()
    }
}

/// Suspicion ranking row derived from the failed-IP table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspicionEntry {
    pub ip: String,
    pub fail_count: usize,
    /// `min(100, fail_count * 5)`.
    pub score: u32,
}

/// Earliest and latest observed event timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

/// Aggregated analysis result. Built once by `core::report::summarize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub total_events: usize,
    pub counts: KindCounts,
    pub top_failed_ips: Vec<CountRow>,
    pub top_failed_users: Vec<CountRow>,
    pub top_success_ips: Vec<CountRow>,
    pub suspicious: Vec<SuspicionEntry>,
    /// Serialised as `{first, last}`; both null when no event had a timestamp.
    #[serde(serialize_with = "serialize_time_range")]
    pub time_range: Option<TimeRange>,
    pub rule_hits: Vec<RuleHit>,
}

fn serialize_time_range<S: Serializer>(
    range: &Option<TimeRange>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    match range {
        Some(r) => {
            map.serialize_entry("first", &format_timestamp(r.first))?;
            map.serialize_entry("last", &format_timestamp(r.last))?;
        }
        None => {
            map.serialize_entry("first", &Option::<String>::None)?;
            map.serialize_entry("last", &Option::<String>::None)?;
        }
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_event_serialises_export_shape() {
        let event = AuthEvent {
            kind: EventKind::FailedPassword,
            ip: "1.2.3.4".to_string(),
            user: None,
            timestamp: Some(ts(2026, 2, 6, 8, 11, 1)),
            raw: "raw line".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "failed_password");
        assert_eq!(json["ts"], "2026-02-06 08:11:01");
        assert!(json["user"].is_null());
        assert_eq!(json["raw"], "raw line");
    }

    #[test]
    fn test_kind_counts_serialise_in_first_seen_order() {
        let counts = KindCounts(vec![
            (EventKind::AcceptedPassword, 2),
            (EventKind::FailedPassword, 1),
        ]);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"accepted_password":2,"failed_password":1}"#);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(EventKind::InvalidUser), None);
    }

    #[test]
    fn test_absent_time_range_serialises_both_null() {
        let report = Report {
            total_events: 0,
            counts: KindCounts::default(),
            top_failed_ips: vec![],
            top_failed_users: vec![],
            top_success_ips: vec![],
            suspicious: vec![],
            time_range: None,
            rule_hits: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["time_range"]["first"].is_null());
        assert!(json["time_range"]["last"].is_null());
    }

    #[test]
    fn test_count_rows_serialise_as_pairs() {
        let rows: Vec<CountRow> = vec![("1.2.3.4".to_string(), 3)];
        assert_eq!(serde_json::to_string(&rows).unwrap(), r#"[["1.2.3.4",3]]"#);
    }
}
