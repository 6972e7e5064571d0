// ThreatLog - core/parser.rs
//
// Line-oriented auth-log event extraction.
// Core layer: accepts line slices, never touches the filesystem directly.

use crate::core::model::{AuthEvent, EventKind};
use crate::core::timestamp;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

/// A line-shape recogniser: the event kind it produces plus a regex with
/// `user` and `ip` capture groups.
struct Recognizer {
    kind: EventKind,
    re: Regex,
}

/// Captured fields of a successful recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized<'a> {
    pub kind: EventKind,
    pub user: Option<&'a str>,
    pub ip: &'a str,
}

/// Recognisers in priority order. The first structural match wins.
fn recognizers() -> &'static [Recognizer] {
    static RECOGNIZERS: OnceLock<Vec<Recognizer>> = OnceLock::new();

    RECOGNIZERS.get_or_init(|| {
        // Patterns are fixed and covered by the unit tests below.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("recognizer: invalid regex")
        }

        vec![
            // "Failed password for [invalid user ]root from 1.2.3.4 port 22 ssh2"
            // The "invalid user" marker does not change the kind.
            Recognizer {
                kind: EventKind::FailedPassword,
                re: re(
                    r"Failed password for (?:invalid user )?(?P<user>[\w.@-]+) from (?P<ip>\d+\.\d+\.\d+\.\d+)",
                ),
            },
            // "Invalid user test from 1.2.3.4 port 22"
            Recognizer {
                kind: EventKind::InvalidUser,
                re: re(r"Invalid user (?P<user>[\w.@-]+) from (?P<ip>\d+\.\d+\.\d+\.\d+)"),
            },
            // "Accepted password for joel from 1.2.3.4 port 22 ssh2"
            Recognizer {
                kind: EventKind::AcceptedPassword,
                re: re(
                    r"Accepted password for (?P<user>[\w.@-]+) from (?P<ip>\d+\.\d+\.\d+\.\d+)",
                ),
            },
        ]
    })
}

/// Remove every leading byte-order-mark.
pub fn strip_bom(line: &str) -> &str {
    line.trim_start_matches('\u{feff}')
}

/// Classify a (BOM-stripped) line against the recogniser list.
pub fn recognize(line: &str) -> Option<Recognized<'_>> {
    recognizers().iter().find_map(|r| {
        let caps = r.re.captures(line)?;
        Some(Recognized {
            kind: r.kind,
            user: caps.name("user").map(|m| m.as_str()),
            ip: caps.name("ip")?.as_str(),
        })
    })
}

/// Extract at most one event from a single line.
///
/// Timestamp resolution is independent of recognition: an event may carry no
/// timestamp, and a timestamped line may produce no event.
pub fn parse_line(line: &str, reference: NaiveDateTime) -> Option<AuthEvent> {
    let clean = strip_bom(line);
    let found = recognize(clean)?;
    Some(AuthEvent {
        kind: found.kind,
        ip: found.ip.to_string(),
        user: found.user.map(str::to_string),
        timestamp: timestamp::resolve(clean, reference),
        raw: clean.to_string(),
    })
}

/// Extract events from every line, preserving input order.
///
/// Lines that match no recogniser are dropped silently; they are expected
/// noise (headers, other daemons, session messages).
pub fn parse_auth_log<I, S>(lines: I, reference: NaiveDateTime) -> Vec<AuthEvent>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut events = Vec::new();
    let mut lines_processed: u64 = 0;

    for line in lines {
        lines_processed += 1;
        let line = line.as_ref();
        match parse_line(line, reference) {
            Some(event) => events.push(event),
            None => tracing::trace!(
                line = crate::util::logging::preview(line),
                "No recogniser matched"
            ),
        }
    }

    let with_timestamp = events.iter().filter(|e| e.timestamp.is_some()).count();
    tracing::debug!(
        lines = lines_processed,
        events = events.len(),
        with_timestamp,
        "Extraction complete"
    );

    events
}
