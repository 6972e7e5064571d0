// ThreatLog - core/report.rs
//
// Aggregation of extracted events and rule hits into a `Report`.
// Core layer: pure logic over in-memory data.

use crate::core::model::{
    AuthEvent, CountRow, EventKind, KindCounts, Report, RuleHit, SuspicionEntry, TimeRange,
};
use crate::util::constants;
use std::collections::HashMap;

// =============================================================================
// Insertion-ordered frequency counter
// =============================================================================

/// Counts keys while remembering first-seen order, so that equal counts are
/// ranked deterministically by which key appeared first.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    rows: Vec<CountRow>,
    index: HashMap<String, usize>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `key`, inserting it at the end if new.
    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&pos) => self.rows[pos].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.rows.len());
                self.rows.push((key.to_string(), 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Up to `n` rows, highest count first, ties in first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<CountRow> {
        let mut rows = self.rows.clone();
        // `sort_by` is stable: equal counts keep insertion order.
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.truncate(n);
        rows
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Suspicion score for an IP with `fail_count` failures:
/// `min(100, fail_count * 5)`.
pub fn suspicion_score(fail_count: usize) -> u32 {
    let raw = (fail_count as u64).saturating_mul(constants::SUSPICION_POINTS_PER_FAILURE as u64);
    raw.min(constants::MAX_SUSPICION_SCORE as u64) as u32
}

// =============================================================================
// Summary
// =============================================================================

/// Build the report for `events` plus already-computed `rule_hits`.
///
/// `top_n` bounds every frequency table and the suspicion list.
pub fn summarize(events: &[AuthEvent], top_n: usize, rule_hits: Vec<RuleHit>) -> Report {
    let mut kind_order: Vec<(EventKind, usize)> = Vec::new();
    let mut failed_ips = FrequencyCounter::new();
    let mut failed_users = FrequencyCounter::new();
    let mut success_ips = FrequencyCounter::new();
    let mut time_range: Option<TimeRange> = None;

    for event in events {
        match kind_order.iter_mut().find(|(k, _)| *k == event.kind) {
            Some((_, count)) => *count += 1,
            None => kind_order.push((event.kind, 1)),
        }

        if event.kind.is_failure() {
            failed_ips.add(&event.ip);
            failed_users.add(event.user.as_deref().unwrap_or(constants::UNKNOWN_USER));
        } else if event.kind == EventKind::AcceptedPassword {
            success_ips.add(&event.ip);
        }

        if let Some(ts) = event.timestamp {
            time_range = Some(match time_range {
                Some(r) => TimeRange {
                    first: r.first.min(ts),
                    last: r.last.max(ts),
                },
                None => TimeRange {
                    first: ts,
                    last: ts,
                },
            });
        }
    }

    let top_failed_ips = failed_ips.most_common(top_n);
    let suspicious = top_failed_ips
        .iter()
        .map(|(ip, count)| SuspicionEntry {
            ip: ip.clone(),
            fail_count: *count,
            score: suspicion_score(*count),
        })
        .collect();

    let report = Report {
        total_events: events.len(),
        counts: KindCounts(kind_order),
        top_failed_ips,
        top_failed_users: failed_users.most_common(top_n),
        top_success_ips: success_ips.most_common(top_n),
        suspicious,
        time_range,
        rule_hits,
    };

    tracing::debug!(
        total_events = report.total_events,
        distinct_failed_ips = failed_ips.len(),
        distinct_success_ips = success_ips.len(),
        rule_hits = report.rule_hits.len(),
        "Report summarised"
    );

    report
}
