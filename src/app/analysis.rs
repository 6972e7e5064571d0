// ThreatLog - app/analysis.rs
//
// One analysis run: read the log, extract events, apply the time window,
// evaluate rules over every line and aggregate the report.
//
// The time window only narrows the event stream. Rules always see the full
// line corpus.

use crate::core::filter::SinceFilter;
use crate::core::model::{AuthEvent, Report, Rule};
use crate::core::{parser, report, rules, timestamp};
use crate::platform;
use crate::util::constants;
use crate::util::error::ThreatLogError;
use chrono::{Duration, NaiveDateTime};
use std::path::Path;
use std::time::Instant;

/// Tunables for a single run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Rows per top-N table.
    pub top_n: usize,
    /// Example lines kept per rule hit.
    pub max_examples: usize,
    /// Only events at or after `now - since` are kept.
    pub since: Option<Duration>,
    /// Reference instant for timestamp resolution and the time window.
    pub now: NaiveDateTime,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_n: constants::DEFAULT_TOP_N,
            max_examples: constants::DEFAULT_MAX_EXAMPLES,
            since: None,
            now: timestamp::local_now(),
        }
    }
}

/// Output of a run: the surviving events (for CSV/JSONL export) and the
/// aggregated report.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub events: Vec<AuthEvent>,
    pub report: Report,
}

/// Analyse already-split lines.
pub fn analyze_lines<S>(lines: &[S], rule_set: &[Rule], options: &AnalysisOptions) -> Analysis
where
    S: AsRef<str> + Sync,
{
    let started = Instant::now();

    let mut events = parser::parse_auth_log(lines, options.now);

    if let Some(window) = options.since {
        events = SinceFilter::new(options.now, window).apply(events);
    }

    let rule_hits = rules::apply_rules(lines, rule_set, options.max_examples);
    let report = report::summarize(&events, options.top_n, rule_hits);

    tracing::info!(
        lines = lines.len(),
        events = events.len(),
        rules = rule_set.len(),
        rule_hits = report.rule_hits.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Analysis complete"
    );

    Analysis { events, report }
}

/// Read `path` and analyse its contents.
pub fn analyze_file(
    path: &Path,
    rule_set: &[Rule],
    options: &AnalysisOptions,
) -> Result<Analysis, ThreatLogError> {
    let content = platform::fs::read_log_lossy(path).map_err(|e| ThreatLogError::Io {
        path: path.to_path_buf(),
        operation: "read log file",
        source: e,
    })?;

    let lines = split_lines(&content);
    Ok(analyze_lines(&lines, rule_set, options))
}

/// Split on `\n`, `\r\n` and a lone `\r`. A trailing terminator does not
/// produce an empty final line.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = content;
    while let Some(pos) = rest.find(|c: char| c == '\n' || c == '\r') {
        lines.push(&rest[..pos]);
        let width = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[pos + width..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}
