// ThreatLog - core/export.rs
//
// Report renderers (text, HTML, JSON) and event exports (CSV, JSON lines).
// Core layer: renders to strings or writes to any Write trait object.

use crate::core::model::{format_timestamp, AuthEvent, CountRow, Report};
use crate::util::constants;
use crate::util::error::ExportError;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

// =============================================================================
// Text
// =============================================================================

/// Render the plain-text report printed to stdout.
pub fn to_text(report: &Report) -> String {
    let mut out = String::new();
    let mut line = |s: &str| {
        out.push_str(s);
        out.push('\n');
    };

    line(constants::REPORT_TITLE);
    line(&"=".repeat(25));
    line(&format!("Total events: {}", report.total_events));
    if let Some(range) = &report.time_range {
        line(&format!(
            "Time range: {} -> {}",
            format_timestamp(range.first),
            format_timestamp(range.last)
        ));
    }
    line("");

    line("Counts:");
    if report.counts.is_empty() {
        line("  (none)");
    }
    for (kind, count) in report.counts.iter() {
        line(&format!("  - {kind}: {count}"));
    }
    line("");

    for (title, rows) in [
        ("Top failed IPs", &report.top_failed_ips),
        ("Top failed users", &report.top_failed_users),
        ("Top success IPs", &report.top_success_ips),
    ] {
        line(&format!("{title}:"));
        if rows.is_empty() {
            line("  (none)");
        }
        for (key, count) in rows {
            line(&format!("  - {key}: {count}"));
        }
        line("");
    }

    line("Suspicious (simple scoring):");
    if report.suspicious.is_empty() {
        line("  (none)");
    }
    for row in &report.suspicious {
        line(&format!(
            "  - {}: fails={} score={}/{}",
            row.ip,
            row.fail_count,
            row.score,
            constants::MAX_SUSPICION_SCORE
        ));
    }
    line("");

    line("Rule hits:");
    if report.rule_hits.is_empty() {
        line("  (none)");
    }
    for hit in &report.rule_hits {
        line(&format!("  - {}: {} ({})", hit.id, hit.count, hit.description));
    }

    out
}

// =============================================================================
// HTML
// =============================================================================

const HTML_STYLE: &str = r#":root {
  --bg: #0f172a;
  --panel: #111827;
  --ink: #e5e7eb;
  --muted: #94a3b8;
  --accent: #22d3ee;
  --accent2: #a3e635;
  --danger: #f97316;
}
* { box-sizing: border-box; }
body { margin: 0; font-family: "IBM Plex Mono", ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; background: radial-gradient(1200px 600px at 10% 0%, #0b1d2c, var(--bg)); color: var(--ink); }
.container { max-width: 960px; margin: 40px auto; padding: 24px; }
.header { display: flex; justify-content: space-between; align-items: baseline; gap: 16px; }
.h1 { font-size: 28px; letter-spacing: 0.5px; }
.meta { color: var(--muted); margin-top: 6px; }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 16px; margin-top: 16px; }
.card { background: linear-gradient(180deg, #0b1220, var(--panel)); border: 1px solid #1f2937; padding: 16px; border-radius: 12px; box-shadow: 0 10px 30px rgba(0,0,0,0.25); }
.card h3 { margin: 0 0 8px; font-size: 14px; text-transform: uppercase; letter-spacing: 1px; color: var(--muted); }
.list { padding-left: 18px; margin: 0; }
.list li { margin: 6px 0; }
.score { color: var(--danger); }
.badge { display: inline-block; padding: 2px 8px; border-radius: 999px; background: #0b2b36; color: var(--accent2); font-size: 12px; }"#;

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_list(items: impl IntoIterator<Item = String>) -> String {
    let body: String = items.into_iter().collect();
    if body.is_empty() {
        "<li>(none)</li>".to_string()
    } else {
        body
    }
}

fn html_count_rows(rows: &[CountRow]) -> String {
    html_list(
        rows.iter()
            .map(|(key, count)| format!("<li><code>{}</code>: {count}</li>", escape_html(key))),
    )
}

/// Render the standalone HTML report.
pub fn to_html(report: &Report) -> String {
    let title = escape_html(constants::REPORT_TITLE);

    let time_range = report
        .time_range
        .as_ref()
        .map(|r| {
            format!(
                "<div class=\"meta\">Time range: {} \u{2192} {}</div>",
                format_timestamp(r.first),
                format_timestamp(r.last)
            )
        })
        .unwrap_or_default();

    let counts = html_list(
        report
            .counts
            .iter()
            .map(|(kind, count)| format!("<li><code>{kind}</code>: {count}</li>")),
    );

    let suspicious = html_list(report.suspicious.iter().map(|r| {
        format!(
            "<li><code>{}</code>: fails={} score=<span class=\"score\">{}</span></li>",
            escape_html(&r.ip),
            r.fail_count,
            r.score
        )
    }));

    let rule_hits = html_list(report.rule_hits.iter().map(|h| {
        format!(
            "<li><code>{}</code> <span class=\"badge\">{}</span>: {}<br><small>{}</small></li>",
            escape_html(&h.id),
            escape_html(&h.severity),
            h.count,
            escape_html(&h.description)
        )
    }));

    let mut cards = String::new();
    for (heading, items) in [
        ("Counts", counts),
        ("Top Failed IPs", html_count_rows(&report.top_failed_ips)),
        ("Top Failed Users", html_count_rows(&report.top_failed_users)),
        ("Top Success IPs", html_count_rows(&report.top_success_ips)),
        ("Suspicious (score)", suspicious),
        ("Rule Hits", rule_hits),
    ] {
        // Writing to a String cannot fail.
        let _ = write!(
            cards,
            "      <div class=\"card\">\n        <h3>{heading}</h3>\n        <ul class=\"list\">{items}</ul>\n      </div>\n"
        );
    }

    format!(
        "<!doctype html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\" />
<title>{title}</title>
<style>
{HTML_STYLE}
</style>
</head>
<body>
  <div class=\"container\">
    <div class=\"header\">
      <div>
        <div class=\"h1\">{title}</div>
        {time_range}
      </div>
      <div class=\"badge\">Total events: {total}</div>
    </div>

    <div class=\"grid\">
{cards}    </div>
  </div>
</body>
</html>",
        total = report.total_events,
    )
}

// =============================================================================
// JSON
// =============================================================================

/// Write the report as pretty-printed JSON.
pub fn export_report_json<W: Write>(
    report: &Report,
    writer: W,
    export_path: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })
}

// =============================================================================
// Event exports
// =============================================================================

/// Export events to CSV with header `kind,ip,user,ts,raw`.
///
/// Absent user or timestamp is written as an empty cell.
pub fn export_csv<W: Write>(
    events: &[AuthEvent],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["kind", "ip", "user", "ts", "raw"])
        .map_err(csv_err)?;

    for event in events {
        let ts = event.timestamp_text().unwrap_or_default();
        csv_writer
            .write_record([
                event.kind.as_str(),
                &event.ip,
                event.user.as_deref().unwrap_or(""),
                &ts,
                &event.raw,
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(events.len())
}

/// Export events as JSON lines, one object per event.
///
/// Records are newline-separated with no newline after the last one.
pub fn export_jsonl<W: Write>(
    events: &[AuthEvent],
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let io_err = |e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    };

    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            writer.write_all(b"\n").map_err(io_err)?;
        }
        serde_json::to_writer(&mut writer, event).map_err(|e| ExportError::Json {
            path: export_path.to_path_buf(),
            source: e,
        })?;
    }
    writer.flush().map_err(io_err)?;

    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{EventKind, KindCounts, RuleHit, SuspicionEntry, TimeRange};
    use chrono::NaiveDate;

    fn make_event(kind: EventKind, user: Option<&str>, with_ts: bool) -> AuthEvent {
        AuthEvent {
            kind,
            ip: "1.2.3.4".to_string(),
            user: user.map(str::to_string),
            timestamp: with_ts.then(|| {
                NaiveDate::from_ymd_opt(2026, 2, 6)
                    .unwrap()
                    .and_hms_opt(8, 11, 1)
                    .unwrap()
            }),
            raw: "Feb  6 08:11:01 h sshd[1]: Failed password for root".to_string(),
        }
    }

    fn empty_report() -> Report {
        Report {
            total_events: 0,
            counts: KindCounts::default(),
            top_failed_ips: vec![],
            top_failed_users: vec![],
            top_success_ips: vec![],
            suspicious: vec![],
            time_range: None,
            rule_hits: vec![],
        }
    }

    fn sample_report() -> Report {
        let ts = NaiveDate::from_ymd_opt(2026, 2, 6)
            .unwrap()
            .and_hms_opt(8, 11, 1)
            .unwrap();
        Report {
            total_events: 2,
            counts: KindCounts(vec![(EventKind::FailedPassword, 2)]),
            top_failed_ips: vec![("1.2.3.4".to_string(), 2)],
            top_failed_users: vec![("root".to_string(), 2)],
            top_success_ips: vec![],
            suspicious: vec![SuspicionEntry {
                ip: "1.2.3.4".to_string(),
                fail_count: 2,
                score: 10,
            }],
            time_range: Some(TimeRange {
                first: ts,
                last: ts,
            }),
            rule_hits: vec![RuleHit {
                id: "SSH-FAILED".to_string(),
                description: "Failed <password>".to_string(),
                severity: "medium".to_string(),
                count: 2,
                examples: vec![],
            }],
        }
    }

    #[test]
    fn test_text_report_sections() {
        let text = to_text(&sample_report());
        assert!(text.starts_with("Threat Log Analyzer Report\n=========================\n"));
        assert!(text.contains("Total events: 2"));
        assert!(text.contains("Time range: 2026-02-06 08:11:01 -> 2026-02-06 08:11:01"));
        assert!(text.contains("  - failed_password: 2"));
        assert!(text.contains("Top failed IPs:\n  - 1.2.3.4: 2"));
        assert!(text.contains("Top success IPs:\n  (none)"));
        assert!(text.contains("  - 1.2.3.4: fails=2 score=10/100"));
        assert!(text.contains("  - SSH-FAILED: 2 (Failed <password>)"));
    }

    #[test]
    fn test_text_report_empty() {
        let text = to_text(&empty_report());
        assert!(text.contains("Total events: 0"));
        assert!(!text.contains("Time range"));
        assert!(text.contains("Rule hits:\n  (none)"));
    }

    #[test]
    fn test_html_escapes_values() {
        let html = to_html(&sample_report());
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("Failed &lt;password&gt;"));
        assert!(!html.contains("Failed <password>"));
        assert!(html.contains("<code>1.2.3.4</code>: 2"));
        assert!(html.contains("Total events: 2"));
    }

    #[test]
    fn test_html_empty_sections() {
        let html = to_html(&empty_report());
        assert_eq!(html.matches("<li>(none)</li>").count(), 6);
        assert!(!html.contains("Time range"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_report_json_export() {
        let mut buf = Vec::new();
        export_report_json(&sample_report(), &mut buf, Path::new("out.json")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["total_events"], 2);
        assert_eq!(value["counts"]["failed_password"], 2);
        assert_eq!(value["top_failed_ips"][0][0], "1.2.3.4");
        assert_eq!(value["time_range"]["first"], "2026-02-06 08:11:01");
        assert_eq!(value["rule_hits"][0]["severity"], "medium");
    }

    #[test]
    fn test_csv_export() {
        let events = vec![
            make_event(EventKind::FailedPassword, Some("root"), true),
            make_event(EventKind::InvalidUser, None, false),
        ];
        let mut buf = Vec::new();
        let count = export_csv(&events, &mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "kind,ip,user,ts,raw");
        assert!(lines[1].starts_with("failed_password,1.2.3.4,root,2026-02-06 08:11:01,"));
        assert!(lines[2].starts_with("invalid_user,1.2.3.4,,,"));
    }

    #[test]
    fn test_csv_export_header_only_when_empty() {
        let mut buf = Vec::new();
        export_csv(&[], &mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "kind,ip,user,ts,raw\n");
    }

    #[test]
    fn test_jsonl_export() {
        let events = vec![
            make_event(EventKind::FailedPassword, Some("root"), true),
            make_event(EventKind::AcceptedPassword, None, false),
        ];
        let mut buf = Vec::new();
        let count = export_jsonl(&events, &mut buf, Path::new("out.jsonl")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        assert!(!output.ends_with('\n'));
        let records: Vec<serde_json::Value> = output
            .split('\n')
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["user"], "root");
        assert_eq!(records[0]["ts"], "2026-02-06 08:11:01");
        assert!(records[1]["user"].is_null());
        assert!(records[1]["ts"].is_null());
        assert_eq!(records[1]["kind"], "accepted_password");
    }

    #[test]
    fn test_jsonl_export_empty() {
        let mut buf = Vec::new();
        export_jsonl(&[], &mut buf, Path::new("out.jsonl")).unwrap();
        assert!(buf.is_empty());
    }
}
