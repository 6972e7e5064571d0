// ThreatLog - core/filter.rs
//
// Time-window filter for extracted events ("--since 24h").
// Core layer: pure logic, the reference instant is supplied by the caller.

use crate::core::model::AuthEvent;
use crate::util::error::FilterError;
use chrono::{Duration, NaiveDateTime};

/// Parse a window expression such as `30m`, `24h`, `7d`.
///
/// Input is trimmed and lower-cased. Bare digits are hours. Supported units:
/// `s`, `m`, `h`, `d`, `w`.
pub fn parse_duration(input: &str) -> Result<Duration, FilterError> {
    let value = input.trim().to_lowercase();

    let digits_end = value
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(value.len(), |(idx, _)| idx);
    let (number, unit) = value.split_at(digits_end);

    if number.is_empty() {
        return Err(FilterError::InvalidDuration {
            input: input.to_string(),
        });
    }

    let amount: i64 = number.parse().map_err(|_| FilterError::DurationOverflow {
        input: input.to_string(),
    })?;

    let seconds_per_unit: i64 = match unit {
        "" | "h" => 3_600,
        "s" => 1,
        "m" => 60,
        "d" => 86_400,
        "w" => 604_800,
        _ => {
            return Err(FilterError::InvalidUnit {
                input: input.to_string(),
                unit: unit.to_string(),
            })
        }
    };

    amount
        .checked_mul(seconds_per_unit)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| FilterError::DurationOverflow {
            input: input.to_string(),
        })
}

/// Events at or after a cutoff instant. Events with no timestamp always pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinceFilter {
    /// `None` when the window reaches back past the representable range,
    /// in which case everything passes.
    cutoff: Option<NaiveDateTime>,
}

impl SinceFilter {
    pub fn new(now: NaiveDateTime, window: Duration) -> Self {
        Self {
            cutoff: now.checked_sub_signed(window),
        }
    }

    pub fn matches(&self, event: &AuthEvent) -> bool {
        match (self.cutoff, event.timestamp) {
            (Some(cutoff), Some(ts)) => ts >= cutoff,
            _ => true,
        }
    }

    /// Keep matching events, preserving order.
    pub fn apply(&self, events: Vec<AuthEvent>) -> Vec<AuthEvent> {
        let before = events.len();
        let kept: Vec<AuthEvent> = events.into_iter().filter(|e| self.matches(e)).collect();
        tracing::debug!(
            cutoff = ?self.cutoff,
            before,
            after = kept.len(),
            "Time window applied"
        );
        kept
    }
}
