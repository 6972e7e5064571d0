// ThreatLog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ThreatLog";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ThreatLog";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Report title used by the text and HTML renderers.
pub const REPORT_TITLE: &str = "Threat Log Analyzer Report";

// =============================================================================
// Report defaults
// =============================================================================

/// Default number of rows kept in each top-N table.
pub const DEFAULT_TOP_N: usize = 10;

/// Smallest accepted top-N value. Zero yields empty tables.
pub const MIN_TOP_N: usize = 0;

/// Largest accepted top-N value (prevents configuration mistakes).
pub const MAX_TOP_N: usize = 1_000;

/// Placeholder used in the failed-user table when an event carries no user.
pub const UNKNOWN_USER: &str = "UNKNOWN";

/// Points added to the suspicion score per failed attempt.
pub const SUSPICION_POINTS_PER_FAILURE: u32 = 5;

/// Upper clamp for the suspicion score.
pub const MAX_SUSPICION_SCORE: u32 = 100;

/// Display format for resolved timestamps in reports and exports.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Rule limits
// =============================================================================

/// Default number of example lines retained per rule hit.
pub const DEFAULT_MAX_EXAMPLES: usize = 3;

/// Largest accepted `max_examples` value.
pub const MAX_EXAMPLES_LIMIT: usize = 100;

/// Maximum number of rules in a single rule set.
pub const MAX_RULES: usize = 1_000;

/// Maximum size of a rule file in bytes.
pub const MAX_RULE_FILE_SIZE: u64 = 1024 * 1024; // 1 MB

/// Maximum regex pattern length accepted in a rule.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

/// Compiled-program size cap handed to `RegexBuilder::size_limit`.
pub const REGEX_SIZE_LIMIT: usize = 1024 * 1024; // 1 MB

/// Rule id used when a rule record has none.
pub const DEFAULT_RULE_ID: &str = "RULE";

/// Severity used when a rule record has none.
pub const DEFAULT_RULE_SEVERITY: &str = "low";

/// Pattern used when a rule record has none (matches every line).
pub const DEFAULT_RULE_PATTERN: &str = ".*";

/// Relative path probed for a project-local rule file.
pub const LOCAL_RULES_PATH: &str = "rules/default.yaml";

// =============================================================================
// Input limits
// =============================================================================

/// Log files above this size are memory-mapped instead of read into a buffer.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

// =============================================================================
// Logging
// =============================================================================

/// Default log level. Kept at `warn` so stdout reports stay readable.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
