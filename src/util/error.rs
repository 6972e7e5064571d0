// ThreatLog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ThreatLog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ThreatLogError {
    /// Rule loading or validation failed.
    Rules(RuleError),

    /// Time-window filter expression was rejected.
    Filter(FilterError),

    /// Rendering or writing an output failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for ThreatLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules(e) => write!(f, "Rule error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ThreatLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rules(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule errors
// ---------------------------------------------------------------------------

/// Errors related to rule loading and validation.
///
/// Any of these aborts loading of the whole rule set: a partially loaded set
/// would silently under-report.
#[derive(Debug)]
pub enum RuleError {
    /// YAML rule file could not be parsed.
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// TOML rule file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A rule's pattern is not a valid regular expression.
    InvalidRegex {
        rule_id: String,
        pattern: String,
        source: regex::Error,
    },

    /// A rule's pattern exceeds the maximum allowed length.
    RegexTooLong {
        rule_id: String,
        length: usize,
        max_length: usize,
    },

    /// Rule file exceeds the maximum allowed size.
    FileTooLarge { path: PathBuf, size: u64, max_size: u64 },

    /// Rule set holds more rules than allowed.
    TooManyRules { count: usize, max: usize },

    /// An explicitly requested rule file does not exist.
    NotFound { path: PathBuf },

    /// Rule file extension is not one of the supported formats.
    UnsupportedFormat { path: PathBuf },

    /// I/O error reading a rule file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YamlParse { path, source } => {
                write!(f, "Failed to parse YAML '{}': {source}", path.display())
            }
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::InvalidRegex {
                rule_id,
                pattern,
                source,
            } => write!(f, "Rule '{rule_id}': invalid regex '{pattern}': {source}"),
            Self::RegexTooLong {
                rule_id,
                length,
                max_length,
            } => write!(
                f,
                "Rule '{rule_id}': regex is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Rules file '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::TooManyRules { count, max } => {
                write!(f, "Too many rules ({count}), maximum is {max}")
            }
            Self::NotFound { path } => {
                write!(f, "Rules file not found: {}", path.display())
            }
            Self::UnsupportedFormat { path } => write!(
                f,
                "Rules file '{}' has an unsupported extension (expected .yaml, .yml or .toml)",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "I/O error reading rules '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::YamlParse { source, .. } => Some(source),
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RuleError> for ThreatLogError {
    fn from(e: RuleError) -> Self {
        Self::Rules(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to the time-window filter expression.
#[derive(Debug)]
pub enum FilterError {
    /// The expression is not `<digits>[unit]`.
    InvalidDuration { input: String },

    /// The unit suffix is not one of s, m, h, d, w.
    InvalidUnit { input: String, unit: String },

    /// The amount does not fit in a duration.
    DurationOverflow { input: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDuration { input } => write!(
                f,
                "Invalid duration format '{input}'. Use like 30m, 24h, 7d."
            ),
            Self::InvalidUnit { input, unit } => write!(
                f,
                "Invalid duration unit '{unit}' in '{input}'. Use s, m, h, d, w."
            ),
            Self::DurationOverflow { input } => {
                write!(f, "Duration '{input}' is too large")
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl From<FilterError> for ThreatLogError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to rendering and writing outputs.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for ThreatLogError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ThreatLogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ThreatLog results.
pub type Result<T> = std::result::Result<T, ThreatLogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_rule_error_display_names_rule_and_pattern() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = RuleError::InvalidRegex {
            rule_id: "SSH-1".to_string(),
            pattern: "(unclosed".to_string(),
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("SSH-1"));
        assert!(msg.contains("(unclosed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_top_level_wraps_rule_error() {
        let err: ThreatLogError = RuleError::NotFound {
            path: PathBuf::from("missing.yaml"),
        }
        .into();
        assert!(matches!(err, ThreatLogError::Rules(_)));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_filter_error_display_gives_usage_hint() {
        let err = FilterError::InvalidUnit {
            input: "5y".to_string(),
            unit: "y".to_string(),
        };
        assert!(err.to_string().contains("s, m, h, d, w"));
    }

    #[test]
    fn test_config_out_of_range_display() {
        let err = ConfigError::ValueOutOfRange {
            field: "analysis.top_n".to_string(),
            value: "0".to_string(),
            expected: "1-1000".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("analysis.top_n"));
        assert!(msg.contains("1-1000"));
    }
}
