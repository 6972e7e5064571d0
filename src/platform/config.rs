// ThreatLog - platform/config.rs
//
// Platform config directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ThreatLog configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/threatlog/ or %APPDATA%\ThreatLog\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so an older binary accepts a newer file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub analysis: AnalysisSection,
    pub rules: RulesSection,
    pub logging: LoggingSection,
}

/// `[analysis]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Rows per top-N table.
    pub top_n: Option<i64>,
    /// Example lines kept per rule hit.
    pub max_examples: Option<i64>,
    /// Default time window, e.g. "24h".
    pub since: Option<String>,
}

/// `[rules]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Rule file used when `--rules` is not given.
    pub path: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated configuration derived from `config.toml`.
///
/// Invalid values produce warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub top_n: usize,
    pub max_examples: usize,
    /// Unvalidated window expression; parsed by the caller before the log is read.
    pub since: Option<String>,
    pub rules_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            top_n: constants::DEFAULT_TOP_N,
            max_examples: constants::DEFAULT_MAX_EXAMPLES,
            since: None,
            rules_path: None,
            log_level: None,
        }
    }
}

/// Load `config.toml` from the platform location.
///
/// A missing file yields defaults with no warnings. An unreadable or
/// unparseable file yields defaults plus a warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(config_path) {
        Ok(result) => result,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load a config file the user named explicitly. Unlike `load_config`, a
/// missing or malformed file is an error.
pub fn load_config_file(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let (config, warnings) = validate(raw);
    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }
    Ok((config, warnings))
}

/// Validate each field against named constants, accumulating every problem.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    let out_of_range = |field: &str, value: String, expected: String, default: usize| {
        let err = ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value,
            expected,
        };
        format!("{err}. Using default ({default}).")
    };

    if let Some(top_n) = raw.analysis.top_n {
        match usize::try_from(top_n) {
            Ok(n) if (constants::MIN_TOP_N..=constants::MAX_TOP_N).contains(&n) => {
                config.top_n = n
            }
            _ => warnings.push(out_of_range(
                "analysis.top_n",
                top_n.to_string(),
                format!("{}-{}", constants::MIN_TOP_N, constants::MAX_TOP_N),
                constants::DEFAULT_TOP_N,
            )),
        }
    }

    if let Some(max_examples) = raw.analysis.max_examples {
        match usize::try_from(max_examples) {
            Ok(n) if n <= constants::MAX_EXAMPLES_LIMIT => config.max_examples = n,
            _ => warnings.push(out_of_range(
                "analysis.max_examples",
                max_examples.to_string(),
                format!("0-{}", constants::MAX_EXAMPLES_LIMIT),
                constants::DEFAULT_MAX_EXAMPLES,
            )),
        }
    }

    if let Some(since) = raw.analysis.since {
        if !since.trim().is_empty() {
            config.since = Some(since);
        }
    }

    if let Some(path) = raw.rules.path {
        if !path.is_empty() {
            config.rules_path = Some(PathBuf::from(path));
        }
    }

    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL
            ));
        }
    }

    (config, warnings)
}
