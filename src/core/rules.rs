// ThreatLog - core/rules.rs
//
// Detection rule parsing, validation, and evaluation.
// Core layer: accepts rule file content as strings, never touches the
// filesystem. I/O is handled by app::rule_mgr which feeds content here.

use crate::core::model::{Rule, RuleHit};
use crate::util::constants;
use crate::util::error::RuleError;
use rayon::prelude::*;
use regex::RegexBuilder;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

// =============================================================================
// Deserialisation structures (raw input)
// =============================================================================

/// Raw rule record as read from a rule file. Every field is optional;
/// missing fields take the documented defaults at compile time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDefinition {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub regex: Option<String>,
    /// Accepted spelling of `regex`. `regex` wins when both are present.
    #[serde(default, deserialize_with = "scalar_string")]
    pub pattern: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub severity: Option<String>,
}

/// TOML rule files hold an array of `[[rule]]` tables.
#[derive(Debug, Default, Deserialize)]
struct TomlRuleFile {
    #[serde(default, alias = "rules")]
    rule: Vec<RuleDefinition>,
}

/// Scalars of any YAML/TOML type, coerced to their string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| match s {
        Scalar::Str(s) => s,
        Scalar::Int(i) => i.to_string(),
        // Debug keeps the fractional part: `1.0` stays "1.0".
        Scalar::Float(f) => format!("{f:?}"),
        Scalar::Bool(b) => b.to_string(),
    }))
}

/// Supported rule file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Yaml,
    Toml,
}

impl RuleFormat {
    /// Pick the format from a file extension (`.yaml`/`.yml` or `.toml`).
    pub fn from_path(path: &Path) -> Result<Self, RuleError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(RuleFormat::Yaml),
            Some("toml") => Ok(RuleFormat::Toml),
            _ => Err(RuleError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

// =============================================================================
// Parsing and compilation
// =============================================================================

/// Parse rule file content into raw definitions.
///
/// `source_path` is used for error messages only. Empty content yields no
/// rules.
pub fn parse_rule_definitions(
    content: &str,
    format: RuleFormat,
    source_path: &Path,
) -> Result<Vec<RuleDefinition>, RuleError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    match format {
        RuleFormat::Yaml => serde_yaml::from_str::<Option<Vec<RuleDefinition>>>(content)
            .map(Option::unwrap_or_default)
            .map_err(|e| RuleError::YamlParse {
                path: source_path.to_path_buf(),
                source: e,
            }),
        RuleFormat::Toml => toml::from_str::<TomlRuleFile>(content)
            .map(|file| file.rule)
            .map_err(|e| RuleError::TomlParse {
                path: source_path.to_path_buf(),
                source: e,
            }),
    }
}

/// Apply defaults, validate, and compile one definition.
pub fn validate_and_compile(def: RuleDefinition) -> Result<Rule, RuleError> {
    let id = def
        .id
        .unwrap_or_else(|| constants::DEFAULT_RULE_ID.to_string());
    let pattern = def
        .regex
        .or(def.pattern)
        .unwrap_or_else(|| constants::DEFAULT_RULE_PATTERN.to_string());

    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(RuleError::RegexTooLong {
            rule_id: id,
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    let compiled = RegexBuilder::new(&pattern)
        .size_limit(constants::REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| RuleError::InvalidRegex {
            rule_id: id.clone(),
            pattern: pattern.clone(),
            source: e,
        })?;

    Ok(Rule {
        id,
        description: def.description.unwrap_or_default(),
        severity: def
            .severity
            .unwrap_or_else(|| constants::DEFAULT_RULE_SEVERITY.to_string()),
        pattern: compiled,
    })
}

/// Compile a whole rule set. The first invalid rule aborts the set.
pub fn compile_rules(defs: Vec<RuleDefinition>) -> Result<Vec<Rule>, RuleError> {
    if defs.len() > constants::MAX_RULES {
        return Err(RuleError::TooManyRules {
            count: defs.len(),
            max: constants::MAX_RULES,
        });
    }
    defs.into_iter().map(validate_and_compile).collect()
}

/// Parse and compile rule file content in one step.
pub fn load_rules_str(
    content: &str,
    format: RuleFormat,
    source_path: &Path,
) -> Result<Vec<Rule>, RuleError> {
    let rules = compile_rules(parse_rule_definitions(content, format, source_path)?)?;
    tracing::debug!(
        source = %source_path.display(),
        count = rules.len(),
        "Rules compiled"
    );
    Ok(rules)
}

// =============================================================================
// Built-in rules (embedded at compile time)
// =============================================================================

/// Embedded YAML for the default rule set.
pub fn builtin_rules_source() -> &'static str {
    include_str!("../../rules/default.yaml")
}

/// Load and compile the built-in rule set.
pub fn load_builtin_rules() -> Result<Vec<Rule>, RuleError> {
    let path = PathBuf::from("<builtin>/default.yaml");
    load_rules_str(builtin_rules_source(), RuleFormat::Yaml, &path)
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluate one rule over the corpus. `None` when nothing matched.
///
/// Counting continues past the example cap.
pub fn evaluate_rule<S: AsRef<str>>(
    rule: &Rule,
    lines: &[S],
    max_examples: usize,
) -> Option<RuleHit> {
    let mut count = 0;
    let mut examples = Vec::with_capacity(max_examples.min(lines.len()));

    for line in lines {
        let line = line.as_ref();
        if rule.pattern.is_match(line) {
            count += 1;
            if examples.len() < max_examples {
                examples.push(line.to_string());
            }
        }
    }

    if count == 0 {
        return None;
    }

    Some(RuleHit {
        id: rule.id.clone(),
        description: rule.description.clone(),
        severity: rule.severity.clone(),
        count,
        examples,
    })
}

/// Evaluate every rule against every line.
///
/// Rules run in parallel; the result keeps rule-declaration order and omits
/// rules with no match.
pub fn apply_rules<S>(lines: &[S], rules: &[Rule], max_examples: usize) -> Vec<RuleHit>
where
    S: AsRef<str> + Sync,
{
    let per_rule: Vec<Option<RuleHit>> = rules
        .par_iter()
        .map(|rule| evaluate_rule(rule, lines, max_examples))
        .collect();

    let hits: Vec<RuleHit> = per_rule.into_iter().flatten().collect();

    tracing::debug!(
        rules = rules.len(),
        hits = hits.len(),
        lines = lines.len(),
        "Rule evaluation complete"
    );

    hits
}

// =============================================================================
// Tests
// =============================================================================
