// ThreatLog - app/rule_mgr.rs
//
// Resolves which rule set a run uses and loads it. Three sources are tried
// in order: an explicitly named file, the project-local rules/default.yaml,
// and the rule set embedded in the binary.

use crate::core::model::Rule;
use crate::core::rules::{self, RuleFormat};
use crate::util::constants;
use crate::util::error::RuleError;
use std::path::{Path, PathBuf};

/// Where the active rule set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// Named on the command line or in config.toml. Must exist.
    Explicit(PathBuf),
    /// `rules/default.yaml` relative to the working directory.
    Local(PathBuf),
    /// Compiled into the binary.
    Builtin,
}

impl RuleSource {
    /// Pick the rule source for this run.
    ///
    /// `local_root` is the directory probed for `rules/default.yaml`
    /// (normally the current working directory).
    pub fn resolve(explicit: Option<&Path>, local_root: &Path) -> Result<Self, RuleError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(RuleError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Ok(RuleSource::Explicit(path.to_path_buf()));
        }

        let local = local_root.join(constants::LOCAL_RULES_PATH);
        if local.is_file() {
            return Ok(RuleSource::Local(local));
        }

        tracing::debug!(probed = %local.display(), "No local rule file; using built-in rules");
        Ok(RuleSource::Builtin)
    }

    pub fn describe(&self) -> String {
        match self {
            RuleSource::Explicit(p) | RuleSource::Local(p) => p.display().to_string(),
            RuleSource::Builtin => "built-in".to_string(),
        }
    }
}

/// Load and compile the rules from `source`.
///
/// A source with no content yields zero rules. Any invalid rule aborts the
/// whole load.
pub fn load_rules(source: &RuleSource) -> Result<Vec<Rule>, RuleError> {
    let rules = match source {
        RuleSource::Explicit(path) | RuleSource::Local(path) => load_rule_file(path)?,
        RuleSource::Builtin => rules::load_builtin_rules()?,
    };

    tracing::info!(
        source = %source.describe(),
        count = rules.len(),
        "Rules loaded"
    );
    Ok(rules)
}

/// Read, size-check and compile a rule file from disk.
fn load_rule_file(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let format = RuleFormat::from_path(path)?;

    let metadata = std::fs::metadata(path).map_err(|e| RuleError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if metadata.len() > constants::MAX_RULE_FILE_SIZE {
        return Err(RuleError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_RULE_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| RuleError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    rules::load_rules_str(&content, format, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = RuleSource::resolve(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, RuleError::NotFound { .. }));
    }

    #[test]
    fn test_explicit_beats_local() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rules")).unwrap();
        std::fs::write(dir.path().join("rules/default.yaml"), "").unwrap();
        let explicit = dir.path().join("mine.yaml");
        std::fs::write(&explicit, "").unwrap();

        let source = RuleSource::resolve(Some(&explicit), dir.path()).unwrap();
        assert_eq!(source, RuleSource::Explicit(explicit));
    }

    #[test]
    fn test_local_then_builtin() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            RuleSource::resolve(None, dir.path()).unwrap(),
            RuleSource::Builtin
        );

        std::fs::create_dir_all(dir.path().join("rules")).unwrap();
        let local = dir.path().join("rules/default.yaml");
        std::fs::write(&local, "- id: L1\n  regex: x\n").unwrap();
        let source = RuleSource::resolve(None, dir.path()).unwrap();
        assert_eq!(source, RuleSource::Local(local));
        assert_eq!(load_rules(&source).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_file_yields_zero_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yml");
        std::fs::write(&path, "").unwrap();
        assert!(load_rules(&RuleSource::Explicit(path)).unwrap().is_empty());
    }

    #[test]
    fn test_toml_rule_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "[[rule]]\nid = \"T1\"\nregex = \"sshd\"\nseverity = \"high\"\n",
        )
        .unwrap();
        let rules = load_rules(&RuleSource::Explicit(path)).unwrap();
        assert_eq!(rules[0].id, "T1");
        assert_eq!(rules[0].severity, "high");
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.yaml");
        let filler = "#".repeat(constants::MAX_RULE_FILE_SIZE as usize + 1);
        std::fs::write(&path, filler).unwrap();
        assert!(matches!(
            load_rules(&RuleSource::Explicit(path)),
            Err(RuleError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            load_rules(&RuleSource::Explicit(path)),
            Err(RuleError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_builtin_rules_load() {
        assert!(!load_rules(&RuleSource::Builtin).unwrap().is_empty());
    }
}
