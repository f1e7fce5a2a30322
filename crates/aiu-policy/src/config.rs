//! Engine configuration structures

use std::path::{Path, PathBuf};

use aiu_taxonomy::catalog::BASELINE_DISALLOWED;
use serde::{Deserialize, Serialize};

use crate::classifier::{TieBreak, KEYWORD_STRATEGY};
use crate::error::{PolicyError, Result};

/// Top-level engine configuration from .aiu/engine.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Content classifier selection
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Course rule overlay configuration
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Content classifier selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Registered strategy name: "keyword"
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Tie-break between equal scores: "usage_category" or "rule_order"
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            tie_break: TieBreak::default(),
        }
    }
}

/// Course rule overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Node ids disallowed for every course unless a course allows them
    #[serde(default = "default_baseline")]
    pub baseline_disallowed: Vec<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            baseline_disallowed: default_baseline(),
        }
    }
}

// Serde default functions
fn default_strategy() -> String {
    KEYWORD_STRATEGY.to_string()
}

fn default_baseline() -> Vec<String> {
    BASELINE_DISALLOWED.iter().map(|s| s.to_string()).collect()
}

impl EngineConfig {
    /// Load engine config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| PolicyError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load config if the file exists, otherwise return defaults.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Where the file-backed collaborators keep their data.
///
/// `for_project()` lays everything out under `.aiu/` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreLayout {
    /// Root directory of the project.
    pub project_root: PathBuf,

    /// One `<version_id>.yaml` file per policy version.
    pub policies_dir: PathBuf,

    /// One `<course_id>.toml` override file per course.
    pub courses_dir: PathBuf,

    /// Optional taxonomy definitions replacing the reference catalog.
    pub taxonomy_file: PathBuf,

    /// Engine configuration.
    pub config_file: PathBuf,
}

impl StoreLayout {
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let aiu_dir = root.join(".aiu");
        Self {
            project_root: root,
            policies_dir: aiu_dir.join("policies"),
            courses_dir: aiu_dir.join("courses"),
            taxonomy_file: aiu_dir.join("taxonomy.yaml"),
            config_file: aiu_dir.join("engine.toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_keyword_and_builtin_baseline() {
        let config = EngineConfig::default();
        assert_eq!(config.classifier.strategy, "keyword");
        assert_eq!(config.classifier.tie_break, TieBreak::UsageCategory);
        assert_eq!(
            config.overlay.baseline_disallowed,
            vec!["full-section-generation", "full-solution-generation"]
        );
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("[classifier]\ntie_break = \"rule_order\"\n").unwrap();
        assert_eq!(config.classifier.strategy, "keyword");
        assert_eq!(config.classifier.tie_break, TieBreak::RuleOrder);
        assert_eq!(config.overlay, OverlayConfig::default());
    }

    #[test]
    fn empty_baseline_is_honoured() {
        let config: EngineConfig = toml::from_str("[overlay]\nbaseline_disallowed = []\n").unwrap();
        assert!(config.overlay.baseline_disallowed.is_empty());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("engine.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[classifier\n").unwrap();
        assert!(matches!(
            EngineConfig::load_or_default(&path),
            Err(PolicyError::Parse { .. })
        ));
    }

    #[test]
    fn layout_lives_under_dot_aiu() {
        let layout = StoreLayout::for_project("/srv/portal");
        assert_eq!(layout.policies_dir, PathBuf::from("/srv/portal/.aiu/policies"));
        assert_eq!(layout.courses_dir, PathBuf::from("/srv/portal/.aiu/courses"));
        assert_eq!(layout.taxonomy_file, PathBuf::from("/srv/portal/.aiu/taxonomy.yaml"));
        assert_eq!(layout.config_file, PathBuf::from("/srv/portal/.aiu/engine.toml"));
    }
}
