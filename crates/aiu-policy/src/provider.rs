// provider.rs — External collaborators the engine reads from.
//
// Two seams:
// - `PolicyRuleProvider` returns the full rule list of a policy version.
//   Failures propagate: an evaluation without rules is meaningless.
// - `CourseRuleStore` returns per-course node overrides. Its answer is an
//   explicit `OverrideLookup` outcome rather than an error, because the
//   overlay must degrade to the baseline when overrides are missing.
//
// In-memory implementations back tests and embedding callers; file-backed
// implementations read the `.aiu/` layout described in `config.rs`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{PolicyError, Result};
use crate::rule::{PolicyRule, PolicyVersion};

/// Source of policy rules, keyed by policy version id.
#[async_trait]
pub trait PolicyRuleProvider: Send + Sync {
    /// The complete, ordered rule set of a version.
    async fn rules(&self, policy_version_id: &str) -> Result<Vec<PolicyRule>>;
}

/// Outcome of asking the course store for a course's overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideLookup {
    /// The course has an override set (possibly empty).
    Found(BTreeMap<String, bool>),
    /// No override set exists for this course, or the store itself is not set up.
    NotProvisioned,
    /// The store exists but could not answer right now.
    Unavailable { reason: String },
}

/// Source of per-course allow/disallow overrides keyed by taxonomy node id.
#[async_trait]
pub trait CourseRuleStore: Send + Sync {
    async fn overrides(&self, course_id: &str) -> OverrideLookup;
}

/// Rules held in memory, one list per version.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleProvider {
    versions: HashMap<String, Vec<PolicyRule>>,
}

impl InMemoryRuleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the rules for a version.
    pub fn with_version(mut self, version_id: &str, rules: Vec<PolicyRule>) -> Self {
        self.versions.insert(version_id.to_string(), rules);
        self
    }
}

#[async_trait]
impl PolicyRuleProvider for InMemoryRuleProvider {
    async fn rules(&self, policy_version_id: &str) -> Result<Vec<PolicyRule>> {
        self.versions
            .get(policy_version_id)
            .cloned()
            .ok_or_else(|| PolicyError::UnknownPolicyVersion {
                version_id: policy_version_id.to_string(),
            })
    }
}

/// Overrides held in memory. Courses without an entry are not provisioned.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCourseRuleStore {
    courses: HashMap<String, BTreeMap<String, bool>>,
}

impl InMemoryCourseRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one override for a course.
    pub fn with_override(mut self, course_id: &str, node_id: &str, is_allowed: bool) -> Self {
        self.courses
            .entry(course_id.to_string())
            .or_default()
            .insert(node_id.to_string(), is_allowed);
        self
    }
}

#[async_trait]
impl CourseRuleStore for InMemoryCourseRuleStore {
    async fn overrides(&self, course_id: &str) -> OverrideLookup {
        match self.courses.get(course_id) {
            Some(map) => OverrideLookup::Found(map.clone()),
            None => OverrideLookup::NotProvisioned,
        }
    }
}

/// Reads `<dir>/<version_id>.yaml` policy version files.
///
/// Published versions are checked against their recorded fingerprint, and
/// duplicate usage categories are rejected.
#[derive(Debug, Clone)]
pub struct FileRuleProvider {
    dir: PathBuf,
}

impl FileRuleProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn version_path(&self, policy_version_id: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", policy_version_id))
    }

    /// Load and validate a full version record.
    pub async fn load_version(&self, policy_version_id: &str) -> Result<PolicyVersion> {
        if !is_safe_key(policy_version_id) {
            return Err(PolicyError::UnknownPolicyVersion {
                version_id: policy_version_id.to_string(),
            });
        }
        let path = self.version_path(policy_version_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PolicyError::UnknownPolicyVersion {
                    version_id: policy_version_id.to_string(),
                })
            }
            Err(source) => return Err(PolicyError::Io { path, source }),
        };
        let version: PolicyVersion =
            serde_yaml::from_str(&content).map_err(|e| PolicyError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if version.version_id != policy_version_id {
            return Err(PolicyError::RuleFetchFailed {
                version_id: policy_version_id.to_string(),
                reason: format!(
                    "{} declares version_id '{}'",
                    path.display(),
                    version.version_id
                ),
            });
        }
        if let Some(category) = version.duplicate_category() {
            return Err(PolicyError::DuplicateCategory {
                version_id: version.version_id.clone(),
                category: category.to_string(),
            });
        }
        // A published version must carry its fingerprint; dropping the line
        // must not switch the check off.
        let expected = match (&version.fingerprint, version.is_published()) {
            (Some(expected), _) => Some(expected.clone()),
            (None, true) => Some(MISSING_FINGERPRINT.to_string()),
            (None, false) => None,
        };
        if let Some(expected) = expected {
            let actual = version.compute_fingerprint();
            if expected != actual {
                return Err(PolicyError::FingerprintMismatch {
                    version_id: version.version_id.clone(),
                    expected,
                    actual,
                });
            }
        }
        Ok(version)
    }
}

#[async_trait]
impl PolicyRuleProvider for FileRuleProvider {
    async fn rules(&self, policy_version_id: &str) -> Result<Vec<PolicyRule>> {
        let version = self.load_version(policy_version_id).await?;
        tracing::debug!(
            version = %version.version_id,
            rules = version.rules.len(),
            published = version.is_published(),
            "loaded policy version"
        );
        Ok(version.rules)
    }
}

/// Reads `<dir>/<course_id>.toml` override files.
///
/// ```toml
/// [overrides]
/// full-solution-generation = true
/// translation = false
/// ```
///
/// A missing directory or file means the course is not provisioned; an
/// unreadable or malformed file makes the store unavailable for that course.
#[derive(Debug, Clone)]
pub struct FileCourseRuleStore {
    dir: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct CourseOverrideFile {
    #[serde(default)]
    overrides: BTreeMap<String, bool>,
}

impl FileCourseRuleStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn course_path(&self, course_id: &str) -> PathBuf {
        self.dir.join(format!("{}.toml", course_id))
    }
}

#[async_trait]
impl CourseRuleStore for FileCourseRuleStore {
    async fn overrides(&self, course_id: &str) -> OverrideLookup {
        if !is_safe_key(course_id) {
            return OverrideLookup::Unavailable {
                reason: format!("invalid course id '{}'", course_id),
            };
        }
        let path = self.course_path(course_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return OverrideLookup::NotProvisioned
            }
            Err(e) => {
                return OverrideLookup::Unavailable {
                    reason: format!("{}: {}", path.display(), e),
                }
            }
        };
        match toml::from_str::<CourseOverrideFile>(&content) {
            Ok(file) => OverrideLookup::Found(file.overrides),
            Err(e) => OverrideLookup::Unavailable {
                reason: format!("{}: {}", path.display(), e),
            },
        }
    }
}

/// Reported as the expected fingerprint of a published version that has none.
const MISSING_FINGERPRINT: &str = "<missing>";

/// Keys become file names; reject anything that could leave the directory.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.contains("..")
        && !key.contains('/')
        && !key.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::SeverityLevel;
    use tempfile::tempdir;

    const V1: &str = r#"
version_id: v1
rules:
  - usage_category: GrammarFix
    severity_level: ALLOWED
    rule_reference: "§2.1"
    keywords: ["grammar"]
  - usage_category: CodeGeneration
    severity_level: MODERATE
    rule_reference: "§3.4"
    keywords: ["generate code"]
"#;

    #[tokio::test]
    async fn in_memory_provider_unknown_version() {
        let provider = InMemoryRuleProvider::new();
        match provider.rules("missing").await {
            Err(PolicyError::UnknownPolicyVersion { version_id }) => {
                assert_eq!(version_id, "missing")
            }
            other => panic!("expected UnknownPolicyVersion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn in_memory_store_distinguishes_unprovisioned() {
        let store = InMemoryCourseRuleStore::new().with_override("cs101", "translation", false);
        match store.overrides("cs101").await {
            OverrideLookup::Found(map) => assert_eq!(map.get("translation"), Some(&false)),
            other => panic!("expected Found, got {:?}", other),
        }
        assert_eq!(store.overrides("hist200").await, OverrideLookup::NotProvisioned);
    }

    #[tokio::test]
    async fn file_provider_reads_rules_in_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("v1.yaml"), V1).unwrap();
        let provider = FileRuleProvider::new(dir.path());

        let rules = provider.rules("v1").await.unwrap();
        let categories: Vec<&str> = rules.iter().map(|r| r.usage_category.as_str()).collect();
        assert_eq!(categories, vec!["GrammarFix", "CodeGeneration"]);
        assert_eq!(rules[1].severity_level, SeverityLevel::Moderate);
    }

    #[tokio::test]
    async fn file_provider_missing_version_is_unknown() {
        let dir = tempdir().unwrap();
        let provider = FileRuleProvider::new(dir.path());
        assert!(matches!(
            provider.rules("v9").await,
            Err(PolicyError::UnknownPolicyVersion { .. })
        ));
        assert!(matches!(
            provider.rules("../v1").await,
            Err(PolicyError::UnknownPolicyVersion { .. })
        ));
    }

    #[tokio::test]
    async fn file_provider_rejects_tampered_published_version() {
        let dir = tempdir().unwrap();
        let mut version: PolicyVersion = serde_yaml::from_str(V1).unwrap();
        version = version.publish(chrono::Utc::now());
        version.rules[0].severity_level = SeverityLevel::Serious;
        std::fs::write(
            dir.path().join("v1.yaml"),
            serde_yaml::to_string(&version).unwrap(),
        )
        .unwrap();

        let provider = FileRuleProvider::new(dir.path());
        match provider.rules("v1").await {
            Err(PolicyError::FingerprintMismatch { version_id, .. }) => {
                assert_eq!(version_id, "v1")
            }
            other => panic!("expected FingerprintMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn file_provider_rejects_published_version_without_fingerprint() {
        let dir = tempdir().unwrap();
        let version = PolicyVersion {
            version_id: "v1".to_string(),
            published_at: None,
            fingerprint: None,
            rules: vec![PolicyRule::new("ExamAnswers", SeverityLevel::Forbidden)],
        };
        let mut version = version.publish(chrono::Utc::now());
        version.fingerprint = None;
        version.rules[0].severity_level = SeverityLevel::Allowed;
        std::fs::write(
            dir.path().join("v1.yaml"),
            serde_yaml::to_string(&version).unwrap(),
        )
        .unwrap();

        match FileRuleProvider::new(dir.path()).load_version("v1").await {
            Err(PolicyError::FingerprintMismatch { expected, .. }) => {
                assert_eq!(expected, "<missing>")
            }
            other => panic!("expected FingerprintMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn file_provider_accepts_draft_without_fingerprint() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("v1.yaml"), V1).unwrap();
        let loaded = FileRuleProvider::new(dir.path())
            .load_version("v1")
            .await
            .unwrap();
        assert!(!loaded.is_published());
        assert_eq!(loaded.fingerprint, None);
    }

    #[tokio::test]
    async fn file_provider_accepts_intact_published_version() {
        let dir = tempdir().unwrap();
        let version: PolicyVersion = serde_yaml::from_str(V1).unwrap();
        let version = version.publish(chrono::Utc::now());
        std::fs::write(
            dir.path().join("v1.yaml"),
            serde_yaml::to_string(&version).unwrap(),
        )
        .unwrap();

        let loaded = FileRuleProvider::new(dir.path())
            .load_version("v1")
            .await
            .unwrap();
        assert!(loaded.is_published());
        assert_eq!(loaded.rules.len(), 2);
    }

    #[tokio::test]
    async fn file_provider_rejects_duplicate_categories() {
        let dir = tempdir().unwrap();
        let yaml = r#"
version_id: v2
rules:
  - usage_category: A
    severity_level: MINOR
  - usage_category: A
    severity_level: SERIOUS
"#;
        std::fs::write(dir.path().join("v2.yaml"), yaml).unwrap();
        assert!(matches!(
            FileRuleProvider::new(dir.path()).rules("v2").await,
            Err(PolicyError::DuplicateCategory { category, .. }) if category == "A"
        ));
    }

    #[tokio::test]
    async fn file_provider_malformed_yaml_is_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "rules: [oops").unwrap();
        assert!(matches!(
            FileRuleProvider::new(dir.path()).rules("bad").await,
            Err(PolicyError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn file_course_store_outcomes() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("cs101.toml"),
            "[overrides]\nfull-solution-generation = true\ntranslation = false\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[overrides\n").unwrap();
        let store = FileCourseRuleStore::new(dir.path());

        match store.overrides("cs101").await {
            OverrideLookup::Found(map) => {
                assert_eq!(map.get("full-solution-generation"), Some(&true));
                assert_eq!(map.get("translation"), Some(&false));
            }
            other => panic!("expected Found, got {:?}", other),
        }
        assert_eq!(store.overrides("nope").await, OverrideLookup::NotProvisioned);
        for key in ["../cs101", "a/b", ""] {
            assert!(
                matches!(store.overrides(key).await, OverrideLookup::Unavailable { .. }),
                "{:?}",
                key
            );
        }
        assert!(matches!(
            store.overrides("broken").await,
            OverrideLookup::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn file_course_store_without_directory_is_unprovisioned() {
        let dir = tempdir().unwrap();
        let store = FileCourseRuleStore::new(dir.path().join("does-not-exist"));
        assert_eq!(store.overrides("cs101").await, OverrideLookup::NotProvisioned);
    }
}
