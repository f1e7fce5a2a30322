// rule.rs — Policy rules, severity ordering, and policy versions.
//
// A policy version is an immutable snapshot of the rule set in force. Each
// rule maps a usage category to a severity and a set of keywords used by
// the content classifier.
//
// Severity is a total order: ALLOWED < MINOR < MODERATE < SERIOUS < FORBIDDEN.
// The enum derives `Ord` in declaration order, and `rank()` exposes the same
// ordering as an integer for callers building their own comparisons.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Ordinal risk ranking of a usage category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Allowed,
    Minor,
    Moderate,
    Serious,
    Forbidden,
}

impl SeverityLevel {
    /// Every level, least severe first.
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Allowed,
        SeverityLevel::Minor,
        SeverityLevel::Moderate,
        SeverityLevel::Serious,
        SeverityLevel::Forbidden,
    ];

    /// Integer rank, 0 (ALLOWED) through 4 (FORBIDDEN).
    pub fn rank(self) -> u8 {
        match self {
            SeverityLevel::Allowed => 0,
            SeverityLevel::Minor => 1,
            SeverityLevel::Moderate => 2,
            SeverityLevel::Serious => 3,
            SeverityLevel::Forbidden => 4,
        }
    }

    /// Whether this level is at least as severe as `other`.
    pub fn is_at_least(self, other: SeverityLevel) -> bool {
        self.rank() >= other.rank()
    }

    /// SERIOUS and FORBIDDEN are violations on their own, whatever the student declared.
    pub fn is_direct_violation(self) -> bool {
        matches!(self, SeverityLevel::Serious | SeverityLevel::Forbidden)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Allowed => "ALLOWED",
            SeverityLevel::Minor => "MINOR",
            SeverityLevel::Moderate => "MODERATE",
            SeverityLevel::Serious => "SERIOUS",
            SeverityLevel::Forbidden => "FORBIDDEN",
        }
    }
}

/// Free-function form of [`SeverityLevel::rank`].
pub fn severity_rank(level: SeverityLevel) -> u8 {
    level.rank()
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        SeverityLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| format!("unknown severity level '{}'", s))
    }
}

/// One rule of a policy version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRule {
    /// Category name, unique within the version (e.g. "GrammarFix").
    pub usage_category: String,
    pub severity_level: SeverityLevel,
    /// Citation into the written policy (e.g. "§4.2").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_reference: Option<String>,
    /// Phrases that signal this category in free text.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PolicyRule {
    pub fn new(usage_category: &str, severity_level: SeverityLevel) -> Self {
        Self {
            usage_category: usage_category.to_string(),
            severity_level,
            rule_reference: None,
            keywords: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.rule_reference = Some(reference.to_string());
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    /// The reference, if present and non-blank.
    pub fn reference(&self) -> Option<&str> {
        self.rule_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Find the rule for a usage category (exact match).
pub fn find_rule<'a>(rules: &'a [PolicyRule], category: &str) -> Option<&'a PolicyRule> {
    rules.iter().find(|r| r.usage_category == category)
}

/// A versioned snapshot of the rule set.
///
/// Stored as YAML, one file per version:
/// ```yaml
/// version_id: "2026-spring"
/// published_at: "2026-01-12T09:00:00Z"
/// fingerprint: "9f2c…"
/// rules:
///   - usage_category: GrammarFix
///     severity_level: ALLOWED
///     rule_reference: "§2.1"
///     keywords: ["grammar", "spelling"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyVersion {
    pub version_id: String,

    /// Publication time; `None` while the version is still a draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// SHA-256 of the rules recorded at publication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl PolicyVersion {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Lowercase hex SHA-256 over the canonical JSON encoding of the rules.
    pub fn compute_fingerprint(&self) -> String {
        fingerprint_rules(&self.rules)
    }

    /// The first usage category that appears more than once, if any.
    pub fn duplicate_category(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.rules
            .iter()
            .map(|r| r.usage_category.as_str())
            .find(|category| !seen.insert(*category))
    }

    /// Freeze the version: stamp the publication time and fingerprint.
    pub fn publish(mut self, at: DateTime<Utc>) -> Self {
        self.fingerprint = Some(self.compute_fingerprint());
        self.published_at = Some(at);
        self
    }
}

/// Hash a rule list. Field order is fixed by the struct definition, so
/// equal rule lists always serialize identically.
pub fn fingerprint_rules(rules: &[PolicyRule]) -> String {
    // Only strings and unit enum variants: serialization cannot fail.
    let json = serde_json::to_string(rules).expect("policy rules serialize to JSON");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}
