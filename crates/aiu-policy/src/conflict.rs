// conflict.rs — Declared intent vs detected actual usage.
//
// A conflict means the system detected something materially riskier than
// what the student declared: both categories resolve to rules, they
// differ, and the actual severity ranks strictly higher. Matching or safer
// actual usage is never a conflict. A direct violation depends only on the
// actual severity (SERIOUS or FORBIDDEN).

use serde::{Deserialize, Serialize};

use crate::rule::{find_rule, PolicyRule, SeverityLevel};

/// Outcome of comparing intent against actual usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResult {
    pub conflict_flag: bool,
    pub direct_violation_flag: bool,
    /// Severity of the actual category; `None` if it did not resolve.
    pub flag_severity: Option<SeverityLevel>,
    /// Actual rule's reference first, then intent's; deduplicated.
    pub rule_references: Vec<String>,
}

/// Compare a declared intent category with the detected actual category.
pub fn detect_conflict(
    intent_category: Option<&str>,
    actual_category: Option<&str>,
    rules: &[PolicyRule],
) -> ConflictResult {
    let intent_rule = intent_category.and_then(|c| find_rule(rules, c));
    let actual_rule = actual_category.and_then(|c| find_rule(rules, c));

    let intent_severity = intent_rule.map(|r| r.severity_level);
    let actual_severity = actual_rule.map(|r| r.severity_level);

    let conflict_flag = match (intent_category, actual_category, intent_severity, actual_severity) {
        (Some(intent), Some(actual), Some(intent_sev), Some(actual_sev)) => {
            intent != actual && actual_sev.rank() > intent_sev.rank()
        }
        _ => false,
    };

    let direct_violation_flag = actual_severity.is_some_and(SeverityLevel::is_direct_violation);

    let mut rule_references: Vec<String> = Vec::new();
    for reference in [actual_rule, intent_rule]
        .into_iter()
        .flatten()
        .filter_map(PolicyRule::reference)
    {
        if !rule_references.iter().any(|r| r == reference) {
            rule_references.push(reference.to_string());
        }
    }

    ConflictResult {
        conflict_flag,
        direct_violation_flag,
        flag_severity: actual_severity,
        rule_references,
    }
}
