// tree.rs — Course-keyed tree commands: tree, check.

use serde::Serialize;

use aiu_policy::ComplianceEngine;

use super::print_json;

/// Result of `aiu check`.
#[derive(Debug, Serialize)]
pub struct SelectionReport {
    pub course_id: String,
    /// Selected ids disallowed for the course.
    pub disallowed: Vec<String>,
    /// Selected categories hiding a disallowed activity.
    pub warning_parents: Vec<String>,
    /// Selected ids the taxonomy does not know (treated as allowed).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown: Vec<String>,
}

pub async fn tree(engine: &ComplianceEngine, course_id: &str) -> anyhow::Result<()> {
    print_json(&engine.annotate_tree(course_id).await)
}

pub async fn check(
    engine: &ComplianceEngine,
    course_id: &str,
    node_ids: &[String],
) -> anyhow::Result<()> {
    let report = selection_report(engine, course_id, node_ids).await;
    if !report.unknown.is_empty() {
        tracing::warn!(unknown = ?report.unknown, "selection contains unknown node ids");
    }
    print_json(&report)
}

/// Build the report from one rule-map fetch.
pub async fn selection_report(
    engine: &ComplianceEngine,
    course_id: &str,
    node_ids: &[String],
) -> SelectionReport {
    let rules = engine.rule_map(course_id).await;
    SelectionReport {
        course_id: course_id.to_string(),
        disallowed: engine.disallowed_selections_with(node_ids, &rules),
        warning_parents: engine.warning_parent_selections_with(node_ids, &rules),
        unknown: engine.taxonomy().unknown_ids(node_ids),
    }
}
