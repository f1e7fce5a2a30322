// overlay.rs — Course rule overlay.
//
// A course's effective rule map is the baseline disallow set with the
// course's own overrides merged on top. Explicit course values win over the
// baseline for the same node id.
//
// The course store may be missing or failing. Classification must never
// hard-fail a student submission, so both cases degrade to the baseline map.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::provider::{CourseRuleStore, OverrideLookup};

/// Explicit allow/disallow rules keyed by taxonomy node id.
///
/// Sparse: a node without an entry inherits from its ancestors, and is
/// allowed if no ancestor is disallowed. Cheap to clone, so batch callers
/// can fetch it once per course and reuse it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleMap {
    rules: BTreeMap<String, bool>,
}

impl RuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map that disallows exactly the given node ids.
    pub fn disallowing<S: AsRef<str>>(node_ids: &[S]) -> Self {
        Self {
            rules: node_ids
                .iter()
                .map(|id| (id.as_ref().to_string(), false))
                .collect(),
        }
    }

    /// Set an explicit rule, replacing any existing one for the node.
    pub fn set(&mut self, node_id: &str, is_allowed: bool) {
        self.rules.insert(node_id.to_string(), is_allowed);
    }

    /// Merge `overrides` on top of this map.
    pub fn merge(&mut self, overrides: &BTreeMap<String, bool>) {
        for (node_id, is_allowed) in overrides {
            self.rules.insert(node_id.clone(), *is_allowed);
        }
    }

    /// The explicit rule for a node, if any.
    pub fn explicit(&self, node_id: &str) -> Option<bool> {
        self.rules.get(node_id).copied()
    }

    pub fn is_explicitly_disallowed(&self, node_id: &str) -> bool {
        self.explicit(node_id) == Some(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// How a course's rule map was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySource {
    /// Baseline plus the course's own overrides.
    CourseOverrides,
    /// The course has no overrides; baseline only.
    BaselineOnly,
    /// The store failed; baseline used as a fallback.
    Degraded,
}

/// Builds per-course rule maps from the baseline and a course store.
#[derive(Clone)]
pub struct CourseRuleOverlay {
    baseline: RuleMap,
    store: Arc<dyn CourseRuleStore>,
}

impl CourseRuleOverlay {
    /// `baseline_disallowed` is disallowed for every course unless a course
    /// explicitly allows it.
    pub fn new<S: AsRef<str>>(baseline_disallowed: &[S], store: Arc<dyn CourseRuleStore>) -> Self {
        Self {
            baseline: RuleMap::disallowing(baseline_disallowed),
            store,
        }
    }

    pub fn baseline(&self) -> &RuleMap {
        &self.baseline
    }

    /// The effective rule map for a course. Never fails.
    pub async fn rule_map(&self, course_id: &str) -> RuleMap {
        self.rule_map_with_source(course_id).await.0
    }

    /// Like [`rule_map`](Self::rule_map), also reporting where the map came from.
    pub async fn rule_map_with_source(&self, course_id: &str) -> (RuleMap, OverlaySource) {
        let mut map = self.baseline.clone();
        match self.store.overrides(course_id).await {
            OverrideLookup::Found(overrides) => {
                tracing::debug!(
                    course = course_id,
                    overrides = overrides.len(),
                    "merging course overrides"
                );
                map.merge(&overrides);
                (map, OverlaySource::CourseOverrides)
            }
            OverrideLookup::NotProvisioned => {
                tracing::debug!(course = course_id, "no course overrides, using baseline");
                (map, OverlaySource::BaselineOnly)
            }
            OverrideLookup::Unavailable { reason } => {
                tracing::warn!(
                    course = course_id,
                    %reason,
                    "course rule store unavailable, degrading to baseline"
                );
                (map, OverlaySource::Degraded)
            }
        }
    }
}

impl std::fmt::Debug for CourseRuleOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseRuleOverlay")
            .field("baseline", &self.baseline)
            .finish_non_exhaustive()
    }
}
