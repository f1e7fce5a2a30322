// annotate.rs — Per-course status annotation of the usage tree.
//
// Depth-first walk carrying an inherited-disallow flag:
//
//   disallowed(node) = inherited || explicit(node) == false
//
// Leaves are DISALLOWED or ALLOWED from that flag alone. An internal node
// that is itself disallowed is DISALLOWED whatever its children say (the
// flag is pushed down, so they are all DISALLOWED too). Otherwise an
// internal node is ALLOWED if every child is ALLOWED, DISALLOWED if every
// child is DISALLOWED, and MIXED in every other case.

use aiu_taxonomy::{NodeRef, Taxonomy};
use serde::{Deserialize, Serialize};

use crate::overlay::RuleMap;

/// Computed status of a node for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Allowed,
    Disallowed,
    Mixed,
}

/// A taxonomy node with its computed status, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    pub id: String,
    pub label: String,
    pub status: NodeStatus,
    /// The rule set directly on this node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_rule: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AnnotatedNode>,
}

impl AnnotatedNode {
    /// Find a node anywhere in this subtree.
    pub fn find(&self, node_id: &str) -> Option<&AnnotatedNode> {
        if self.id == node_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(node_id))
    }
}

/// Annotate the whole taxonomy against a rule map.
pub fn annotate(taxonomy: &Taxonomy, rules: &RuleMap) -> Vec<AnnotatedNode> {
    taxonomy
        .root_nodes()
        .into_iter()
        .map(|root| annotate_node(root, rules, false))
        .collect()
}

/// Find a node in an annotated forest.
pub fn find_annotated<'a>(tree: &'a [AnnotatedNode], node_id: &str) -> Option<&'a AnnotatedNode> {
    tree.iter().find_map(|n| n.find(node_id))
}

fn annotate_node(node: NodeRef<'_>, rules: &RuleMap, inherited_disallowed: bool) -> AnnotatedNode {
    let explicit_rule = rules.explicit(node.id());
    let disallowed = inherited_disallowed || explicit_rule == Some(false);

    let children: Vec<AnnotatedNode> = node
        .children()
        .map(|child| annotate_node(child, rules, disallowed))
        .collect();

    let status = if disallowed {
        NodeStatus::Disallowed
    } else if children.is_empty() {
        NodeStatus::Allowed
    } else {
        combine(&children)
    };

    AnnotatedNode {
        id: node.id().to_string(),
        label: node.label().to_string(),
        status,
        explicit_rule,
        children,
    }
}

fn combine(children: &[AnnotatedNode]) -> NodeStatus {
    if children.iter().all(|c| c.status == NodeStatus::Allowed) {
        NodeStatus::Allowed
    } else if children.iter().all(|c| c.status == NodeStatus::Disallowed) {
        NodeStatus::Disallowed
    } else {
        NodeStatus::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiu_taxonomy::catalog::BASELINE_DISALLOWED;

    fn status_of(tree: &[AnnotatedNode], id: &str) -> NodeStatus {
        find_annotated(tree, id)
            .unwrap_or_else(|| panic!("node {} missing", id))
            .status
    }

    fn all_ids(node: &AnnotatedNode, out: &mut Vec<String>) {
        out.push(node.id.clone());
        for child in &node.children {
            all_ids(child, out);
        }
    }

    #[test]
    fn empty_rule_map_allows_everything() {
        let taxonomy = Taxonomy::reference();
        let tree = annotate(&taxonomy, &RuleMap::new());
        for root in &tree {
            let mut ids = Vec::new();
            all_ids(root, &mut ids);
            for id in ids {
                assert_eq!(status_of(&tree, &id), NodeStatus::Allowed);
            }
        }
    }

    #[test]
    fn baseline_makes_parents_mixed() {
        let taxonomy = Taxonomy::reference();
        let tree = annotate(&taxonomy, &RuleMap::disallowing(BASELINE_DISALLOWED));
        assert_eq!(status_of(&tree, "full-solution-generation"), NodeStatus::Disallowed);
        assert_eq!(status_of(&tree, "test-generation"), NodeStatus::Allowed);
        assert_eq!(status_of(&tree, "code-generation"), NodeStatus::Mixed);
        assert_eq!(status_of(&tree, "programming"), NodeStatus::Mixed);
        assert_eq!(status_of(&tree, "research"), NodeStatus::Allowed);
    }

    #[test]
    fn explicit_disallow_propagates_over_child_allows() {
        let taxonomy = Taxonomy::reference();
        let mut rules = RuleMap::new();
        rules.set("programming", false);
        rules.set("debugging-support", true);
        let tree = annotate(&taxonomy, &rules);

        let programming = find_annotated(&tree, "programming").unwrap();
        let mut ids = Vec::new();
        all_ids(programming, &mut ids);
        assert!(ids.len() > 1);
        for id in ids {
            assert_eq!(status_of(&tree, &id), NodeStatus::Disallowed, "{}", id);
        }
        assert_eq!(
            find_annotated(&tree, "debugging-support").unwrap().explicit_rule,
            Some(true)
        );
    }

    #[test]
    fn all_children_disallowed_makes_parent_disallowed() {
        let taxonomy = Taxonomy::reference();
        let rules = RuleMap::disallowing(&["code-explanation", "debugging-support"]);
        let tree = annotate(&taxonomy, &rules);
        assert_eq!(status_of(&tree, "code-understanding"), NodeStatus::Disallowed);
        assert_eq!(
            find_annotated(&tree, "code-understanding").unwrap().explicit_rule,
            None
        );
        assert_eq!(status_of(&tree, "programming"), NodeStatus::Mixed);
    }

    #[test]
    fn mixed_child_makes_parent_mixed() {
        let taxonomy = Taxonomy::reference();
        let rules = RuleMap::disallowing(&["translation"]);
        let tree = annotate(&taxonomy, &rules);
        assert_eq!(status_of(&tree, "text-improvement"), NodeStatus::Mixed);
        assert_eq!(status_of(&tree, "writing"), NodeStatus::Mixed);
    }

    #[test]
    fn annotation_is_idempotent() {
        let taxonomy = Taxonomy::reference();
        let rules = RuleMap::disallowing(BASELINE_DISALLOWED);
        assert_eq!(annotate(&taxonomy, &rules), annotate(&taxonomy, &rules));
    }

    #[test]
    fn status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&NodeStatus::Mixed).unwrap(),
            "\"MIXED\""
        );
    }
}
