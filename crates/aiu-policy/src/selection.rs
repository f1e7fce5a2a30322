// selection.rs — Checks over a flat list of selected taxonomy nodes.
//
// Works straight from the rule map and ancestor paths; no annotated tree is
// built. A node is disallowed when any id on its root→node path carries an
// explicit `false`. Unknown ids have an empty path and therefore count as
// allowed; validating ids is the caller's job.

use std::collections::HashSet;

use aiu_taxonomy::Taxonomy;

use crate::overlay::RuleMap;

/// Whether a node is disallowed once inheritance is applied.
pub fn is_effectively_disallowed(taxonomy: &Taxonomy, node_id: &str, rules: &RuleMap) -> bool {
    taxonomy
        .path_to(node_id)
        .iter()
        .any(|ancestor| rules.is_explicitly_disallowed(ancestor))
}

/// Selected ids that are disallowed, in selection order without duplicates.
pub fn disallowed_selections<S: AsRef<str>>(
    taxonomy: &Taxonomy,
    node_ids: &[S],
    rules: &RuleMap,
) -> Vec<String> {
    select_unique(node_ids, |id| is_effectively_disallowed(taxonomy, id, rules))
}

/// Selected non-leaf ids with at least one disallowed descendant leaf.
///
/// Leaves are never warning parents; they can only be disallowed outright.
pub fn warning_parent_selections<S: AsRef<str>>(
    taxonomy: &Taxonomy,
    node_ids: &[S],
    rules: &RuleMap,
) -> Vec<String> {
    select_unique(node_ids, |id| {
        taxonomy.contains(id)
            && !taxonomy.is_leaf(id)
            && taxonomy
                .descendant_leaves(id)
                .iter()
                .any(|leaf| is_effectively_disallowed(taxonomy, leaf, rules))
    })
}

fn select_unique<S, F>(node_ids: &[S], mut keep: F) -> Vec<String>
where
    S: AsRef<str>,
    F: FnMut(&str) -> bool,
{
    let mut seen = HashSet::new();
    node_ids
        .iter()
        .map(|id| id.as_ref())
        .filter(|id| seen.insert(*id))
        .filter(|id| keep(*id))
        .map(str::to_string)
        .collect()
}
