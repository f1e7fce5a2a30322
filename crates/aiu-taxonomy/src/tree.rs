// tree.rs — Arena-backed usage taxonomy.
//
// Definitions come in as nested `TaxonomyNode` records (the shape used in
// YAML files and the built-in catalog). They are flattened once into an
// arena of slots: each slot knows its parent and its ordered children, and
// an id → slot index answers lookups. Nothing is mutated after `assemble`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::TaxonomyError;

/// A node definition: the nested, serializable form of the taxonomy.
///
/// ```yaml
/// - id: writing
///   label: Writing
///   children:
///     - id: text-correction
///       label: Text correction
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonomyNode {
    /// Stable key, unique across the whole tree.
    pub id: String,
    /// Display text.
    pub label: String,
    /// Ordered children; empty means this node is a leaf.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    /// Leaf definition.
    pub fn leaf(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            children: Vec::new(),
        }
    }

    /// Internal node definition with the given children.
    pub fn branch(id: &str, label: &str, children: Vec<TaxonomyNode>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            children,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: String,
    label: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// The immutable usage tree.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

/// A borrowed view of one node in a [`Taxonomy`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    taxonomy: &'a Taxonomy,
    slot: usize,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a str {
        &self.taxonomy.slots[self.slot].id
    }

    pub fn label(&self) -> &'a str {
        &self.taxonomy.slots[self.slot].label
    }

    pub fn is_leaf(&self) -> bool {
        self.taxonomy.slots[self.slot].children.is_empty()
    }

    /// Ordered children of this node.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let taxonomy = self.taxonomy;
        taxonomy.slots[self.slot]
            .children
            .iter()
            .map(move |&slot| NodeRef { taxonomy, slot })
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.taxonomy.slots[self.slot]
            .parent
            .map(|slot| NodeRef {
                taxonomy: self.taxonomy,
                slot,
            })
    }
}

impl Taxonomy {
    /// The built-in reference taxonomy.
    pub fn reference() -> Self {
        let (taxonomy, duplicates) = Self::assemble(catalog::reference_nodes());
        debug_assert!(
            duplicates.is_empty(),
            "reference catalog has duplicate ids: {:?}",
            duplicates
        );
        taxonomy
    }

    /// Build a taxonomy from node definitions, rejecting empty or duplicate ids.
    pub fn from_nodes(roots: Vec<TaxonomyNode>) -> Result<Self, TaxonomyError> {
        if let Some(label) = first_empty_id(&roots) {
            return Err(TaxonomyError::EmptyId { label });
        }
        let (taxonomy, duplicates) = Self::assemble(roots);
        match duplicates.into_iter().next() {
            Some(id) => Err(TaxonomyError::DuplicateId { id }),
            None => Ok(taxonomy),
        }
    }

    /// Parse YAML node definitions (a top-level list of root nodes).
    pub fn from_yaml_str(content: &str) -> Result<Self, TaxonomyError> {
        let roots: Vec<TaxonomyNode> =
            serde_yaml::from_str(content).map_err(|e| TaxonomyError::Parse {
                path: None,
                reason: e.to_string(),
            })?;
        Self::from_nodes(roots)
    }

    /// Load YAML node definitions from a file.
    pub fn from_file(path: &Path) -> Result<Self, TaxonomyError> {
        let content = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roots: Vec<TaxonomyNode> =
            serde_yaml::from_str(&content).map_err(|e| TaxonomyError::Parse {
                path: Some(path.to_path_buf()),
                reason: e.to_string(),
            })?;
        Self::from_nodes(roots)
    }

    /// Load from `path` if it exists, otherwise fall back to the reference taxonomy.
    pub fn load_or_reference(path: &Path) -> Result<Self, TaxonomyError> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading taxonomy definitions");
            Self::from_file(path)
        } else {
            Ok(Self::reference())
        }
    }

    /// Flatten definitions into the arena. Returns the ids that were seen more
    /// than once; later duplicates are not indexed.
    fn assemble(roots: Vec<TaxonomyNode>) -> (Self, Vec<String>) {
        let mut taxonomy = Taxonomy {
            slots: Vec::new(),
            roots: Vec::with_capacity(roots.len()),
            index: HashMap::new(),
        };
        let mut duplicates = Vec::new();
        for root in roots {
            let slot = taxonomy.push(root, None, &mut duplicates);
            taxonomy.roots.push(slot);
        }
        (taxonomy, duplicates)
    }

    fn push(
        &mut self,
        node: TaxonomyNode,
        parent: Option<usize>,
        duplicates: &mut Vec<String>,
    ) -> usize {
        let slot = self.slots.len();
        if self.index.contains_key(&node.id) {
            duplicates.push(node.id.clone());
        } else {
            self.index.insert(node.id.clone(), slot);
        }
        self.slots.push(Slot {
            id: node.id,
            label: node.label,
            parent,
            children: Vec::with_capacity(node.children.len()),
        });
        for child in node.children {
            let child_slot = self.push(child, Some(slot), duplicates);
            self.slots[slot].children.push(child_slot);
        }
        slot
    }

    /// Top-level sections in declaration order.
    pub fn root_nodes(&self) -> Vec<NodeRef<'_>> {
        self.roots
            .iter()
            .map(|&slot| NodeRef {
                taxonomy: self,
                slot,
            })
            .collect()
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<NodeRef<'_>> {
        self.index.get(node_id).map(|&slot| NodeRef {
            taxonomy: self,
            slot,
        })
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    /// True only for known nodes without children.
    pub fn is_leaf(&self, node_id: &str) -> bool {
        self.node(node_id).is_some_and(|n| n.is_leaf())
    }

    /// Ids from the root down to `node_id` (inclusive); empty if unknown.
    pub fn path_to(&self, node_id: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut cursor = self.index.get(node_id).copied();
        while let Some(slot) = cursor {
            path.push(self.slots[slot].id.clone());
            cursor = self.slots[slot].parent;
        }
        path.reverse();
        path
    }

    /// Labels from the root down to `node_id`, for breadcrumb display.
    pub fn label_path(&self, node_id: &str) -> Vec<String> {
        self.path_to(node_id)
            .iter()
            .filter_map(|id| self.node(id).map(|n| n.label().to_string()))
            .collect()
    }

    /// Leaf ids under `node_id` in tree order; the node itself if it is a leaf,
    /// empty if unknown.
    pub fn descendant_leaves(&self, node_id: &str) -> Vec<String> {
        let mut leaves = Vec::new();
        if let Some(&slot) = self.index.get(node_id) {
            self.collect_leaves(slot, &mut leaves);
        }
        leaves
    }

    fn collect_leaves(&self, slot: usize, out: &mut Vec<String>) {
        let entry = &self.slots[slot];
        if entry.children.is_empty() {
            out.push(entry.id.clone());
            return;
        }
        for &child in &entry.children {
            self.collect_leaves(child, out);
        }
    }

    /// All leaf ids in the tree, in tree order.
    pub fn leaves(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        for &root in &self.roots {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    /// Ids from `node_ids` that do not exist in the tree, in input order.
    pub fn unknown_ids<S: AsRef<str>>(&self, node_ids: &[S]) -> Vec<String> {
        node_ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| !self.contains(id))
            .map(str::to_string)
            .collect()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rebuild the nested definition form (e.g. for writing a taxonomy file).
    pub fn to_definitions(&self) -> Vec<TaxonomyNode> {
        self.root_nodes().into_iter().map(to_definition).collect()
    }
}

fn to_definition(node: NodeRef<'_>) -> TaxonomyNode {
    TaxonomyNode {
        id: node.id().to_string(),
        label: node.label().to_string(),
        children: node.children().map(to_definition).collect(),
    }
}

fn first_empty_id(nodes: &[TaxonomyNode]) -> Option<String> {
    nodes.iter().find_map(|node| {
        if node.id.trim().is_empty() {
            Some(node.label.clone())
        } else {
            first_empty_id(&node.children)
        }
    })
}
