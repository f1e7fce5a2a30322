//! # aiu-taxonomy
//!
//! The usage tree: a fixed hierarchy of AI-usage activities such as
//! "Writing → Text improvement → Text correction".
//!
//! A [`Taxonomy`] is built once at startup (from the built-in
//! [`Taxonomy::reference`] catalog or a YAML definition file) and shared
//! read-only by everything downstream. Lookups are plain tree walks over an
//! arena of nodes.
//!
//! ## Key invariants
//!
//! - **Unique ids**: node ids are non-empty and unique across the whole tree.
//! - **Immutable**: there is no way to mutate a taxonomy after construction.
//! - **Unknown ids never fail**: lookups on an id that is not in the tree
//!   return empty paths / `false` instead of an error.

pub mod catalog;
pub mod error;
pub mod tree;

pub use error::TaxonomyError;
pub use tree::{NodeRef, Taxonomy, TaxonomyNode};
