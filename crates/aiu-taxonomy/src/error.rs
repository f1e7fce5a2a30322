// error.rs — Error types for taxonomy construction.
//
// Lookups never fail; only building a taxonomy from untrusted definitions can.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or loading a taxonomy.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// Two nodes share the same id.
    #[error("duplicate taxonomy node id '{id}'")]
    DuplicateId { id: String },

    /// A node has an empty (or whitespace-only) id.
    #[error("taxonomy node labelled '{label}' has an empty id")]
    EmptyId { label: String },

    /// The definition file could not be read.
    #[error("failed to read taxonomy file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The definition file is not valid YAML for a node list.
    #[error("failed to parse taxonomy definitions{}: {reason}", path_suffix(.path))]
    Parse {
        path: Option<PathBuf>,
        reason: String,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" at {}", p.display()),
        None => String::new(),
    }
}
