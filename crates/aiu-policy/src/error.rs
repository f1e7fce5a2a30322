// error.rs — Error types for the policy engine.

use std::path::PathBuf;

use aiu_taxonomy::TaxonomyError;
use thiserror::Error;

/// Errors that can occur during policy operations.
///
/// Course-store problems are deliberately absent: the overlay degrades to
/// the baseline instead of failing (see `OverrideLookup`).
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The rule provider has no version with this id.
    #[error("unknown policy version '{version_id}'")]
    UnknownPolicyVersion { version_id: String },

    /// The rule provider could not return the rules for a version.
    #[error("failed to fetch rules for policy version '{version_id}': {reason}")]
    RuleFetchFailed { version_id: String, reason: String },

    /// Two rules in one version share a usage category.
    #[error("policy version '{version_id}' defines usage category '{category}' more than once")]
    DuplicateCategory { version_id: String, category: String },

    /// A published version's rules no longer hash to its recorded fingerprint.
    #[error("policy version '{version_id}' was modified after publication: expected fingerprint {expected}, got {actual}")]
    FingerprintMismatch {
        version_id: String,
        expected: String,
        actual: String,
    },

    /// Configuration names a classifier strategy that is not registered.
    #[error("unknown classifier strategy '{name}' (available: {available})")]
    UnknownStrategy { name: String, available: String },

    /// Failed to read a policy or configuration file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A policy or configuration file is malformed.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The taxonomy could not be loaded.
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
