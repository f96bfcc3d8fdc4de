//! Error types for the Warden core crate.

use thiserror::Error;

/// Failures raised while resolving a directory object.
///
/// `NotFound` is kept apart from the other kinds because callers may treat an
/// unknown identity differently from a broken or ambiguous lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("invalid directory attribute for identity matching: {0}")]
    InvalidMatchAttribute(String),

    #[error("invalid directory object category: {0}")]
    InvalidObjectCategory(String),

    #[error("no {category} object found where {attribute} equals \"{identity}\" under \"{search_root}\"")]
    NotFound {
        category: String,
        attribute: String,
        identity: String,
        search_root: String,
    },

    #[error("{count} {category} objects found where {attribute} equals \"{identity}\", expected exactly one")]
    Ambiguous {
        category: String,
        attribute: String,
        identity: String,
        count: usize,
    },

    #[error("directory query with filter \"{filter}\" under \"{search_root}\" failed: {detail}")]
    QueryFailed {
        filter: String,
        search_root: String,
        detail: String,
    },

    #[error("nested group memberships of \"{distinguished_name}\" could not be resolved")]
    NestedGroupsUnavailable { distinguished_name: String },
}

impl DirectoryError {
    /// Whether this is a configuration problem rather than a lookup outcome.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidMatchAttribute(_) | Self::InvalidObjectCategory(_)
        )
    }
}

/// Top-level error type for all Warden operations.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("unknown token \"{token}\" in namespace \"{namespace}\"")]
    UnknownToken { namespace: String, token: String },

    #[error("unsupported certificate field \"{0}\"")]
    InvalidRuleField(String),

    #[error("invalid {kind} subject alternative name \"{value}\"")]
    InvalidAlternativeName { kind: String, value: String },

    #[error("invalid custom certificate extension with OID \"{oid}\" and value \"{value}\"")]
    InvalidCustomExtension { oid: String, value: String },

    #[error("extension encoding error: {0}")]
    Encoding(String),
}

/// A convenience Result alias that defaults to [`WardenError`].
pub type Result<T> = std::result::Result<T, WardenError>;
