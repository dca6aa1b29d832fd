//! Error types for mapping operations.
//!
//! Covers usage errors (wrong entity type, missing or ambiguous keys),
//! value coercion failures, collaborator failures and configuration I/O.

use thiserror::Error;

use crate::value::ValueError;

/// Errors that can occur while building, using or configuring maps.
#[derive(Debug, Error)]
pub enum MapError {
    /// An entity of the wrong type was passed to a type-erased map.
    #[error("entity is of the wrong type for the map of {expected}")]
    EntityTypeMismatch { expected: &'static str },

    /// A key-dependent operation was used on a map without key fields.
    #[error("no key field is mapped for table {table}")]
    MissingKey { table: String },

    /// A single-key operation was used on a map with a composite key.
    #[error("table {table} has a composite key ({}); a single key is required", keys.join(", "))]
    CompositeKey { table: String, keys: Vec<String> },

    /// A raw value could not be coerced into a member.
    #[error("cannot convert value for member {member}: {source}")]
    Value {
        member: String,
        #[source]
        source: ValueError,
    },

    /// A row source or command sink reported a failure.
    #[error("row source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// File I/O failure while loading or saving settings.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl MapError {
    /// Wraps a collaborator error.
    pub fn from_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MapError::Source(Box::new(err))
    }
}

/// Convenience alias for results with [`MapError`].
pub type Result<T> = std::result::Result<T, MapError>;
