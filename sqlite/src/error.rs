//! Error types for the SQLite adapter.
//!
//! Covers database access, mapping failures and values that cannot be
//! represented in SQLite's storage classes.

use thiserror::Error;

/// Errors that can occur while reading or writing mapped entities.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Row conversion, binding or key lookup failure.
    #[error("mapping error: {0}")]
    MapError(#[from] tablemap_core::MapError),

    /// A value has no SQLite representation, or text is not UTF-8.
    #[error("conversion error: {0}")]
    ConversionError(String),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
