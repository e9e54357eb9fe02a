//! Catalog error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by catalog lookups and view creation
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No table or view with this name
    #[error("DatabaseError.UNKNOWN_TABLE ({0})")]
    UnknownTable(String),

    /// The table has no such column
    #[error("DatabaseError.UNKNOWN_COLUMN ({column} in {table})")]
    UnknownColumn { table: String, column: String },

    /// CREATE VIEW over an existing report, or over a view without OR REPLACE
    #[error("DatabaseError.TABLE_EXISTS ({0})")]
    TableExists(String),

    /// Explicit view columns do not match the select list
    #[error("DatabaseError.COLUMNS_NOT_MATCH ({expected} != {found})")]
    ColumnMismatch { expected: usize, found: usize },

    /// The catalog holds no table at all
    #[error("DatabaseError.NO_TABLE")]
    NoTable,

    /// Catalog file could not be read or written
    #[error("Catalog file error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    /// Catalog document is malformed
    #[error("Catalog format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
