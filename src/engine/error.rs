//! Query execution error types

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::query::ParseError;
use crate::remote::FetchError;

/// Errors that abort the execution of a statement
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The statement asks for data outside of what the view exposes
    #[error("QueryError.OUT_OF_SCOPE ({0})")]
    OutOfScope(String),

    /// A view carries an aggregate method the engine does not know
    #[error("QueryError.UNKNOWN_METHOD ({0})")]
    UnknownAggregateMethod(String),

    /// A raw report value does not match the column type
    #[error("QueryError.INVALID_VALUE ({value} as {kind})")]
    Cast { value: String, kind: String },

    /// A report row has fewer values than requested columns
    #[error("QueryError.MALFORMED_ROW ({found} < {expected})")]
    MalformedRow { expected: usize, found: usize },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Only one statement can be executed at a time
    #[error("QueryError.MULTIPLE_STATEMENTS ({0})")]
    MultipleStatements(usize),
}

impl QueryError {
    pub(crate) fn out_of_scope(what: impl Into<String>) -> Self {
        QueryError::OutOfScope(what.into())
    }

    pub(crate) fn cast(value: &str, kind: &str) -> Self {
        QueryError::Cast {
            value: value.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Result type for query execution
pub type QueryResult<T> = Result<T, QueryError>;
