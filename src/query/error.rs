//! Parse error types
//!
//! Every parse failure carries a fixed machine code and the offending literal,
//! rendered the way the reporting API renders its own errors:
//! `ParserError.CODE (literal)`.

use thiserror::Error;

/// Machine-readable parse error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SyntaxNear,
    UnknownStatement,
    MissingSource,
    InvalidSource,
    InvalidField,
    InvalidColumn,
    InvalidFunction,
    InvalidDuring,
    InvalidGroupBy,
    InvalidOrderBy,
    InvalidLimit,
    InvalidMethod,
    ColumnsNotMatch,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyntaxNear => "SYNTAX_NEAR",
            Self::UnknownStatement => "UNKNOWN_STATEMENT",
            Self::MissingSource => "MISSING_SOURCE",
            Self::InvalidSource => "INVALID_SOURCE",
            Self::InvalidField => "INVALID_FIELD",
            Self::InvalidColumn => "INVALID_COLUMN",
            Self::InvalidFunction => "INVALID_FUNCTION",
            Self::InvalidDuring => "INVALID_DURING",
            Self::InvalidGroupBy => "INVALID_GROUP_BY",
            Self::InvalidOrderBy => "INVALID_ORDER_BY",
            Self::InvalidLimit => "INVALID_LIMIT",
            Self::InvalidMethod => "INVALID_METHOD",
            Self::ColumnsNotMatch => "COLUMNS_NOT_MATCH",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons attached to an invalid DURING clause
pub const DURING_SIZE: &str = "UNEXPECTED_NUMBER_OF_DATE_RANGE";
pub const DURING_LITERAL_EXPECTED: &str = "EXPECTED_DATE_RANGE_LITERAL";
pub const DURING_NO_LITERAL_EXPECTED: &str = "EXPECTED_NO_LITERAL_DATE";

/// Errors that abort a parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unexpected token or malformed clause
    #[error("ParserError.{code} ({literal})")]
    Syntax { code: ErrorCode, literal: String },

    /// Aggregate function outside of AVG, COUNT, MAX, MIN, SUM
    #[error("ParserError.INVALID_FUNCTION ({0})")]
    UnknownFunction(String),

    /// CREATE VIEW column list does not match the inner select
    #[error("ParserError.COLUMNS_NOT_MATCH ({expected} != {found})")]
    ColumnMismatch { expected: usize, found: usize },

    /// Malformed DURING clause
    #[error("ParserError.INVALID_DURING ({0})")]
    DuringRange(String),
}

impl ParseError {
    pub(crate) fn syntax(code: ErrorCode, literal: impl Into<String>) -> Self {
        Self::Syntax {
            code,
            literal: literal.into(),
        }
    }

    /// The fixed machine code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { code, .. } => *code,
            Self::UnknownFunction(_) => ErrorCode::InvalidFunction,
            Self::ColumnMismatch { .. } => ErrorCode::ColumnsNotMatch,
            Self::DuringRange(_) => ErrorCode::InvalidDuring,
        }
    }

    /// The offending literal
    pub fn literal(&self) -> String {
        match self {
            Self::Syntax { literal, .. } => literal.clone(),
            Self::UnknownFunction(name) => name.clone(),
            Self::ColumnMismatch { found, .. } => found.to_string(),
            Self::DuringRange(reason) => reason.clone(),
        }
    }
}

/// Result type for parse operations
pub type ParseResult<T> = Result<T, ParseError>;
