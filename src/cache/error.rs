//! Report cache error types

use thiserror::Error;

/// Errors raised by the report cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// Nothing usable stored for the key
    #[error("CacheError.CACHE_MISS")]
    Miss,

    /// The write-back queue is full or closed
    #[error("CacheError.NOT_STORED ({0})")]
    NotStored(String),

    #[error("CacheError.INVALID_KEY")]
    InvalidKey,

    #[error("CacheError.IO ({0})")]
    Io(#[from] std::io::Error),

    #[error("CacheError.CSV ({0})")]
    Csv(#[from] csv::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
