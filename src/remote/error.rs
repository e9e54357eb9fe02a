//! Report download error types

use thiserror::Error;

/// Errors raised while downloading a report
#[derive(Error, Debug)]
pub enum FetchError {
    /// The service rejected the query
    #[error("{}", api_message(.kind, .trigger, .field))]
    Api {
        kind: String,
        trigger: String,
        field: Option<String>,
    },

    /// The service answered with an unexpected HTTP status
    #[error("ConnectionError.SERVICE_UNAVAILABLE ({0})")]
    ServiceUnavailable(u16),

    /// Transport failure
    #[error("ConnectionError.NETWORK ({0})")]
    Network(String),

    #[error("ConnectionError.TIMEOUT")]
    Timeout,

    /// The report body is not valid CSV
    #[error("ConnectionError.INVALID_REPORT ({0})")]
    Csv(#[from] csv::Error),

    /// Account id, developer token or access token not configured
    #[error("ConnectionError.MISSING_CREDENTIALS ({0})")]
    MissingCredentials(&'static str),
}

fn api_message(kind: &str, trigger: &str, field: &Option<String>) -> String {
    match field.as_deref() {
        None | Some("") if trigger.is_empty() || trigger == "<null>" => kind.to_string(),
        None | Some("") => format!("{} ({})", kind, trigger),
        Some("selector") => kind.to_string(),
        Some(field) => format!("{} on {}", kind, field),
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Result type for report downloads
pub type FetchResult<T> = Result<T, FetchError>;
