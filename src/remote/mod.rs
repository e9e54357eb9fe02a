//! Report Sources
//!
//! Where raw report rows come from once the cache missed. The engine only
//! sees the [`ReportSource`] trait; [`AdwordsClient`] downloads reports over
//! HTTP from the reporting API.

mod adwords;
mod error;

pub use adwords::AdwordsClient;
pub use error::{FetchError, FetchResult};

use async_trait::async_trait;

/// Download raw rows for a query in the reduced grammar
///
/// Rows carry no header; values are in select-list order.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self, query: &str) -> FetchResult<Vec<Vec<String>>>;
}
