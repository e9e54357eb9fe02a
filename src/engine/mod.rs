//! Query Engine
//!
//! Runs parsed statements against a catalog and a report source:
//!
//! - **Rewrite**: SELECTs against views become SELECTs against reports
//! - **Binder**: columns resolved to catalog types and report positions
//! - **Value**: raw report text into typed cells
//! - **Aggregate**: grouping and aggregate functions
//! - **Result**: sort, pagination and cursor
//! - **Executor**: the [`Engine`] tying them together
//!
//! # Example
//!
//! ```rust,ignore
//! use awql::engine::{Engine, Outcome};
//!
//! let mut engine = Engine::new(catalog, source).with_account_id("123-456-7890");
//! if let Outcome::Rows(mut rows) = engine.execute("SELECT CampaignName, SUM(Clicks) FROM CAMPAIGN_PERFORMANCE_REPORT GROUP BY 1").await? {
//!     while let Some(row) = rows.next_row() {
//!         println!("{:?}", row);
//!     }
//! }
//! ```

mod aggregate;
mod binder;
mod error;
mod executor;
mod result;
mod rewrite;
mod value;

pub use aggregate::{aggregate, Aggregated};
pub use binder::{bind, BoundColumn, BoundSelect};
pub use error::{QueryError, QueryResult};
pub use executor::{Engine, Outcome};
pub use result::{ResultColumn, ResultSet, SortKey};
pub use rewrite::rewrite;
pub use value::{cast, Cell, Kind, NULL_VALUE};
