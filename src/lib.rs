//! # AWQL
//!
//! A SQL-like query layer over the advertising reporting service. Statements
//! are parsed locally, views are unfolded against a catalog, the reduced
//! query is downloaded as a CSV report (or read back from a local cache) and
//! the rows are aggregated, sorted and paginated client side.
//!
//! ## Modules
//!
//! - [`query`]: Lexer, parser and statement AST
//! - [`catalog`]: Report and view metadata
//! - [`engine`]: View rewriting, binding, aggregation and result sets
//! - [`remote`]: Report download client
//! - [`cache`]: On-disk report cache with a background writer
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use awql::catalog::MemoryCatalog;
//! use awql::config::Config;
//! use awql::engine::{Engine, Outcome};
//! use awql::remote::AdwordsClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let catalog = MemoryCatalog::load(config.catalog.file_path())?;
//!     let client = AdwordsClient::new(config.adwords.clone())?;
//!
//!     let mut engine = Engine::new(catalog, Arc::new(client))
//!         .with_account_id(config.adwords.account_id.clone());
//!
//!     let outcome = engine
//!         .execute("SELECT CampaignName, SUM(Clicks) FROM CAMPAIGN_PERFORMANCE_REPORT GROUP BY 1")
//!         .await?;
//!     if let Outcome::Rows(mut rs) = outcome {
//!         while let Some(row) = rs.next_row() {
//!             println!("{:?}", row);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod hash;
pub mod query;
pub mod remote;
