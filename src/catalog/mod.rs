//! Report Catalog
//!
//! Metadata about the tables a query can target: the reports exposed by the
//! reporting service and the views users stored on top of them.
//!
//! The engine only talks to the [`Catalog`] trait. [`MemoryCatalog`] is the
//! bundled implementation, loaded from a JSON document.
//!
//! # Document layout
//!
//! ```json
//! {
//!   "version": "v201809",
//!   "tables": [
//!     {
//!       "name": "CAMPAIGN_PERFORMANCE_REPORT",
//!       "aggregate_field": "CampaignId",
//!       "fields": [
//!         { "name": "CampaignId", "type": "LONG", "segment": true },
//!         { "name": "Cost", "type": "MONEY", "zero_impressions": true }
//!       ]
//!     }
//!   ]
//! }
//! ```

mod error;
mod memory;

pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;

#[cfg(test)]
pub(crate) use memory::tests;

use serde::{Deserialize, Serialize};

use crate::query::{ColumnPosition, Condition, CreateViewStatement, During, Limit, Order};

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogField {
    /// Column name in the source table
    pub name: String,
    /// Name exposed by a view, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Type tag, e.g. `MONEY`, `DOUBLE`, `DATE`, `STRING`
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub segment: bool,
    #[serde(default)]
    pub zero_impressions: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Columns that cannot be selected together with this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incompatible: Vec<String>,
    /// Aggregate method applied by a view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub distinct: bool,
}

fn default_kind() -> String {
    "STRING".to_string()
}

impl CatalogField {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            kind: kind.into(),
            segment: false,
            zero_impressions: false,
            enum_values: Vec::new(),
            incompatible: Vec::new(),
            method: None,
            distinct: false,
        }
    }

    /// Name under which the column is queried
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A stored SELECT that a view is compiled from
///
/// The columns of the view are the `fields` of the owning [`CatalogTable`];
/// each one names its source column and carries its aggregate method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub source: String,
    pub primary_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub during: Option<During>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<ColumnPosition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
}

/// A report or a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub name: String,
    /// Column counted by `COUNT(*)`
    pub aggregate_field: String,
    pub fields: Vec<CatalogField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewDefinition>,
}

impl CatalogTable {
    pub fn is_view(&self) -> bool {
        self.view.is_some()
    }

    /// Look up a column by the name it is queried with
    pub fn field(&self, name: &str) -> Option<&CatalogField> {
        self.fields.iter().find(|f| f.label() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Table metadata lookup used by the binder and the executor
///
/// `add_view` is the only mutator; callers serialize writes.
pub trait Catalog: Send + Sync {
    /// Reporting API version the catalog describes
    fn version(&self) -> &str;

    /// Look up a table or view by name
    fn table(&self, name: &str) -> CatalogResult<&CatalogTable>;

    /// Every table and view, reports first
    fn tables(&self) -> CatalogResult<Vec<&CatalogTable>>;

    /// Compile a CREATE VIEW statement and store it, replacing a view of the
    /// same name when the statement allows it
    fn add_view(&mut self, stmt: &CreateViewStatement) -> CatalogResult<()>;

    /// Look up a column of a table
    fn field(&self, table: &str, column: &str) -> CatalogResult<&CatalogField> {
        self.table(table)?
            .field(column)
            .ok_or_else(|| CatalogError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    fn tables_prefixed_by(&self, pattern: &str) -> Vec<&CatalogTable> {
        filter_tables(self.tables(), |t| t.name.starts_with(pattern))
    }

    fn tables_suffixed_by(&self, pattern: &str) -> Vec<&CatalogTable> {
        filter_tables(self.tables(), |t| t.name.ends_with(pattern))
    }

    fn tables_containing(&self, pattern: &str) -> Vec<&CatalogTable> {
        filter_tables(self.tables(), |t| t.name.contains(pattern))
    }

    /// Tables exposing a column with this name
    fn tables_with_column(&self, column: &str) -> Vec<&CatalogTable> {
        filter_tables(self.tables(), |t| t.has_column(column))
    }
}

fn filter_tables<'a>(
    tables: CatalogResult<Vec<&'a CatalogTable>>,
    predicate: impl Fn(&CatalogTable) -> bool,
) -> Vec<&'a CatalogTable> {
    tables
        .map(|tables| tables.into_iter().filter(|t| predicate(t)).collect())
        .unwrap_or_default()
}
