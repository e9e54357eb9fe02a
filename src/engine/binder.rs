//! Column binding
//!
//! Resolves the select list of a statement against the catalog. The result
//! knows, for each output column, its catalog type, its aggregate function
//! and where its raw value sits in a downloaded report row.

use super::error::QueryResult;
use super::result::SortKey;
use crate::catalog::{Catalog, CatalogError};
use crate::query::{
    AggregateFunction, Column, Condition, DynamicColumn, During, Limit, SelectStatement,
    Terminator, STAR,
};

/// An output column resolved against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    /// Report column the values come from
    pub name: String,
    /// Output name
    pub label: String,
    /// Catalog type tag
    pub kind: String,
    pub function: Option<AggregateFunction>,
    pub distinct: bool,
    /// Index of the raw value in a report row
    pub source_index: usize,
}

impl BoundColumn {
    pub fn aggregates(&self) -> bool {
        self.function.is_some()
    }
}

/// A SELECT statement ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSelect {
    pub source: String,
    pub columns: Vec<BoundColumn>,
    /// Distinct report columns to download, in first-occurrence order
    pub report_columns: Vec<String>,
    pub conditions: Vec<Condition>,
    pub during: Option<During>,
    /// Output column indices
    pub group_by: Vec<usize>,
    pub order_by: Vec<SortKey>,
    pub limit: Option<Limit>,
    pub vertical: bool,
}

impl BoundSelect {
    /// Whether rows collapse into groups even without GROUP BY
    pub fn collapses(&self) -> bool {
        self.columns.iter().any(|c| c.distinct || c.aggregates())
    }

    /// Query sent to the report download service
    pub fn legacy_string(&self) -> String {
        SelectStatement {
            fields: self
                .report_columns
                .iter()
                .map(|name| DynamicColumn::new(Column::new(name.clone())))
                .collect(),
            source: self.source.clone(),
            conditions: self.conditions.clone(),
            during: self.during,
            ..Default::default()
        }
        .legacy_string()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }
}

/// Bind a SELECT statement targeting a report
///
/// Views must have been unfolded beforehand.
pub fn bind<C: Catalog + ?Sized>(catalog: &C, stmt: &SelectStatement) -> QueryResult<BoundSelect> {
    let table = catalog.table(&stmt.source)?;
    let mut columns = Vec::with_capacity(stmt.fields.len());
    let mut report_columns: Vec<String> = Vec::new();

    for field in &stmt.fields {
        if field.is_star() {
            return Err(unknown_column(&table.name, STAR).into());
        }
        let lookup = if field.name() == STAR {
            table.aggregate_field.as_str()
        } else {
            field.name()
        };
        let meta = catalog.field(&table.name, lookup)?;

        let source_index = match report_columns.iter().position(|c| c == &meta.name) {
            Some(idx) => idx,
            None => {
                report_columns.push(meta.name.clone());
                report_columns.len() - 1
            }
        };

        columns.push(BoundColumn {
            name: meta.name.clone(),
            label: field
                .column
                .alias
                .clone()
                .unwrap_or_else(|| meta.name.clone()),
            kind: meta.kind.clone(),
            function: field.function,
            distinct: field.distinct,
            source_index,
        });
    }

    for cond in &stmt.conditions {
        if !table.has_column(&cond.column) {
            return Err(unknown_column(&table.name, &cond.column).into());
        }
    }

    Ok(BoundSelect {
        source: table.name.clone(),
        columns,
        report_columns,
        conditions: stmt.conditions.clone(),
        during: stmt.during,
        group_by: stmt
            .group_by
            .iter()
            .map(|g| g.position.saturating_sub(1))
            .collect(),
        order_by: stmt
            .order_by
            .iter()
            .map(|o| SortKey {
                index: o.column.position.saturating_sub(1),
                desc: o.desc,
            })
            .collect(),
        limit: stmt.limit,
        vertical: stmt.terminator == Terminator::Vertical,
    })
}

fn unknown_column(table: &str, column: &str) -> CatalogError {
    CatalogError::UnknownColumn {
        table: table.to_string(),
        column: column.to_string(),
    }
}
