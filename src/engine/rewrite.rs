//! View composition
//!
//! A SELECT against a view is rewritten into a SELECT against the view's
//! source, merging the clauses stored with the view:
//!
//! - `*` expands to the view's columns, view columns map back to their
//!   source column and inherit its aggregate method.
//! - WHERE: view conditions are appended; a condition on a column the view
//!   already filters is out of scope unless both are identical.
//! - DURING: intersection of both ranges, out of scope when disjoint.
//! - GROUP BY / ORDER BY: the view's clause applies only when the statement
//!   has none, and only for columns still selected.
//! - LIMIT: the view's offset is a floor and its row count a ceiling.
//!
//! Views over views are unfolded one level at a time.

use chrono::NaiveDate;

use super::error::{QueryError, QueryResult};
use crate::catalog::{Catalog, CatalogError, CatalogField, CatalogTable, ViewDefinition};
use crate::query::{
    AggregateFunction, Column, ColumnPosition, Condition, DynamicColumn, During, Limit, Order,
    SelectStatement, STAR,
};

/// Maximum number of nested views unfolded for one statement
const MAX_VIEW_DEPTH: usize = 16;

/// Unfold every view the statement targets
pub fn rewrite<C: Catalog + ?Sized>(
    catalog: &C,
    mut stmt: SelectStatement,
    today: NaiveDate,
) -> QueryResult<SelectStatement> {
    for _ in 0..MAX_VIEW_DEPTH {
        let table = catalog.table(&stmt.source)?;
        let Some(view) = &table.view else {
            return Ok(stmt);
        };
        tracing::debug!(view = %table.name, source = %view.source, "Unfolding view");
        stmt = merge(stmt, table, view, today)?;
    }
    Err(QueryError::out_of_scope(format!(
        "more than {} nested views",
        MAX_VIEW_DEPTH
    )))
}

fn merge(
    stmt: SelectStatement,
    table: &CatalogTable,
    view: &ViewDefinition,
    today: NaiveDate,
) -> QueryResult<SelectStatement> {
    let (fields, positions) = map_fields(&stmt.fields, table)?;

    let mut group_by = remap_positions(&stmt.group_by, &positions, &fields);
    let mut order_by: Vec<Order> = stmt
        .order_by
        .iter()
        .filter_map(|o| {
            remap_position(&o.column, &positions, &fields).map(|column| Order {
                column,
                desc: o.desc,
            })
        })
        .collect();

    if group_by.is_empty() {
        group_by = adopt_positions(view.group_by.iter(), table, &fields);
    }
    if order_by.is_empty() {
        order_by = view
            .order_by
            .iter()
            .filter_map(|o| {
                adopt_position(&o.column, table, &fields).map(|column| Order {
                    column,
                    desc: o.desc,
                })
            })
            .collect();
    }

    Ok(SelectStatement {
        fields,
        source: view.source.clone(),
        conditions: merge_conditions(&stmt.conditions, &view.conditions, table)?,
        during: merge_during(stmt.during, view.during, today)?,
        group_by,
        order_by,
        limit: merge_limit(stmt.limit, view.limit),
        terminator: stmt.terminator,
    })
}

/// Map the select list onto source columns
///
/// Also returns, for each original field, the new position of its first
/// expansion, so position references can follow a `*` expansion.
fn map_fields(
    fields: &[DynamicColumn],
    table: &CatalogTable,
) -> QueryResult<(Vec<DynamicColumn>, Vec<usize>)> {
    let mut mapped = Vec::with_capacity(fields.len());
    let mut positions = Vec::with_capacity(fields.len());

    for field in fields {
        positions.push(mapped.len());
        if field.is_star() {
            for vf in &table.fields {
                mapped.push(expand_field(vf)?);
            }
            continue;
        }
        mapped.push(map_field(field, table)?);
    }
    Ok((mapped, positions))
}

/// Aggregate method a view applies to one of its columns
fn view_method(vf: &CatalogField) -> QueryResult<Option<AggregateFunction>> {
    match &vf.method {
        Some(method) => AggregateFunction::parse(method)
            .map(Some)
            .ok_or_else(|| QueryError::UnknownAggregateMethod(method.clone())),
        // a bare `*` column only exists as COUNT(*)
        None if vf.name == STAR => Ok(Some(AggregateFunction::Count)),
        None => Ok(None),
    }
}

/// Source field a view column stands for, as selected by `*`
fn expand_field(vf: &CatalogField) -> QueryResult<DynamicColumn> {
    Ok(DynamicColumn {
        column: Column {
            name: vf.name.clone(),
            alias: vf.alias.clone(),
        },
        function: view_method(vf)?,
        distinct: vf.distinct,
    })
}

fn map_field(field: &DynamicColumn, table: &CatalogTable) -> QueryResult<DynamicColumn> {
    // COUNT(*) counts the rows of the source as well
    if field.name() == STAR {
        return Ok(field.clone());
    }

    let vf = table
        .field(field.name())
        .ok_or_else(|| CatalogError::UnknownColumn {
            table: table.name.clone(),
            column: field.name().to_string(),
        })?;

    let function = match field.function {
        Some(function) => Some(function),
        None => view_method(vf)?,
    };

    let alias = field
        .column
        .alias
        .clone()
        .or_else(|| Some(field.name().to_string()))
        .filter(|alias| alias != &vf.name);

    Ok(DynamicColumn {
        column: Column {
            name: vf.name.clone(),
            alias,
        },
        function,
        distinct: field.distinct || vf.distinct,
    })
}

fn remap_position(
    column: &ColumnPosition,
    positions: &[usize],
    fields: &[DynamicColumn],
) -> Option<ColumnPosition> {
    let idx = *positions.get(column.position.checked_sub(1)?)?;
    let field = fields.get(idx)?;
    Some(ColumnPosition {
        column: field.column.clone(),
        position: idx + 1,
    })
}

fn remap_positions(
    columns: &[ColumnPosition],
    positions: &[usize],
    fields: &[DynamicColumn],
) -> Vec<ColumnPosition> {
    columns
        .iter()
        .filter_map(|c| remap_position(c, positions, fields))
        .collect()
}

/// Find a view GROUP BY / ORDER BY column in the rewritten select list
fn adopt_position(
    column: &ColumnPosition,
    table: &CatalogTable,
    fields: &[DynamicColumn],
) -> Option<ColumnPosition> {
    let source_name = column
        .position
        .checked_sub(1)
        .and_then(|idx| table.fields.get(idx))
        .map(|f| f.name.as_str())
        .unwrap_or(column.column.name.as_str());

    fields
        .iter()
        .position(|f| f.name() == source_name)
        .map(|idx| ColumnPosition {
            column: fields[idx].column.clone(),
            position: idx + 1,
        })
}

fn adopt_positions<'a>(
    columns: impl Iterator<Item = &'a ColumnPosition>,
    table: &CatalogTable,
    fields: &[DynamicColumn],
) -> Vec<ColumnPosition> {
    let mut adopted: Vec<ColumnPosition> = Vec::new();
    for column in columns {
        if let Some(c) = adopt_position(column, table, fields) {
            if !adopted.iter().any(|a| a.position == c.position) {
                adopted.push(c);
            }
        }
    }
    adopted
}

fn merge_conditions(
    stmt: &[Condition],
    view: &[Condition],
    table: &CatalogTable,
) -> QueryResult<Vec<Condition>> {
    let mut merged = Vec::with_capacity(stmt.len() + view.len());
    for cond in stmt {
        let vf = table
            .field(&cond.column)
            .ok_or_else(|| CatalogError::UnknownColumn {
                table: table.name.clone(),
                column: cond.column.clone(),
            })?;
        merged.push(Condition {
            column: vf.name.clone(),
            ..cond.clone()
        });
    }

    // view conditions are only checked against the statement's own
    let own = merged.len();
    for cond in view {
        let filtered = merged[..own].iter().any(|c| c.column == cond.column);
        let identical = merged[..own]
            .iter()
            .filter(|c| c.column == cond.column)
            .all(|c| c == cond);
        if !filtered {
            merged.push(cond.clone());
        } else if !identical {
            return Err(QueryError::out_of_scope(format!(
                "{} is already filtered by {}",
                cond.column, table.name
            )));
        }
    }
    Ok(merged)
}

fn resolve(during: During, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match during {
        During::Literal(literal) => literal.resolve(today),
        During::Range { start, end } => (start, end),
    }
}

fn merge_during(
    stmt: Option<During>,
    view: Option<During>,
    today: NaiveDate,
) -> QueryResult<Option<During>> {
    let (stmt, view) = match (stmt, view) {
        (Some(stmt), Some(view)) => (stmt, view),
        (stmt, view) => return Ok(stmt.or(view)),
    };
    if stmt == view {
        return Ok(Some(stmt));
    }

    let (start, end) = resolve(stmt, today);
    let (view_start, view_end) = resolve(view, today);
    if end < view_start || start > view_end {
        return Err(QueryError::out_of_scope(format!(
            "DURING {} is outside of {}",
            stmt, view
        )));
    }
    Ok(Some(During::Range {
        start: start.max(view_start),
        end: end.min(view_end),
    }))
}

fn merge_limit(stmt: Option<Limit>, view: Option<Limit>) -> Option<Limit> {
    match (stmt, view) {
        (Some(stmt), Some(view)) => Some(Limit {
            offset: stmt.offset.max(view.offset),
            row_count: stmt.row_count.min(view.row_count),
        }),
        (stmt, view) => stmt.or(view),
    }
}
