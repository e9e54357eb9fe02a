//! Grouping and aggregation
//!
//! Raw report rows are typed and folded into groups:
//!
//! - with GROUP BY, the key hashes the raw values of the grouped columns;
//! - otherwise, when a column is DISTINCT or aggregated, the key hashes the
//!   raw values of the DISTINCT columns (a single group when there is none);
//! - otherwise every row is its own group.
//!
//! Groups keep the order in which their first row was seen.

use std::collections::HashMap;

use super::binder::{BoundColumn, BoundSelect};
use super::error::{QueryError, QueryResult};
use super::value::{self, Cell, Kind, DOUBLE_PRECISION};
use crate::hash::fnv64a;
use crate::query::AggregateFunction;

/// Aggregated rows and the widest rendered value of each column
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub rows: Vec<Vec<Cell>>,
    pub widths: Vec<usize>,
}

/// Running state of one aggregate column within one group
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    rows: u64,
    valid: u64,
    value: Option<f64>,
}

impl Accumulator {
    fn update(&mut self, function: AggregateFunction, input: Option<f64>) {
        self.rows += 1;
        let Some(v) = input else {
            return;
        };
        let n = self.valid as f64;
        self.valid += 1;
        self.value = Some(match (function, self.value) {
            (AggregateFunction::Count, _) => return,
            (_, None) => v,
            (AggregateFunction::Sum, Some(acc)) => acc + v,
            (AggregateFunction::Avg, Some(acc)) => (acc * n + v) / (n + 1.0),
            (AggregateFunction::Max, Some(acc)) => acc.max(v),
            (AggregateFunction::Min, Some(acc)) => acc.min(v),
        });
    }

    fn finish(&self, function: AggregateFunction, column: &BoundColumn) -> Cell {
        let kind = Kind::of(&column.kind);
        let precision = if kind == Kind::Double {
            DOUBLE_PRECISION
        } else {
            0
        };
        match function {
            AggregateFunction::Count => Cell::float(Some(self.rows as f64), 0),
            AggregateFunction::Sum => Cell::float(Some(self.value.unwrap_or(0.0)), precision),
            AggregateFunction::Min | AggregateFunction::Max
                if matches!(kind, Kind::Date | Kind::DateTime) =>
            {
                value::date_from_seconds(self.value, &column.kind)
            }
            AggregateFunction::Avg | AggregateFunction::Min | AggregateFunction::Max => {
                Cell::float(self.value, precision)
            }
        }
    }
}

struct Group {
    cells: Vec<Cell>,
    accumulators: Vec<Accumulator>,
}

/// Numeric value of a raw aggregate input, `None` when not set
fn numeric(raw: &str, column: &BoundColumn) -> QueryResult<Option<f64>> {
    let cell = value::cast(raw, &column.kind)?;
    if cell.is_null() {
        return Ok(None);
    }
    cell.as_f64()
        .map(Some)
        .ok_or_else(|| QueryError::cast(raw, &column.kind))
}

fn group_key(select: &BoundSelect, record: &[String], ordinal: usize, collapse: bool) -> Vec<u64> {
    let hash = |column: &BoundColumn| fnv64a(record[column.source_index].as_bytes());
    if !select.group_by.is_empty() {
        select
            .group_by
            .iter()
            .filter_map(|&idx| select.columns.get(idx))
            .map(hash)
            .collect()
    } else if collapse {
        select
            .columns
            .iter()
            .filter(|c| c.distinct)
            .map(hash)
            .collect()
    } else {
        vec![ordinal as u64]
    }
}

/// Type and aggregate raw report rows
pub fn aggregate(select: &BoundSelect, records: &[Vec<String>]) -> QueryResult<Aggregated> {
    let collapse = select.collapses();
    let expected = select.report_columns.len();

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<Vec<u64>, usize> = HashMap::new();

    for (ordinal, record) in records.iter().enumerate() {
        if record.len() < expected {
            return Err(QueryError::MalformedRow {
                expected,
                found: record.len(),
            });
        }

        let key = group_key(select, record, ordinal, collapse);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group {
                cells: vec![Cell::null(Kind::String); select.columns.len()],
                accumulators: vec![Accumulator::default(); select.columns.len()],
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];

        for (i, column) in select.columns.iter().enumerate() {
            let raw = &record[column.source_index];
            match column.function {
                Some(AggregateFunction::Count) => {
                    group.accumulators[i].update(AggregateFunction::Count, None)
                }
                Some(function) => {
                    let input = numeric(raw, column)?;
                    group.accumulators[i].update(function, input);
                }
                None => group.cells[i] = value::cast(raw, &column.kind)?,
            }
        }
    }

    let mut widths = vec![0; select.columns.len()];
    let rows = groups
        .into_iter()
        .map(|mut group| {
            for (i, column) in select.columns.iter().enumerate() {
                if let Some(function) = column.function {
                    group.cells[i] = group.accumulators[i].finish(function, column);
                }
                widths[i] = widths[i].max(group.cells[i].width());
            }
            group.cells
        })
        .collect();

    Ok(Aggregated { rows, widths })
}
