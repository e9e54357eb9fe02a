//! Result sets
//!
//! A rectangular matrix of typed cells with named columns, sorted and
//! paginated after aggregation, then read through a forward-only cursor.

use std::cmp::Ordering;

use serde::Serialize;

use super::value::Cell;
use crate::query::Limit;

/// Output column with its display width
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    pub name: String,
    /// Widest of the name and every rendered value, in characters
    pub width: usize,
}

/// One ORDER BY key, resolved to a column index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub index: usize,
    pub desc: bool,
}

/// Rows produced by a statement
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Vec<ResultColumn>,
    rows: Vec<Vec<Cell>>,
    cursor: usize,
    closed: bool,
    vertical: bool,
}

impl ResultSet {
    /// Build a result set, computing column widths from names and values
    pub fn new(names: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }
        Self::with_widths(names, rows, widths)
    }

    /// Build a result set from widths already tracked by the caller
    pub fn with_widths(names: Vec<String>, rows: Vec<Vec<Cell>>, widths: Vec<usize>) -> Self {
        let columns = names
            .into_iter()
            .zip(widths)
            .map(|(name, width)| ResultColumn {
                width: width.max(name.chars().count()),
                name,
            })
            .collect();
        Self {
            columns,
            rows,
            cursor: 0,
            closed: false,
            vertical: false,
        }
    }

    /// Request `\G` style output
    pub fn vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Every row, regardless of the cursor position
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort on the keys in declared order
    ///
    /// Each key breaks the ties of the previous one; nulls sort first in
    /// ascending order.
    pub fn sort(&mut self, keys: &[SortKey]) {
        if keys.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            keys.iter().fold(Ordering::Equal, |ord, key| {
                ord.then_with(|| {
                    let ord = match (a.get(key.index), b.get(key.index)) {
                        (Some(a), Some(b)) => a.compare(b),
                        _ => Ordering::Equal,
                    };
                    if key.desc {
                        ord.reverse()
                    } else {
                        ord
                    }
                })
            })
        });
    }

    /// Keep `row_count` rows starting at `offset`, clamped to what exists
    pub fn paginate(&mut self, limit: Limit) {
        let start = limit.offset.min(self.rows.len());
        let end = start.saturating_add(limit.row_count).min(self.rows.len());
        self.rows.truncate(end);
        self.rows.drain(..start);
    }

    /// Advance the cursor; `None` once exhausted or closed
    pub fn next_row(&mut self) -> Option<&[Cell]> {
        if self.closed {
            return None;
        }
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some(row)
    }

    /// Release the rows; the cursor reports end of data afterwards
    pub fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }
}
