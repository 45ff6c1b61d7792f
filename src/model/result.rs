//! Report output: pivoted tables keyed by slicer values.

use std::fmt::Write as _;

use serde::Serialize;

use crate::data::Value;
use crate::error::{ReportResult, ValidationError};

/// Label of a table row: a tuple of row-dimension values, or the totals row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKey {
    Data(Vec<Value>),
    Total,
}

impl RowKey {
    pub fn data<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        RowKey::Data(values.into_iter().map(Into::into).collect())
    }

    pub fn is_total(&self) -> bool {
        matches!(self, RowKey::Total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub key: RowKey,
    /// One cell per table column; `None` where the group had no rows.
    pub cells: Vec<Option<Value>>,
}

/// One pivoted table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PivotTable {
    /// Names of the row-dimension keys labeling each row.
    pub index_names: Vec<String>,
    /// Flattened column names, e.g. `clicks / Mobile`.
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, key: &RowKey) -> Option<&PivotRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// The cell at `key` and `column`. Missing rows, columns and cells are
    /// all `None`.
    pub fn cell(&self, key: &RowKey, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.row(key)?.cells.get(index)?.as_ref()
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &PivotRow> {
        self.rows.iter().filter(|r| !r.key.is_total())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain-text grid, one line per row, columns padded to width.
    pub fn render(&self) -> String {
        let index_width = self.index_names.len().max(1);
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(self.rows.len() + 1);

        let mut header: Vec<String> = self.index_names.clone();
        header.resize(index_width, String::new());
        header.extend(self.columns.iter().cloned());
        grid.push(header);

        for row in &self.rows {
            let mut line: Vec<String> = match &row.key {
                RowKey::Data(values) => values.iter().map(Value::to_string).collect(),
                RowKey::Total => vec!["Total".to_string()],
            };
            line.resize(index_width, String::new());
            line.extend(
                row.cells
                    .iter()
                    .map(|c| c.as_ref().map(Value::to_string).unwrap_or_default()),
            );
            grid.push(line);
        }

        let widths: Vec<usize> = (0..grid[0].len())
            .map(|i| grid.iter().map(|l| l[i].chars().count()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for line in &grid {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
        out
    }
}

/// One slicer partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    /// Slicer values; empty when the report has no slicers.
    pub key: Vec<Value>,
    pub table: PivotTable,
}

/// The result of one report invocation.
///
/// Slices are ordered by key, nulls last. Without slicer
/// dimensions there is exactly one slice, keyed by the empty tuple.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PivotResult {
    pub slicer_names: Vec<String>,
    pub slices: Vec<Slice>,
}

impl PivotResult {
    pub fn get(&self, key: &[Value]) -> Option<&PivotTable> {
        self.slices
            .iter()
            .find(|s| s.key.as_slice() == key)
            .map(|s| &s.table)
    }

    /// The only table of an unsliced result.
    pub fn single(&self) -> ReportResult<&PivotTable> {
        match self.slices.as_slice() {
            [slice] => Ok(&slice.table),
            slices => Err(ValidationError::MultipleSlices(slices.len()).into()),
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}
