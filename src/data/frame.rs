//! Columnar frames.

use std::collections::HashMap;

use serde_json::Map;

use super::Value;
use crate::error::{ReportResult, ValidationError};

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered set of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    len: usize,
}

impl Frame {
    /// Create an empty frame with the given row count and no columns.
    pub fn with_len(len: usize) -> Self {
        Self {
            columns: vec![],
            len,
        }
    }

    /// Build a frame from columns, checking that every column has the same length.
    pub fn from_columns(columns: Vec<Column>) -> ReportResult<Self> {
        let len = columns.first().map(Column::len).unwrap_or(0);
        let mut frame = Frame::with_len(len);
        for column in columns {
            frame.insert(column)?;
        }
        Ok(frame)
    }

    /// Build a frame from an array of JSON objects.
    ///
    /// Columns appear in first-seen order; keys missing from a record are null.
    pub fn from_records(records: &serde_json::Value) -> ReportResult<Self> {
        let rows = records.as_array().ok_or_else(|| {
            ValidationError::InvalidSpec("dataset must be a JSON array of objects".into())
        })?;

        let mut names: Vec<String> = vec![];
        let mut positions: HashMap<String, usize> = HashMap::new();
        for row in rows {
            let object = row.as_object().ok_or_else(|| {
                ValidationError::InvalidSpec(format!("dataset record is not an object: {}", row))
            })?;
            for key in object.keys() {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), names.len());
                    names.push(key.clone());
                }
            }
        }

        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            let object = row.as_object().map(Map::clone).unwrap_or_default();
            for column in &mut columns {
                let cell = match object.get(&column.name) {
                    Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                        ValidationError::InvalidSpec(format!("column {}: {}", column.name, e))
                    })?,
                    None => Value::Null,
                };
                column.values.push(cell);
            }
        }

        let mut frame = Frame::from_columns(columns)?;
        frame.len = rows.len();
        Ok(frame)
    }

    /// Render rows as an array of JSON objects.
    pub fn to_records(&self) -> serde_json::Value {
        let rows = (0..self.len)
            .map(|i| {
                let mut object = Map::new();
                for column in &self.columns {
                    let value = serde_json::to_value(&column.values[i]).unwrap_or_default();
                    object.insert(column.name.clone(), value);
                }
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing with a validation error when it is missing.
    pub fn require(&self, name: &str) -> ReportResult<&Column> {
        self.column(name)
            .ok_or_else(|| ValidationError::MissingColumn(name.to_string()).into())
    }

    /// Add a column, or replace an existing column of the same name.
    pub fn insert(&mut self, column: Column) -> ReportResult<()> {
        if self.columns.is_empty() && self.len == 0 {
            self.len = column.len();
        }
        if column.len() != self.len {
            return Err(ValidationError::LengthMismatch {
                name: column.name,
                expected: self.len,
                actual: column.values.len(),
            }
            .into());
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Keep only rows whose mask entry is true.
    pub fn filter(&self, mask: &[bool]) -> Frame {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        self.take(&indices)
    }

    /// Select rows by position, in the given order.
    pub fn take(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.values[i].clone()).collect()))
            .collect();
        Frame {
            columns,
            len: indices.len(),
        }
    }

    /// Partition row positions by the values of `keys`.
    ///
    /// Groups are returned in order of first appearance. With no keys every
    /// row belongs to one implicit group, which exists even for an empty frame.
    pub fn group_indices(&self, keys: &[&str]) -> ReportResult<Vec<(Vec<Value>, Vec<usize>)>> {
        if keys.is_empty() {
            return Ok(vec![(vec![], (0..self.len).collect())]);
        }
        let key_columns = keys
            .iter()
            .map(|k| self.require(k))
            .collect::<ReportResult<Vec<_>>>()?;

        let mut groups: Vec<(Vec<Value>, Vec<usize>)> = vec![];
        let mut lookup: HashMap<Vec<Value>, usize> = HashMap::new();
        for row in 0..self.len {
            let key: Vec<Value> = key_columns.iter().map(|c| c.values[row].clone()).collect();
            match lookup.get(&key) {
                Some(&g) => groups[g].1.push(row),
                None => {
                    lookup.insert(key.clone(), groups.len());
                    groups.push((key, vec![row]));
                }
            }
        }
        Ok(groups)
    }
}
