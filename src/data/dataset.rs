//! A read-only base frame plus a side table of derived columns.

use std::borrow::Cow;

use super::{Column, Frame};
use crate::error::{ReportResult, ValidationError};

/// The dataset a report runs against.
///
/// The base frame is never modified. Columns computed on behalf of a report
/// (time buckets) are attached to a separate derived table, so resolving the
/// same dimension twice cannot alias or overwrite source data.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    base: Frame,
    derived: Vec<Column>,
}

impl Dataset {
    pub fn new(base: Frame) -> Self {
        Self {
            base,
            derived: vec![],
        }
    }

    pub fn base(&self) -> &Frame {
        &self.base
    }

    pub fn derived(&self) -> &[Column] {
        &self.derived
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.base.has_column(name) || self.derived.iter().any(|c| c.name == name)
    }

    /// Attach a derived column.
    ///
    /// Idempotent: if a column of the same name already exists (base or
    /// derived) nothing changes and `false` is returned.
    pub fn attach(&mut self, column: Column) -> ReportResult<bool> {
        if self.has_column(&column.name) {
            return Ok(false);
        }
        if column.len() != self.base.len() {
            return Err(ValidationError::LengthMismatch {
                name: column.name,
                expected: self.base.len(),
                actual: column.values.len(),
            }
            .into());
        }
        tracing::debug!(column = %column.name, "attached derived column");
        self.derived.push(column);
        Ok(true)
    }

    /// The base frame with every derived column appended.
    pub fn frame(&self) -> ReportResult<Cow<'_, Frame>> {
        if self.derived.is_empty() {
            return Ok(Cow::Borrowed(&self.base));
        }
        let mut frame = self.base.clone();
        for column in &self.derived {
            frame.insert(column.clone())?;
        }
        Ok(Cow::Owned(frame))
    }
}

impl From<Frame> for Dataset {
    fn from(base: Frame) -> Self {
        Dataset::new(base)
    }
}
