//! Per-group reductions.
//!
//! All reductions skip nulls, matching SQL aggregate semantics: the sum,
//! mean, min and max of no values are null, the count of no values is zero.

use std::collections::HashSet;

use super::Value;
use crate::error::{ReportResult, ValidationError};

/// The reductions a dataset provider must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    NUnique,
}

impl Reduction {
    pub fn apply<'a>(self, values: impl IntoIterator<Item = &'a Value>) -> ReportResult<Value> {
        let present = values.into_iter().filter(|v| !v.is_null());
        match self {
            Reduction::Sum => sum(present),
            Reduction::Mean => mean(present),
            Reduction::Min => Ok(present.min_by(|a, b| a.total_cmp(b)).cloned().unwrap_or_default()),
            Reduction::Max => Ok(present.max_by(|a, b| a.total_cmp(b)).cloned().unwrap_or_default()),
            Reduction::Count => Ok(Value::Int(present.count() as i64)),
            Reduction::NUnique => Ok(Value::Int(present.collect::<HashSet<_>>().len() as i64)),
        }
    }
}

fn numeric(value: &Value) -> ReportResult<f64> {
    value.as_f64().ok_or_else(|| {
        ValidationError::TypeMismatch(format!("cannot aggregate {} value {}", value.type_name(), value)).into()
    })
}

fn sum<'a>(values: impl Iterator<Item = &'a Value>) -> ReportResult<Value> {
    let mut int_total: Option<i64> = Some(0);
    let mut float_total = 0.0;
    let mut seen = false;
    for value in values {
        seen = true;
        float_total += numeric(value)?;
        int_total = match (int_total, value) {
            (Some(acc), Value::Int(i)) => acc.checked_add(*i),
            _ => None,
        };
    }
    Ok(match (seen, int_total) {
        (false, _) => Value::Null,
        (true, Some(total)) => Value::Int(total),
        (true, None) => Value::Float(float_total),
    })
}

fn mean<'a>(values: impl Iterator<Item = &'a Value>) -> ReportResult<Value> {
    let mut total = 0.0;
    let mut n = 0usize;
    for value in values {
        total += numeric(value)?;
        n += 1;
    }
    Ok(if n == 0 {
        Value::Null
    } else {
        Value::Float(total / n as f64)
    })
}
