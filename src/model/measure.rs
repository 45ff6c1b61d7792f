//! Named output values.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::Reduction;
use crate::error::{ReportResult, ValidationError};
use crate::expr::{AggExpr, ScalarExpr};

/// Reduction applied to a row measure's per-row values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAgg {
    Sum,
    #[default]
    #[serde(alias = "avg")]
    Mean,
    Min,
    Max,
    Count,
    #[serde(rename = "nunique")]
    NUnique,
}

impl RowAgg {
    pub fn parse(s: &str) -> ReportResult<RowAgg> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(RowAgg::Sum),
            "mean" | "avg" => Ok(RowAgg::Mean),
            "min" => Ok(RowAgg::Min),
            "max" => Ok(RowAgg::Max),
            "count" => Ok(RowAgg::Count),
            "nunique" => Ok(RowAgg::NUnique),
            _ => Err(ValidationError::UnknownAggregation(s.to_string()).into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RowAgg::Sum => "sum",
            RowAgg::Mean => "mean",
            RowAgg::Min => "min",
            RowAgg::Max => "max",
            RowAgg::Count => "count",
            RowAgg::NUnique => "nunique",
        }
    }

    pub fn reduction(&self) -> Reduction {
        match self {
            RowAgg::Sum => Reduction::Sum,
            RowAgg::Mean => Reduction::Mean,
            RowAgg::Min => Reduction::Min,
            RowAgg::Max => Reduction::Max,
            RowAgg::Count => Reduction::Count,
            RowAgg::NUnique => Reduction::NUnique,
        }
    }
}

impl fmt::Display for RowAgg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A measure is computed per row and then reduced, or aggregated directly
/// per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measure {
    /// Evaluated on every filtered row before grouping, then reduced.
    RowMeasure {
        name: String,
        #[serde(default)]
        agg: RowAgg,
        expr: ScalarExpr,
    },
    /// Aggregated during grouping.
    AggMeasure { name: String, agg_expr: AggExpr },
}

impl Measure {
    pub fn row(name: impl Into<String>, expr: impl Into<ScalarExpr>, agg: RowAgg) -> Self {
        Measure::RowMeasure {
            name: name.into(),
            agg,
            expr: expr.into(),
        }
    }

    pub fn agg(name: impl Into<String>, agg_expr: AggExpr) -> Self {
        Measure::AggMeasure {
            name: name.into(),
            agg_expr,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Measure::RowMeasure { name, .. } | Measure::AggMeasure { name, .. } => name,
        }
    }

    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            Measure::RowMeasure { expr, .. } => expr.dependencies(),
            Measure::AggMeasure { agg_expr, .. } => agg_expr.dependencies(),
        }
    }
}
