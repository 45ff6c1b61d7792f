//! Aggregate expressions: one value per group.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::eval::safe_divide;
use super::{col, ScalarExpr};
use crate::data::{Frame, Reduction, Value};
use crate::error::ReportResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggExpr {
    Sum {
        expr: ScalarExpr,
    },
    Avg {
        expr: ScalarExpr,
    },
    Min {
        expr: ScalarExpr,
    },
    Max {
        expr: ScalarExpr,
    },
    /// `COUNT(expr)`, or `COUNT(*)` when `expr` is absent.
    Count {
        expr: Option<ScalarExpr>,
    },
    #[serde(rename = "nunique")]
    NUnique {
        expr: ScalarExpr,
    },
    /// `sum(numerator) / sum(denominator)`, `fill` on a zero or null denominator.
    RatioOfSums {
        numerator: ScalarExpr,
        denominator: ScalarExpr,
        #[serde(default)]
        fill: f64,
    },
}

pub fn sum(expr: impl Into<AggInput>) -> AggExpr {
    AggExpr::Sum {
        expr: expr.into().0,
    }
}

pub fn avg(expr: impl Into<AggInput>) -> AggExpr {
    AggExpr::Avg {
        expr: expr.into().0,
    }
}

pub fn min(expr: impl Into<AggInput>) -> AggExpr {
    AggExpr::Min {
        expr: expr.into().0,
    }
}

pub fn max(expr: impl Into<AggInput>) -> AggExpr {
    AggExpr::Max {
        expr: expr.into().0,
    }
}

pub fn count(expr: impl Into<AggInput>) -> AggExpr {
    AggExpr::Count {
        expr: Some(expr.into().0),
    }
}

pub fn count_star() -> AggExpr {
    AggExpr::Count { expr: None }
}

pub fn nunique(expr: impl Into<AggInput>) -> AggExpr {
    AggExpr::NUnique {
        expr: expr.into().0,
    }
}

pub fn ratio_of_sums(
    numerator: impl Into<AggInput>,
    denominator: impl Into<AggInput>,
    fill: f64,
) -> AggExpr {
    AggExpr::RatioOfSums {
        numerator: numerator.into().0,
        denominator: denominator.into().0,
        fill,
    }
}

/// Aggregate argument: an expression, or a bare column name.
pub struct AggInput(ScalarExpr);

impl From<ScalarExpr> for AggInput {
    fn from(expr: ScalarExpr) -> Self {
        AggInput(expr)
    }
}

impl From<&str> for AggInput {
    fn from(name: &str) -> Self {
        AggInput(col(name))
    }
}

impl AggExpr {
    /// Compute one value per group, where each group is a list of row positions.
    pub fn aggregate(&self, frame: &Frame, groups: &[Vec<usize>]) -> ReportResult<Vec<Value>> {
        match self {
            AggExpr::Sum { expr } => reduce(frame, expr, groups, Reduction::Sum),
            AggExpr::Avg { expr } => reduce(frame, expr, groups, Reduction::Mean),
            AggExpr::Min { expr } => reduce(frame, expr, groups, Reduction::Min),
            AggExpr::Max { expr } => reduce(frame, expr, groups, Reduction::Max),
            AggExpr::Count { expr: None } => {
                Ok(groups.iter().map(|g| Value::Int(g.len() as i64)).collect())
            }
            AggExpr::Count { expr: Some(expr) } => reduce(frame, expr, groups, Reduction::Count),
            AggExpr::NUnique { expr } => reduce(frame, expr, groups, Reduction::NUnique),
            AggExpr::RatioOfSums {
                numerator,
                denominator,
                fill,
            } => {
                let num = reduce(frame, numerator, groups, Reduction::Sum)?;
                let den = reduce(frame, denominator, groups, Reduction::Sum)?;
                num.iter()
                    .zip(&den)
                    .map(|(n, d)| safe_divide(n, d, *fill))
                    .collect()
            }
        }
    }

    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            AggExpr::Sum { expr }
            | AggExpr::Avg { expr }
            | AggExpr::Min { expr }
            | AggExpr::Max { expr }
            | AggExpr::NUnique { expr }
            | AggExpr::Count { expr: Some(expr) } => expr.dependencies(),
            AggExpr::Count { expr: None } => BTreeSet::new(),
            AggExpr::RatioOfSums {
                numerator,
                denominator,
                ..
            } => {
                let mut deps = numerator.dependencies();
                deps.extend(denominator.dependencies());
                deps
            }
        }
    }
}

/// Evaluate `expr` once over the frame, then reduce each group.
pub(crate) fn reduce(
    frame: &Frame,
    expr: &ScalarExpr,
    groups: &[Vec<usize>],
    reduction: Reduction,
) -> ReportResult<Vec<Value>> {
    let values = expr.eval(frame)?;
    groups
        .iter()
        .map(|rows| reduction.apply(rows.iter().map(|&i| &values[i])))
        .collect()
}
