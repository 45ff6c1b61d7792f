//! Row-level scalar expressions.

use std::collections::BTreeSet;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::Predicate;
use crate::data::Value;

// =============================================================================
// Scalar AST
// =============================================================================

/// An expression producing one value per row.
///
/// Every consumer (evaluator, dependency collector, emitter, rewrite pass)
/// matches exhaustively, so a new variant is a compile error everywhere it
/// needs handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalarExpr {
    /// Column reference by name.
    Column { name: String },

    /// Untyped literal. Dates and timestamps serialize tagged.
    Literal {
        #[serde(with = "crate::data::tagged")]
        value: Value,
    },

    /// Arithmetic or string concatenation.
    Binary {
        op: BinaryOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },

    /// Division that yields `fill` when the denominator is zero or null.
    SafeDiv {
        numerator: Box<ScalarExpr>,
        denominator: Box<ScalarExpr>,
        #[serde(default)]
        fill: f64,
    },

    /// First non-null argument.
    Coalesce { exprs: Vec<ScalarExpr> },

    /// Ordered conditional branches; the first matching branch wins.
    CaseWhen {
        whens: Vec<WhenBranch>,
        otherwise: Option<Box<ScalarExpr>>,
    },

    /// Pre-rendered SQL, produced by alias substitution for push-down only.
    Fragment { sql: String },
}

/// One `WHEN <predicate> THEN <value>` branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenBranch {
    pub when: Predicate,
    pub then: ScalarExpr,
}

/// Binary scalar operators, serialized by their SQL symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "||")]
    Concat,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Concat => "||",
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Reference a column.
pub fn col(name: impl Into<String>) -> ScalarExpr {
    ScalarExpr::Column { name: name.into() }
}

/// Wrap a literal value.
pub fn lit(value: impl Into<Value>) -> ScalarExpr {
    ScalarExpr::Literal {
        value: value.into(),
    }
}

/// String concatenation of two expressions.
pub fn concat(left: impl Into<ScalarExpr>, right: impl Into<ScalarExpr>) -> ScalarExpr {
    ScalarExpr::binary(BinaryOp::Concat, left.into(), right.into())
}

/// First non-null of the given expressions.
pub fn coalesce(exprs: impl IntoIterator<Item = ScalarExpr>) -> ScalarExpr {
    ScalarExpr::Coalesce {
        exprs: exprs.into_iter().collect(),
    }
}

/// Null-safe division with an explicit fill value.
pub fn safe_div(
    numerator: impl Into<ScalarExpr>,
    denominator: impl Into<ScalarExpr>,
    fill: f64,
) -> ScalarExpr {
    ScalarExpr::SafeDiv {
        numerator: Box::new(numerator.into()),
        denominator: Box::new(denominator.into()),
        fill,
    }
}

/// Multi-branch conditional.
pub fn case_when(
    whens: impl IntoIterator<Item = (Predicate, ScalarExpr)>,
    otherwise: Option<ScalarExpr>,
) -> ScalarExpr {
    ScalarExpr::CaseWhen {
        whens: whens
            .into_iter()
            .map(|(when, then)| WhenBranch { when, then })
            .collect(),
        otherwise: otherwise.map(Box::new),
    }
}

impl ScalarExpr {
    pub fn binary(op: BinaryOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The literal value, if this is a literal.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            ScalarExpr::Literal { value } => Some(value),
            _ => None,
        }
    }

    /// Column names this expression reads.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    pub(crate) fn collect_dependencies(&self, deps: &mut BTreeSet<String>) {
        match self {
            ScalarExpr::Column { name } => {
                deps.insert(name.clone());
            }
            ScalarExpr::Literal { .. } | ScalarExpr::Fragment { .. } => {}
            ScalarExpr::Binary { left, right, .. } => {
                left.collect_dependencies(deps);
                right.collect_dependencies(deps);
            }
            ScalarExpr::SafeDiv {
                numerator,
                denominator,
                ..
            } => {
                numerator.collect_dependencies(deps);
                denominator.collect_dependencies(deps);
            }
            ScalarExpr::Coalesce { exprs } => {
                for e in exprs {
                    e.collect_dependencies(deps);
                }
            }
            ScalarExpr::CaseWhen { whens, otherwise } => {
                for branch in whens {
                    deps.extend(branch.when.dependencies());
                    branch.then.collect_dependencies(deps);
                }
                if let Some(o) = otherwise {
                    o.collect_dependencies(deps);
                }
            }
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<Value> for ScalarExpr {
    fn from(value: Value) -> Self {
        ScalarExpr::Literal { value }
    }
}

impl From<i64> for ScalarExpr {
    fn from(n: i64) -> Self {
        lit(n)
    }
}

impl From<i32> for ScalarExpr {
    fn from(n: i32) -> Self {
        lit(n as i64)
    }
}

impl From<f64> for ScalarExpr {
    fn from(f: f64) -> Self {
        lit(f)
    }
}

impl From<bool> for ScalarExpr {
    fn from(b: bool) -> Self {
        lit(b)
    }
}

impl From<&str> for ScalarExpr {
    fn from(s: &str) -> Self {
        lit(s)
    }
}

impl From<String> for ScalarExpr {
    fn from(s: String) -> Self {
        lit(s)
    }
}

// =============================================================================
// Operator overloading
// =============================================================================

impl<T: Into<ScalarExpr>> Add<T> for ScalarExpr {
    type Output = ScalarExpr;

    fn add(self, rhs: T) -> ScalarExpr {
        ScalarExpr::binary(BinaryOp::Add, self, rhs.into())
    }
}

impl<T: Into<ScalarExpr>> Sub<T> for ScalarExpr {
    type Output = ScalarExpr;

    fn sub(self, rhs: T) -> ScalarExpr {
        ScalarExpr::binary(BinaryOp::Sub, self, rhs.into())
    }
}

impl<T: Into<ScalarExpr>> Mul<T> for ScalarExpr {
    type Output = ScalarExpr;

    fn mul(self, rhs: T) -> ScalarExpr {
        ScalarExpr::binary(BinaryOp::Mul, self, rhs.into())
    }
}

/// `/` builds a safe division with a zero fill.
impl<T: Into<ScalarExpr>> Div<T> for ScalarExpr {
    type Output = ScalarExpr;

    fn div(self, rhs: T) -> ScalarExpr {
        safe_div(self, rhs, 0.0)
    }
}
