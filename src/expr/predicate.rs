//! Boolean predicates over rows.

use std::collections::BTreeSet;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

use super::{col, lit, ScalarExpr};
use crate::data::Value;
use crate::sql::SqlPredicate;

/// A boolean-valued expression.
///
/// Predicates compose with `&`, `|` and `!` into arbitrarily deep trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `left op right`
    Cmp {
        op: CmpOp,
        left: ScalarExpr,
        right: ScalarExpr,
    },

    /// Membership in a literal set.
    In {
        expr: ScalarExpr,
        #[serde(with = "crate::data::tagged_seq")]
        values: Vec<Value>,
    },

    /// Range membership with per-side inclusivity.
    Between {
        expr: ScalarExpr,
        #[serde(with = "crate::data::tagged")]
        left: Value,
        #[serde(with = "crate::data::tagged")]
        right: Value,
        #[serde(default)]
        inclusive: Inclusive,
    },

    IsNull { expr: ScalarExpr },

    /// AND / OR of two predicates.
    Bool {
        op: BoolOp,
        left: Box<Predicate>,
        right: Box<Predicate>,
    },

    Not { expr: Box<Predicate> },

    /// SQL `LIKE` with `%` and `_` wildcards.
    Like {
        expr: ScalarExpr,
        pattern: ScalarExpr,
        #[serde(default)]
        ci: bool,
        #[serde(default)]
        neg: bool,
    },

    /// Regular-expression search with a flag string drawn from `i`, `m`, `s`.
    Regex {
        expr: ScalarExpr,
        pattern: ScalarExpr,
        #[serde(default)]
        flags: String,
        #[serde(default)]
        neg: bool,
    },

    /// Raw clause text, parsed lazily on first use.
    Sql(SqlPredicate),
}

/// Comparison operators. `==` and `!=` are accepted as input aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "=", alias = "==")]
    Eq,
    #[serde(rename = "<>", alias = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }

    /// Parse an operator symbol as written in SQL text.
    pub fn from_symbol(s: &str) -> Option<CmpOp> {
        match s {
            "=" | "==" => Some(CmpOp::Eq),
            "<>" | "!=" => Some(CmpOp::Ne),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::Ge),
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::Le),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolOp {
    And,
    Or,
}

/// Which BETWEEN bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusive {
    #[default]
    Both,
    Left,
    Right,
    Neither,
}

impl Inclusive {
    pub fn lower(&self) -> bool {
        matches!(self, Inclusive::Both | Inclusive::Left)
    }

    pub fn upper(&self) -> bool {
        matches!(self, Inclusive::Both | Inclusive::Right)
    }
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::Bool {
            op: BoolOp::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Bool {
            op: BoolOp::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not {
            expr: Box::new(self),
        }
    }

    /// AND-fold a sequence of predicates; `None` when it is empty.
    pub fn all(preds: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        preds.into_iter().reduce(Predicate::and)
    }

    /// Column names this predicate reads.
    ///
    /// Raw SQL predicates report the dependencies of their parsed tree; text
    /// that does not parse reports none (the parse error surfaces on
    /// validation or evaluation).
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut BTreeSet<String>) {
        match self {
            Predicate::Cmp { left, right, .. } => {
                left.collect_dependencies(deps);
                right.collect_dependencies(deps);
            }
            Predicate::In { expr, .. }
            | Predicate::Between { expr, .. }
            | Predicate::IsNull { expr } => expr.collect_dependencies(deps),
            Predicate::Bool { left, right, .. } => {
                left.collect_dependencies(deps);
                right.collect_dependencies(deps);
            }
            Predicate::Not { expr } => expr.collect_dependencies(deps),
            Predicate::Like { expr, pattern, .. } | Predicate::Regex { expr, pattern, .. } => {
                expr.collect_dependencies(deps);
                pattern.collect_dependencies(deps);
            }
            Predicate::Sql(sql) => {
                if let Ok(inner) = sql.parsed() {
                    inner.collect_dependencies(deps);
                }
            }
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

impl From<SqlPredicate> for Predicate {
    fn from(sql: SqlPredicate) -> Self {
        Predicate::Sql(sql)
    }
}

// =============================================================================
// Builder trait
// =============================================================================

/// Predicate builders for scalar expressions.
pub trait ExprExt: Sized {
    fn into_scalar(self) -> ScalarExpr;

    fn cmp_with(self, op: CmpOp, other: impl Into<ScalarExpr>) -> Predicate {
        Predicate::Cmp {
            op,
            left: self.into_scalar(),
            right: other.into(),
        }
    }

    fn eq(self, other: impl Into<ScalarExpr>) -> Predicate {
        self.cmp_with(CmpOp::Eq, other)
    }

    fn ne(self, other: impl Into<ScalarExpr>) -> Predicate {
        self.cmp_with(CmpOp::Ne, other)
    }

    fn gt(self, other: impl Into<ScalarExpr>) -> Predicate {
        self.cmp_with(CmpOp::Gt, other)
    }

    fn ge(self, other: impl Into<ScalarExpr>) -> Predicate {
        self.cmp_with(CmpOp::Ge, other)
    }

    fn lt(self, other: impl Into<ScalarExpr>) -> Predicate {
        self.cmp_with(CmpOp::Lt, other)
    }

    fn le(self, other: impl Into<ScalarExpr>) -> Predicate {
        self.cmp_with(CmpOp::Le, other)
    }

    fn isin<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::In {
            expr: self.into_scalar(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn between(self, left: impl Into<Value>, right: impl Into<Value>) -> Predicate {
        self.between_with(left, right, Inclusive::Both)
    }

    fn between_with(
        self,
        left: impl Into<Value>,
        right: impl Into<Value>,
        inclusive: Inclusive,
    ) -> Predicate {
        Predicate::Between {
            expr: self.into_scalar(),
            left: left.into(),
            right: right.into(),
            inclusive,
        }
    }

    fn is_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self.into_scalar(),
        }
    }

    fn not_null(self) -> Predicate {
        !self.is_null()
    }

    fn like_expr(self, pattern: ScalarExpr, ci: bool, neg: bool) -> Predicate {
        Predicate::Like {
            expr: self.into_scalar(),
            pattern,
            ci,
            neg,
        }
    }

    fn like(self, pattern: impl Into<String>) -> Predicate {
        self.like_expr(lit(pattern.into()), false, false)
    }

    fn not_like(self, pattern: impl Into<String>) -> Predicate {
        self.like_expr(lit(pattern.into()), false, true)
    }

    fn ilike(self, pattern: impl Into<String>) -> Predicate {
        self.like_expr(lit(pattern.into()), true, false)
    }

    fn not_ilike(self, pattern: impl Into<String>) -> Predicate {
        self.like_expr(lit(pattern.into()), true, true)
    }

    /// Substring containment, expressed as `LIKE '%sub%'`.
    fn contains(self, sub: impl Into<ScalarExpr>, ci: bool) -> Predicate {
        let pattern = match sub.into() {
            ScalarExpr::Literal {
                value: Value::Str(s),
            } => lit(format!("%{}%", s)),
            other => super::concat(super::concat(lit("%"), other), lit("%")),
        };
        self.like_expr(pattern, ci, false)
    }

    fn regex(self, pattern: impl Into<String>, flags: impl Into<String>) -> Predicate {
        Predicate::Regex {
            expr: self.into_scalar(),
            pattern: lit(pattern.into()),
            flags: flags.into(),
            neg: false,
        }
    }

    fn not_regex(self, pattern: impl Into<String>, flags: impl Into<String>) -> Predicate {
        match self.regex(pattern, flags) {
            Predicate::Regex {
                expr,
                pattern,
                flags,
                ..
            } => Predicate::Regex {
                expr,
                pattern,
                flags,
                neg: true,
            },
            other => other,
        }
    }
}

impl ExprExt for ScalarExpr {
    fn into_scalar(self) -> ScalarExpr {
        self
    }
}

// =============================================================================
// Simple filter adapters
// =============================================================================

/// Field-level filters for callers that build reports from form input.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field = value`
    Equal { field: String, value: Value },
    /// `field IN (values)`
    Include { field: String, values: Vec<Value> },
    /// An already-built predicate.
    Predicate(Predicate),
}

impl Filter {
    pub fn to_predicate(&self) -> Predicate {
        match self {
            Filter::Equal { field, value } => col(field.as_str()).eq(value.clone()),
            Filter::Include { field, values } => col(field.as_str()).isin(values.iter().cloned()),
            Filter::Predicate(p) => p.clone(),
        }
    }
}

/// AND together a list of filters into a single WHERE predicate.
pub fn adapt_where(filters: &[Filter]) -> Option<Predicate> {
    Predicate::all(filters.iter().map(Filter::to_predicate))
}
