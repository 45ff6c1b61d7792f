//! In-process evaluation of scalar expressions and predicates.
//!
//! Predicates use SQL three-valued logic: a row evaluates to `Some(true)`,
//! `Some(false)` or `None` (unknown). Filters keep only `Some(true)` rows,
//! which is what a WHERE or HAVING clause does in a SQL backend.

use std::cmp::Ordering;

use regex::Regex;

use super::pattern::{normalize_flags, PatternCache};
use super::{BinaryOp, BoolOp, CmpOp, Inclusive, Predicate, ScalarExpr};
use crate::data::{Frame, Value};
use crate::error::{ReportResult, ValidationError};

impl ScalarExpr {
    /// Evaluate against every row of `frame`.
    pub fn eval(&self, frame: &Frame) -> ReportResult<Vec<Value>> {
        let n = frame.len();
        match self {
            ScalarExpr::Column { name } => Ok(frame.require(name)?.values.clone()),
            ScalarExpr::Literal { value } => Ok(vec![value.clone(); n]),
            ScalarExpr::Binary { op, left, right } => {
                let l = left.eval(frame)?;
                let r = right.eval(frame)?;
                l.iter().zip(&r).map(|(a, b)| arith(*op, a, b)).collect()
            }
            ScalarExpr::SafeDiv {
                numerator,
                denominator,
                fill,
            } => {
                let num = numerator.eval(frame)?;
                let den = denominator.eval(frame)?;
                num.iter()
                    .zip(&den)
                    .map(|(a, b)| safe_divide(a, b, *fill))
                    .collect()
            }
            ScalarExpr::Coalesce { exprs } => {
                let mut out = vec![Value::Null; n];
                for expr in exprs {
                    if out.iter().all(|v| !v.is_null()) {
                        break;
                    }
                    for (slot, value) in out.iter_mut().zip(expr.eval(frame)?) {
                        if slot.is_null() {
                            *slot = value;
                        }
                    }
                }
                Ok(out)
            }
            // Each branch only sees the rows still open when it is reached,
            // and a result is only evaluated over the rows it produces.
            ScalarExpr::CaseWhen { whens, otherwise } => {
                let mut out = vec![Value::Null; n];
                let mut pending: Vec<usize> = (0..n).collect();
                for branch in whens {
                    if pending.is_empty() {
                        break;
                    }
                    let hits = branch.when.eval(&frame.take(&pending))?;
                    let (picked, rest): (Vec<_>, Vec<_>) = pending
                        .iter()
                        .copied()
                        .zip(hits)
                        .partition(|(_, hit)| *hit == Some(true));
                    pending = rest.into_iter().map(|(i, _)| i).collect();
                    if picked.is_empty() {
                        continue;
                    }
                    let picked: Vec<usize> = picked.into_iter().map(|(i, _)| i).collect();
                    let values = branch.then.eval(&frame.take(&picked))?;
                    for (i, value) in picked.into_iter().zip(values) {
                        out[i] = value;
                    }
                }
                if let Some(otherwise) = otherwise {
                    if !pending.is_empty() {
                        let values = otherwise.eval(&frame.take(&pending))?;
                        for (i, value) in pending.into_iter().zip(values) {
                            out[i] = value;
                        }
                    }
                }
                Ok(out)
            }
            ScalarExpr::Fragment { sql } => Err(ValidationError::NotEvaluable(sql.clone()).into()),
        }
    }
}

impl Predicate {
    /// Evaluate to a three-valued result per row.
    pub fn eval(&self, frame: &Frame) -> ReportResult<Vec<Option<bool>>> {
        match self {
            Predicate::Cmp { op, left, right } => {
                let l = left.eval(frame)?;
                let r = right.eval(frame)?;
                Ok(l.iter().zip(&r).map(|(a, b)| compare(*op, a, b)).collect())
            }
            Predicate::In { expr, values } => Ok(expr
                .eval(frame)?
                .iter()
                .map(|v| membership(v, values))
                .collect()),
            Predicate::Between {
                expr,
                left,
                right,
                inclusive,
            } => Ok(expr
                .eval(frame)?
                .iter()
                .map(|v| in_range(v, left, right, *inclusive))
                .collect()),
            Predicate::IsNull { expr } => {
                Ok(expr.eval(frame)?.iter().map(|v| Some(v.is_null())).collect())
            }
            Predicate::Bool { op, left, right } => {
                let l = left.eval(frame)?;
                let r = right.eval(frame)?;
                let combine: fn(Option<bool>, Option<bool>) -> Option<bool> = match op {
                    BoolOp::And => kleene_and,
                    BoolOp::Or => kleene_or,
                };
                Ok(l.into_iter().zip(r).map(|(a, b)| combine(a, b)).collect())
            }
            Predicate::Not { expr } => Ok(expr
                .eval(frame)?
                .into_iter()
                .map(|b| b.map(|x| !x))
                .collect()),
            Predicate::Like {
                expr,
                pattern,
                ci,
                neg,
            } => match_pattern(frame, expr, pattern, Matcher::Like(*ci), *neg),
            Predicate::Regex {
                expr,
                pattern,
                flags,
                neg,
            } => {
                let flags = normalize_flags(flags)?;
                match_pattern(frame, expr, pattern, Matcher::Regex(&flags), *neg)
            }
            Predicate::Sql(sql) => sql.parsed()?.eval(frame),
        }
    }

    /// Boolean mask keeping rows where the predicate is true.
    pub fn mask(&self, frame: &Frame) -> ReportResult<Vec<bool>> {
        Ok(self
            .eval(frame)?
            .into_iter()
            .map(|b| b == Some(true))
            .collect())
    }
}

// =============================================================================
// Row-level helpers
// =============================================================================

fn numeric(value: &Value, op: &str) -> ReportResult<f64> {
    value.as_f64().ok_or_else(|| {
        ValidationError::TypeMismatch(format!(
            "operator {} is not defined for {} value {}",
            op,
            value.type_name(),
            value
        ))
        .into()
    })
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div | BinaryOp::Concat => x / y,
    }
}

/// Apply a binary operator to two cells. Nulls propagate, except through
/// `/`, which divides safely with a zero fill.
pub(crate) fn arith(op: BinaryOp, a: &Value, b: &Value) -> ReportResult<Value> {
    if op == BinaryOp::Div {
        return safe_divide(a, b, 0.0);
    }
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    if op == BinaryOp::Concat {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        let exact = match op {
            BinaryOp::Add => x.checked_add(*y),
            BinaryOp::Sub => x.checked_sub(*y),
            BinaryOp::Mul => x.checked_mul(*y),
            BinaryOp::Div | BinaryOp::Concat => None,
        };
        if let Some(v) = exact {
            return Ok(Value::Int(v));
        }
    }
    let x = numeric(a, op.symbol())?;
    let y = numeric(b, op.symbol())?;
    Ok(Value::Float(float_op(op, x, y)))
}

/// Division with a fill for zero or null denominators (and null numerators).
pub(crate) fn safe_divide(num: &Value, den: &Value, fill: f64) -> ReportResult<Value> {
    if num.is_null() || den.is_null() {
        return Ok(Value::Float(fill));
    }
    let d = numeric(den, "/")?;
    if d == 0.0 {
        return Ok(Value::Float(fill));
    }
    Ok(Value::Float(numeric(num, "/")? / d))
}

fn compare(op: CmpOp, a: &Value, b: &Value) -> Option<bool> {
    match op {
        CmpOp::Eq => a.sql_eq(b),
        CmpOp::Ne => a.sql_eq(b).map(|eq| !eq),
        _ => {
            let ord = a.compare(b)?;
            Some(match op {
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Ge => ord != Ordering::Less,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
                CmpOp::Eq | CmpOp::Ne => ord == Ordering::Equal,
            })
        }
    }
}

/// An empty set is false for every input, null included, matching the
/// `(1 = 0)` the emitter renders for it.
fn membership(value: &Value, set: &[Value]) -> Option<bool> {
    if set.is_empty() {
        return Some(false);
    }
    if value.is_null() {
        return None;
    }
    if set.iter().any(|v| value.sql_eq(v) == Some(true)) {
        return Some(true);
    }
    if set.iter().any(Value::is_null) {
        return None;
    }
    Some(false)
}

fn in_range(value: &Value, low: &Value, high: &Value, inclusive: Inclusive) -> Option<bool> {
    let above = value.compare(low).map(|o| match inclusive.lower() {
        true => o != Ordering::Less,
        false => o == Ordering::Greater,
    });
    let below = value.compare(high).map(|o| match inclusive.upper() {
        true => o != Ordering::Greater,
        false => o == Ordering::Less,
    });
    kleene_and(above, below)
}

fn kleene_and(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn kleene_or(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

enum Matcher<'a> {
    Like(bool),
    Regex(&'a str),
}

impl Matcher<'_> {
    fn lookup<'c>(&self, cache: &'c mut PatternCache, pattern: &str) -> ReportResult<&'c Regex> {
        match self {
            Matcher::Like(ci) => cache.like(pattern, *ci),
            Matcher::Regex(flags) => cache.regex(pattern, flags),
        }
    }
}

fn match_pattern(
    frame: &Frame,
    expr: &ScalarExpr,
    pattern: &ScalarExpr,
    matcher: Matcher<'_>,
    neg: bool,
) -> ReportResult<Vec<Option<bool>>> {
    let values = expr.eval(frame)?;
    let patterns = pattern.eval(frame)?;
    let mut cache = PatternCache::default();
    values
        .iter()
        .zip(&patterns)
        .map(|(value, pat)| {
            if value.is_null() || pat.is_null() {
                return Ok(None);
            }
            let re = matcher.lookup(&mut cache, &pat.to_string())?;
            Ok(Some(re.is_match(&value.to_string()) != neg))
        })
        .collect()
}
