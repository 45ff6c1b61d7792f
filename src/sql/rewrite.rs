//! Alias substitution for post-aggregation filters.
//!
//! A HAVING clause written against measure names (`ctr > 0.1`) cannot refer
//! to SELECT aliases in every dialect. Before emission, each column reference
//! naming a measure is replaced by a [`ScalarExpr::Fragment`] holding that
//! measure's aggregate SQL.

use std::collections::HashMap;

use crate::error::ReportResult;
use crate::expr::{Predicate, ScalarExpr, WhenBranch};

/// Rewrite `pred`, replacing references to keys of `aliases` with the
/// mapped SQL text. Raw SQL predicates are parsed first.
pub fn substitute_aliases(
    pred: &Predicate,
    aliases: &HashMap<String, String>,
) -> ReportResult<Predicate> {
    let rewritten = match pred {
        Predicate::Cmp { op, left, right } => Predicate::Cmp {
            op: *op,
            left: substitute_scalar(left, aliases)?,
            right: substitute_scalar(right, aliases)?,
        },
        Predicate::In { expr, values } => Predicate::In {
            expr: substitute_scalar(expr, aliases)?,
            values: values.clone(),
        },
        Predicate::Between {
            expr,
            left,
            right,
            inclusive,
        } => Predicate::Between {
            expr: substitute_scalar(expr, aliases)?,
            left: left.clone(),
            right: right.clone(),
            inclusive: *inclusive,
        },
        Predicate::IsNull { expr } => Predicate::IsNull {
            expr: substitute_scalar(expr, aliases)?,
        },
        Predicate::Bool { op, left, right } => Predicate::Bool {
            op: *op,
            left: Box::new(substitute_aliases(left, aliases)?),
            right: Box::new(substitute_aliases(right, aliases)?),
        },
        Predicate::Not { expr } => Predicate::Not {
            expr: Box::new(substitute_aliases(expr, aliases)?),
        },
        Predicate::Like {
            expr,
            pattern,
            ci,
            neg,
        } => Predicate::Like {
            expr: substitute_scalar(expr, aliases)?,
            pattern: substitute_scalar(pattern, aliases)?,
            ci: *ci,
            neg: *neg,
        },
        Predicate::Regex {
            expr,
            pattern,
            flags,
            neg,
        } => Predicate::Regex {
            expr: substitute_scalar(expr, aliases)?,
            pattern: substitute_scalar(pattern, aliases)?,
            flags: flags.clone(),
            neg: *neg,
        },
        Predicate::Sql(sql) => substitute_aliases(sql.parsed()?, aliases)?,
    };
    Ok(rewritten)
}

fn substitute_scalar(
    expr: &ScalarExpr,
    aliases: &HashMap<String, String>,
) -> ReportResult<ScalarExpr> {
    let rewritten = match expr {
        ScalarExpr::Column { name } => match aliases.get(name) {
            Some(sql) => ScalarExpr::Fragment { sql: sql.clone() },
            None => expr.clone(),
        },
        ScalarExpr::Literal { .. } | ScalarExpr::Fragment { .. } => expr.clone(),
        ScalarExpr::Binary { op, left, right } => ScalarExpr::binary(
            *op,
            substitute_scalar(left, aliases)?,
            substitute_scalar(right, aliases)?,
        ),
        ScalarExpr::SafeDiv {
            numerator,
            denominator,
            fill,
        } => ScalarExpr::SafeDiv {
            numerator: Box::new(substitute_scalar(numerator, aliases)?),
            denominator: Box::new(substitute_scalar(denominator, aliases)?),
            fill: *fill,
        },
        ScalarExpr::Coalesce { exprs } => ScalarExpr::Coalesce {
            exprs: exprs
                .iter()
                .map(|e| substitute_scalar(e, aliases))
                .collect::<ReportResult<_>>()?,
        },
        ScalarExpr::CaseWhen { whens, otherwise } => ScalarExpr::CaseWhen {
            whens: whens
                .iter()
                .map(|b| {
                    Ok(WhenBranch {
                        when: substitute_aliases(&b.when, aliases)?,
                        then: substitute_scalar(&b.then, aliases)?,
                    })
                })
                .collect::<ReportResult<_>>()?,
            otherwise: match otherwise {
                Some(e) => Some(Box::new(substitute_scalar(e, aliases)?)),
                None => None,
            },
        },
    };
    Ok(rewritten)
}
