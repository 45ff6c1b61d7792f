//! Rendering of expression trees as dialect SQL.
//!
//! Every compound form is parenthesized, so the output never depends on the
//! target's operator precedence. Rendering is deterministic: the same tree
//! always yields the same text.

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};
use crate::data::Value;
use crate::error::{ReportResult, ValidationError};
use crate::expr::pattern::{compile_regex, normalize_flags};
use crate::expr::{AggExpr, BinaryOp, BoolOp, CmpOp, Predicate, ScalarExpr};
use crate::model::{Measure, RowAgg};

/// Renders scalars, predicates and aggregates for one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter {
    dialect: Dialect,
}

impl Emitter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn render(&self, ts: &TokenStream) -> String {
        ts.serialize(self.dialect)
    }

    // =========================================================================
    // Leaves
    // =========================================================================

    /// A column reference; dotted names quote each part.
    pub fn column(&self, name: &str) -> String {
        Token::Path(name.split('.').map(String::from).collect()).serialize(self.dialect)
    }

    pub fn literal(&self, value: &Value) -> ReportResult<String> {
        Ok(literal_token(value)?.serialize(self.dialect))
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    pub fn scalar(&self, expr: &ScalarExpr) -> ReportResult<String> {
        match expr {
            ScalarExpr::Column { name } => Ok(self.column(name)),
            ScalarExpr::Literal { value } => self.literal(value),
            ScalarExpr::Binary { op, left, right } => {
                let l = self.scalar(left)?;
                let r = self.scalar(right)?;
                let op = match op {
                    BinaryOp::Concat => return Ok(self.dialect.concat(&l, &r)),
                    BinaryOp::Div => {
                        return self.coalesce_fill(self.dialect.null_safe_divide(&l, &r), 0.0)
                    }
                    BinaryOp::Add => Token::Plus,
                    BinaryOp::Sub => Token::Minus,
                    BinaryOp::Mul => Token::Mul,
                };
                Ok(self.infix(l, op, r))
            }
            ScalarExpr::SafeDiv {
                numerator,
                denominator,
                fill,
            } => {
                let divided = self
                    .dialect
                    .null_safe_divide(&self.scalar(numerator)?, &self.scalar(denominator)?);
                self.coalesce_fill(divided, *fill)
            }
            ScalarExpr::Coalesce { exprs } => {
                if exprs.is_empty() {
                    return Ok(Token::LitNull.serialize(self.dialect));
                }
                let args = exprs
                    .iter()
                    .map(|e| self.scalar(e))
                    .collect::<ReportResult<Vec<_>>>()?;
                Ok(self.call("COALESCE", &args))
            }
            ScalarExpr::CaseWhen { whens, otherwise } => {
                if whens.is_empty() {
                    return match otherwise {
                        Some(e) => self.scalar(e),
                        None => Ok(Token::LitNull.serialize(self.dialect)),
                    };
                }
                let mut ts = TokenStream::new();
                ts.lparen().push(Token::Case);
                for branch in whens {
                    ts.space()
                        .push(Token::When)
                        .space()
                        .raw(self.predicate(&branch.when)?)
                        .space()
                        .push(Token::Then)
                        .space()
                        .raw(self.scalar(&branch.then)?);
                }
                if let Some(e) = otherwise {
                    ts.space().push(Token::Else).space().raw(self.scalar(e)?);
                }
                ts.space().push(Token::End).rparen();
                Ok(self.render(&ts))
            }
            ScalarExpr::Fragment { sql } => Ok(format!("({})", sql)),
        }
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    pub fn predicate(&self, pred: &Predicate) -> ReportResult<String> {
        match pred {
            Predicate::Cmp { op, left, right } => {
                Ok(self.infix(self.scalar(left)?, cmp_token(*op), self.scalar(right)?))
            }
            Predicate::In { expr, values } => {
                if values.is_empty() {
                    let mut ts = TokenStream::new();
                    ts.lparen()
                        .push(Token::LitInt(1))
                        .space()
                        .push(Token::Eq)
                        .space()
                        .push(Token::LitInt(0))
                        .rparen();
                    return Ok(self.render(&ts));
                }
                let mut ts = TokenStream::new();
                ts.lparen()
                    .raw(self.scalar(expr)?)
                    .space()
                    .push(Token::In)
                    .space()
                    .lparen();
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(literal_token(value)?);
                }
                ts.rparen().rparen();
                Ok(self.render(&ts))
            }
            Predicate::Between {
                expr,
                left,
                right,
                inclusive,
            } => {
                let x = self.scalar(expr)?;
                let lower = if inclusive.lower() { Token::Gte } else { Token::Gt };
                let upper = if inclusive.upper() { Token::Lte } else { Token::Lt };
                let mut ts = TokenStream::new();
                ts.lparen()
                    .raw(x.clone())
                    .space()
                    .push(lower)
                    .space()
                    .push(literal_token(left)?)
                    .space()
                    .push(Token::And)
                    .space()
                    .raw(x)
                    .space()
                    .push(upper)
                    .space()
                    .push(literal_token(right)?)
                    .rparen();
                Ok(self.render(&ts))
            }
            Predicate::IsNull { expr } => {
                let mut ts = TokenStream::new();
                ts.lparen()
                    .raw(self.scalar(expr)?)
                    .space()
                    .push(Token::IsNull)
                    .rparen();
                Ok(self.render(&ts))
            }
            Predicate::Bool { op, left, right } => {
                let op = match op {
                    BoolOp::And => Token::And,
                    BoolOp::Or => Token::Or,
                };
                Ok(self.infix(self.predicate(left)?, op, self.predicate(right)?))
            }
            Predicate::Not { expr } => Ok(self.not(self.predicate(expr)?)),
            Predicate::Like {
                expr,
                pattern,
                ci,
                neg,
            } => {
                let x = self.scalar(expr)?;
                let p = self.scalar(pattern)?;
                let core = match (*ci, self.dialect.supports_ilike()) {
                    (false, _) => self.infix(x, Token::Like, p),
                    (true, true) => self.infix(x, Token::ILike, p),
                    (true, false) => self.infix(
                        self.call("LOWER", &[x]),
                        Token::Like,
                        self.call("LOWER", &[p]),
                    ),
                };
                Ok(if *neg { self.not(core) } else { core })
            }
            Predicate::Regex {
                expr,
                pattern,
                flags,
                neg,
            } => {
                let flags = normalize_flags(flags)?;
                if let Some(Value::Str(source)) = pattern.as_literal() {
                    compile_regex(source, &flags)?;
                }
                let core = self.dialect.regex_match(
                    &self.scalar(expr)?,
                    &self.scalar(pattern)?,
                    &flags,
                );
                Ok(if *neg { self.not(core) } else { core })
            }
            Predicate::Sql(sql) => self.predicate(sql.parsed()?),
        }
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    pub fn agg(&self, agg: &AggExpr) -> ReportResult<String> {
        match agg {
            AggExpr::Sum { expr } => Ok(self.call("SUM", &[self.scalar(expr)?])),
            AggExpr::Avg { expr } => Ok(self.call("AVG", &[self.scalar(expr)?])),
            AggExpr::Min { expr } => Ok(self.call("MIN", &[self.scalar(expr)?])),
            AggExpr::Max { expr } => Ok(self.call("MAX", &[self.scalar(expr)?])),
            AggExpr::Count { expr: None } => {
                let mut ts = TokenStream::new();
                ts.push(Token::FunctionName("count".into()))
                    .lparen()
                    .push(Token::Star)
                    .rparen();
                Ok(self.render(&ts))
            }
            AggExpr::Count { expr: Some(expr) } => Ok(self.call("COUNT", &[self.scalar(expr)?])),
            AggExpr::NUnique { expr } => self.count_distinct(expr),
            AggExpr::RatioOfSums {
                numerator,
                denominator,
                fill,
            } => {
                let num = self.call("SUM", &[self.scalar(numerator)?]);
                let den = self.call("SUM", &[self.scalar(denominator)?]);
                self.coalesce_fill(self.dialect.null_safe_divide(&num, &den), *fill)
            }
        }
    }

    /// The reduction of a row measure, applied around its row expression.
    pub fn row_agg(&self, agg: RowAgg, expr: &ScalarExpr) -> ReportResult<String> {
        let function = match agg {
            RowAgg::Sum => "SUM",
            RowAgg::Mean => "AVG",
            RowAgg::Min => "MIN",
            RowAgg::Max => "MAX",
            RowAgg::Count => "COUNT",
            RowAgg::NUnique => return self.count_distinct(expr),
        };
        Ok(self.call(function, &[self.scalar(expr)?]))
    }

    /// The aggregate SQL producing a measure's value for one group.
    pub fn measure(&self, measure: &Measure) -> ReportResult<String> {
        match measure {
            Measure::RowMeasure { agg, expr, .. } => self.row_agg(*agg, expr),
            Measure::AggMeasure { agg_expr, .. } => self.agg(agg_expr),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn infix(&self, left: String, op: Token, right: String) -> String {
        let mut ts = TokenStream::new();
        ts.lparen()
            .raw(left)
            .space()
            .push(op)
            .space()
            .raw(right)
            .rparen();
        self.render(&ts)
    }

    fn not(&self, inner: String) -> String {
        let mut ts = TokenStream::new();
        ts.lparen().push(Token::Not).space().raw(inner).rparen();
        self.render(&ts)
    }

    fn call(&self, function: &str, args: &[String]) -> String {
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName(function.into())).lparen();
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.raw(arg.as_str());
        }
        ts.rparen();
        self.render(&ts)
    }

    fn count_distinct(&self, expr: &ScalarExpr) -> ReportResult<String> {
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName("count".into()))
            .lparen()
            .push(Token::Distinct)
            .space()
            .raw(self.scalar(expr)?)
            .rparen();
        Ok(self.render(&ts))
    }

    fn coalesce_fill(&self, divided: String, fill: f64) -> ReportResult<String> {
        let fill = self.literal(&Value::Float(fill))?;
        Ok(self.call("COALESCE", &[divided, fill]))
    }
}

fn cmp_token(op: CmpOp) -> Token {
    match op {
        CmpOp::Eq => Token::Eq,
        CmpOp::Ne => Token::Ne,
        CmpOp::Gt => Token::Gt,
        CmpOp::Ge => Token::Gte,
        CmpOp::Lt => Token::Lt,
        CmpOp::Le => Token::Lte,
    }
}

fn literal_token(value: &Value) -> ReportResult<Token> {
    let token = match value {
        Value::Null => Token::LitNull,
        Value::Bool(b) => Token::LitBool(*b),
        Value::Int(n) => Token::LitInt(*n),
        Value::Float(f) if !f.is_finite() => {
            return Err(ValidationError::NonFiniteLiteral(*f).into())
        }
        Value::Float(f) => Token::LitFloat(*f),
        Value::Str(s) => Token::LitString(s.clone()),
        Value::Date(_) => Token::LitDate(value.to_string()),
        Value::Timestamp(_) => Token::LitTimestamp(value.to_string()),
    };
    Ok(token)
}
