//! Raw SQL filter text used as a predicate.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::dialect::Dialect;
use super::parser::parse_predicate;
use crate::error::{ReportResult, SyntaxError};
use crate::expr::Predicate;

/// A WHERE/HAVING clause kept as text and parsed on first use.
///
/// Serializes as `{sql, dialect}`; the parsed tree is a cache and is never
/// serialized. Equality compares the text and dialect only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlPredicate {
    pub sql: String,
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(skip)]
    parsed: OnceCell<Result<Box<Predicate>, SyntaxError>>,
}

impl SqlPredicate {
    pub fn new(sql: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            sql: sql.into(),
            dialect,
            parsed: OnceCell::new(),
        }
    }

    /// The parsed predicate tree. Parsing happens once; later calls return
    /// the cached tree or the cached error.
    pub fn parsed(&self) -> ReportResult<&Predicate> {
        let parsed = self.parsed.get_or_init(|| {
            let (body, offset) = strip_clause_keyword(&self.sql);
            tracing::trace!(sql = %self.sql, dialect = %self.dialect, "parsing SQL predicate");
            parse_predicate(body)
                .map(Box::new)
                .map_err(|e| e.shifted(offset))
        });
        match parsed {
            Ok(pred) => Ok(pred.as_ref()),
            Err(e) => Err(e.clone().into()),
        }
    }
}

impl PartialEq for SqlPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.sql == other.sql && self.dialect == other.dialect
    }
}

/// Strip leading whitespace and an optional `WHERE` / `HAVING` keyword.
/// Returns the remaining text and its byte offset into `sql`.
fn strip_clause_keyword(sql: &str) -> (&str, usize) {
    let trimmed = sql.trim_start();
    let mut offset = sql.len() - trimmed.len();
    for keyword in ["WHERE", "HAVING"] {
        let Some(head) = trimmed.get(..keyword.len()) else {
            continue;
        };
        let rest = &trimmed[keyword.len()..];
        if head.eq_ignore_ascii_case(keyword) && rest.starts_with(char::is_whitespace) {
            offset += keyword.len();
            return (rest, offset);
        }
    }
    (trimmed, offset)
}

impl From<&str> for Predicate {
    fn from(text: &str) -> Self {
        sql(text)
    }
}

impl From<String> for Predicate {
    fn from(text: String) -> Self {
        sql(text)
    }
}

/// Clause text in the ANSI dialect.
pub fn sql(text: impl Into<String>) -> Predicate {
    Predicate::Sql(SqlPredicate::new(text, Dialect::Ansi))
}

/// Clause text in the DuckDB dialect.
pub fn sql_duckdb(text: impl Into<String>) -> Predicate {
    Predicate::Sql(SqlPredicate::new(text, Dialect::DuckDb))
}

/// Clause text in the BigQuery dialect.
pub fn sql_bigquery(text: impl Into<String>) -> Predicate {
    Predicate::Sql(SqlPredicate::new(text, Dialect::BigQuery))
}
