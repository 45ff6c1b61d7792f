//! SQL dialect definitions and formatting rules.
//!
//! Each dialect implements `SqlDialect` to handle the places where push-down
//! targets disagree:
//!
//! - Identifier quoting: `"` (ANSI/DuckDB) vs `` ` `` (BigQuery)
//! - String concatenation: `||` vs `CONCAT()`
//! - Null-safe division: `NULLIF` vs `SAFE_DIVIDE()`
//! - Case-insensitive LIKE: native `ILIKE` vs `LOWER(..) LIKE LOWER(..)`
//! - Regular expressions: `REGEXP_LIKE` / `REGEXP_MATCHES` / `REGEXP_CONTAINS`
//! - Date truncation: `DATE_TRUNC('month', x)` vs `DATE_TRUNC(DATE(x), MONTH)`
//!
//! # Usage
//!
//! ```ignore
//! use tabula::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::BigQuery;
//! let quoted = dialect.quote_identifier("country");  // `country`
//! ```

mod ansi;
mod bigquery;
mod duckdb;
pub mod helpers;

pub use ansi::Ansi;
pub use bigquery::BigQuery;
pub use duckdb::DuckDb;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::TimeGrain;

/// SQL dialect trait - defines how to format SQL for a specific database.
///
/// Dialects implement the methods they need to override; defaults follow
/// the ANSI rendering.
pub trait SqlDialect: Send + Sync + std::fmt::Debug {
    /// Dialect name for debugging/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifiers & Literals
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal. Single quotes, doubled to escape.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_keyword(b)
    }

    /// Format a date literal (`YYYY-MM-DD`).
    fn format_date_literal(&self, date: &str) -> String {
        format!("DATE {}", self.quote_string(date))
    }

    /// Format a timestamp literal (`YYYY-MM-DD HH:MM:SS`).
    fn format_timestamp_literal(&self, ts: &str) -> String {
        format!("TIMESTAMP {}", self.quote_string(ts))
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Concatenate two rendered expressions as text.
    fn concat(&self, left: &str, right: &str) -> String {
        helpers::concat_pipes(left, right, "VARCHAR")
    }

    /// Divide two rendered expressions, yielding NULL on a zero denominator.
    fn null_safe_divide(&self, numerator: &str, denominator: &str) -> String {
        helpers::divide_nullif(numerator, denominator, "DOUBLE")
    }

    /// Whether this dialect has a native `ILIKE` operator.
    fn supports_ilike(&self) -> bool {
        false
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Regular-expression search. `flags` is already normalized (subset of `ims`).
    fn regex_match(&self, expr: &str, pattern: &str, flags: &str) -> String {
        helpers::regex_call("REGEXP_LIKE", expr, pattern, flags)
    }

    /// Truncate a date or timestamp expression to the start of its bucket,
    /// yielding a DATE.
    fn date_trunc(&self, expr: &str, grain: TimeGrain) -> String {
        format!("CAST(DATE_TRUNC('{}', {}) AS DATE)", grain.name(), expr)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ansi,
    #[serde(rename = "duckdb")]
    DuckDb,
    #[serde(rename = "bigquery")]
    BigQuery,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Ansi => &Ansi,
            Dialect::DuckDb => &DuckDb,
            Dialect::BigQuery => &BigQuery,
        }
    }

    pub fn all() -> [Dialect; 3] {
        [Dialect::Ansi, Dialect::DuckDb, Dialect::BigQuery]
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_date_literal(&self, date: &str) -> String {
        self.dialect().format_date_literal(date)
    }

    fn format_timestamp_literal(&self, ts: &str) -> String {
        self.dialect().format_timestamp_literal(ts)
    }

    fn concat(&self, left: &str, right: &str) -> String {
        self.dialect().concat(left, right)
    }

    fn null_safe_divide(&self, numerator: &str, denominator: &str) -> String {
        self.dialect().null_safe_divide(numerator, denominator)
    }

    fn supports_ilike(&self) -> bool {
        self.dialect().supports_ilike()
    }

    fn regex_match(&self, expr: &str, pattern: &str, flags: &str) -> String {
        self.dialect().regex_match(expr, pattern, flags)
    }

    fn date_trunc(&self, expr: &str, grain: TimeGrain) -> String {
        self.dialect().date_trunc(expr, grain)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ansi" => Ok(Dialect::Ansi),
            "duckdb" => Ok(Dialect::DuckDb),
            "bigquery" => Ok(Dialect::BigQuery),
            other => Err(format!(
                "unknown dialect '{}' (expected ansi, duckdb or bigquery)",
                other
            )),
        }
    }
}
