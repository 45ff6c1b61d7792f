//! BigQuery SQL dialect.
//!
//! BigQuery features:
//! - Backtick identifier quoting (double quotes are string literals)
//! - `CONCAT()` instead of `||` on mixed types, `STRING` as the text type
//! - `SAFE_DIVIDE()` for null-safe division, `FLOAT64` as the float type
//! - `REGEXP_CONTAINS()` with inline `(?flags)` instead of a flags argument
//! - `DATE_TRUNC(date, PART)` with `WEEK(MONDAY)` for ISO weeks

use super::helpers;
use super::SqlDialect;
use crate::model::TimeGrain;

/// BigQuery SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn concat(&self, left: &str, right: &str) -> String {
        format!("CONCAT(CAST({} AS STRING), CAST({} AS STRING))", left, right)
    }

    fn null_safe_divide(&self, numerator: &str, denominator: &str) -> String {
        format!(
            "SAFE_DIVIDE(CAST({} AS FLOAT64), CAST({} AS FLOAT64))",
            numerator, denominator
        )
    }

    fn regex_match(&self, expr: &str, pattern: &str, flags: &str) -> String {
        if flags.is_empty() {
            format!("REGEXP_CONTAINS({}, {})", expr, pattern)
        } else {
            let prefix = helpers::quote_string_single(&format!("(?{})", flags));
            format!("REGEXP_CONTAINS({}, CONCAT({}, {}))", expr, prefix, pattern)
        }
    }

    fn date_trunc(&self, expr: &str, grain: TimeGrain) -> String {
        let part = match grain {
            TimeGrain::Day => "DAY",
            TimeGrain::Week => "WEEK(MONDAY)",
            TimeGrain::Month => "MONTH",
            TimeGrain::Quarter => "QUARTER",
            TimeGrain::Year => "YEAR",
        };
        format!("DATE_TRUNC(DATE({}), {})", expr, part)
    }
}
