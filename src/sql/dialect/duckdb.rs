//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible with extensions:
//! - ANSI identifier quoting (`"`)
//! - Native `ILIKE`
//! - `REGEXP_MATCHES(x, pattern, options)` for regex search
//! - `DATE_TRUNC` on dates and timestamps (weeks start on Monday)

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn regex_match(&self, expr: &str, pattern: &str, flags: &str) -> String {
        helpers::regex_call("REGEXP_MATCHES", expr, pattern, flags)
    }
}
