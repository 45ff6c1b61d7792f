//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: ANSI, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: BigQuery
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as the TRUE/FALSE keyword.
/// Used by: All dialects
pub fn format_bool_keyword(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

// =============================================================================
// Operators
// =============================================================================

/// `(CAST(l AS T) || CAST(r AS T))`
/// Used by: ANSI, DuckDB
pub fn concat_pipes(left: &str, right: &str, text_type: &str) -> String {
    format!(
        "(CAST({} AS {}) || CAST({} AS {}))",
        left, text_type, right, text_type
    )
}

/// `(CAST(n AS T) / NULLIF(CAST(d AS T), 0))`
/// Used by: ANSI, DuckDB
pub fn divide_nullif(numerator: &str, denominator: &str, float_type: &str) -> String {
    format!(
        "(CAST({} AS {}) / NULLIF(CAST({} AS {}), 0))",
        numerator, float_type, denominator, float_type
    )
}

// =============================================================================
// Functions
// =============================================================================

/// `FN(expr, pattern)` or `FN(expr, pattern, 'flags')`.
/// Used by: ANSI (REGEXP_LIKE), DuckDB (REGEXP_MATCHES)
pub fn regex_call(function: &str, expr: &str, pattern: &str, flags: &str) -> String {
    if flags.is_empty() {
        format!("{}({}, {})", function, expr, pattern)
    } else {
        format!(
            "{}({}, {}, {})",
            function,
            expr,
            pattern,
            quote_string_single(flags)
        )
    }
}
