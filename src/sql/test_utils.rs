//! Test utilities for SQL emission validation.
//!
//! Checks that emitted SQL parses in the target dialect's grammar using
//! sqlparser-rs.

use sqlparser::dialect::{BigQueryDialect, DuckDbDialect, GenericDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL statement is syntactically valid for the given dialect.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Ansi => Box::new(GenericDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::BigQuery => Box::new(BigQueryDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {:?}: {}\nSQL: {}", dialect, e, sql))
}

/// Validates a standalone WHERE-clause expression by wrapping it in a SELECT.
pub fn validate_condition(condition: &str, dialect: Dialect) -> Result<(), String> {
    validate_sql(&format!("SELECT 1 FROM t WHERE {}", condition), dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM users", Dialect::Ansi).unwrap();
        validate_sql("SELECT * FROM `p.d.users`", Dialect::BigQuery).unwrap();
        validate_condition("(\"a\" > 1)", Dialect::DuckDb).unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM users", Dialect::DuckDb);
        assert!(result.is_err());
    }
}
