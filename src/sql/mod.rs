//! The SQL bridge.
//!
//! Text goes in through the tokenizer and parser, trees come out through the
//! emitter:
//!
//! - [`lexer`] - WHERE/HAVING clause tokenizer
//! - [`parser`] - recursive-descent predicate parser
//! - [`SqlPredicate`] - raw clause text, parsed lazily
//! - [`emit`] - expression trees to dialect SQL
//! - [`rewrite`] - alias substitution for post-aggregation filters
//! - [`query`] - the aggregate SELECT built by push-down engines
//! - [`token`] - output token types
//! - [`dialect`] - SQL dialect implementations

mod clause;
pub mod dialect;
pub mod emit;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod rewrite;
pub mod token;

#[cfg(test)]
pub mod test_utils;

pub use clause::{sql, sql_bigquery, sql_duckdb, SqlPredicate};
pub use dialect::{Dialect, SqlDialect};
pub use emit::Emitter;
pub use parser::parse_predicate;
pub use query::{AggregateQuery, SelectExpr, TableRef};
pub use rewrite::substitute_aliases;
pub use token::{Token, TokenStream};
