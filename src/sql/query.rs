//! Aggregate query builder used by the push-down engines.
//!
//! Produces one statement shape:
//!
//! ```text
//! SELECT
//!   <key> AS <alias>, ...,
//!   <aggregate> AS <alias>, ...
//! FROM <table>
//! WHERE <filter>
//! GROUP BY 1, 2, ...
//! HAVING <post-aggregation filter>
//! ```
//!
//! Clause bodies arrive already rendered by the [`Emitter`](super::Emitter).

use super::dialect::Dialect;
use super::token::{Token, TokenStream};

// =============================================================================
// Select Expression (rendered SQL with alias)
// =============================================================================

/// A SELECT list item.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub sql: String,
    pub alias: String,
}

impl SelectExpr {
    pub fn new(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            alias: alias.into(),
        }
    }

    fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.raw(self.sql.as_str())
            .space()
            .push(Token::As)
            .space()
            .push(Token::Ident(self.alias.clone()));
        ts
    }
}

// =============================================================================
// Table Reference
// =============================================================================

/// The FROM target. A single quoted identifier, which may itself contain
/// dots (BigQuery's `` `project.dataset.table` ``).
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// =============================================================================
// Aggregate Query
// =============================================================================

/// `SELECT keys, aggregates FROM table [WHERE] [GROUP BY] [HAVING]`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct AggregateQuery {
    keys: Vec<SelectExpr>,
    aggregates: Vec<SelectExpr>,
    from: TableRef,
    where_clause: Option<String>,
    having: Option<String>,
}

impl AggregateQuery {
    pub fn new(from: TableRef) -> Self {
        Self {
            keys: Vec::new(),
            aggregates: Vec::new(),
            from,
            where_clause: None,
            having: None,
        }
    }

    /// Add a grouping key. Keys come first in the SELECT list and are
    /// grouped by position.
    pub fn key(mut self, sql: impl Into<String>, alias: impl Into<String>) -> Self {
        self.keys.push(SelectExpr::new(sql, alias));
        self
    }

    pub fn aggregate(mut self, sql: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aggregates.push(SelectExpr::new(sql, alias));
        self
    }

    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.where_clause = Some(condition.into());
        self
    }

    pub fn having(mut self, condition: impl Into<String>) -> Self {
        self.having = Some(condition.into());
        self
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        // SELECT
        ts.push(Token::Select);
        for (i, item) in self.keys.iter().chain(&self.aggregates).enumerate() {
            if i == 0 {
                ts.newline().indent(1);
            } else {
                ts.comma().newline().indent(1);
            }
            ts.append(&item.to_tokens());
        }

        // FROM
        ts.newline()
            .push(Token::From)
            .space()
            .push(Token::Ident(self.from.name.clone()));

        // WHERE
        if let Some(condition) = &self.where_clause {
            ts.newline().push(Token::Where).space().raw(condition.as_str());
        }

        // GROUP BY
        if !self.keys.is_empty() {
            ts.newline().push(Token::GroupBy).space();
            for i in 0..self.keys.len() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.push(Token::LitInt(i as i64 + 1));
            }
        }

        // HAVING
        if let Some(condition) = &self.having {
            ts.newline().push(Token::Having).space().raw(condition.as_str());
        }

        ts
    }

    /// Generate SQL string for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }
}

// =============================================================================
// Tests
// =============================================================================
