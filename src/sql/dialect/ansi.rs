//! ANSI SQL dialect - base reference implementation.
//!
//! Used for clause text that is not bound to a particular backend. Every
//! trait default is the ANSI rendering, so this dialect only names itself
//! and picks a quoting style.

use super::helpers;
use super::SqlDialect;

/// ANSI SQL dialect (reference implementation).
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }
}
