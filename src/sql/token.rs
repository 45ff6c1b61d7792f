//! Output tokens for emitted SQL.
//!
//! The emitter and the query builder never concatenate dialect-specific
//! text themselves: they push tokens, and quoting, literal syntax and
//! boolean spelling are decided when the stream is rendered for a dialect.

use super::dialect::{Dialect, SqlDialect};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // keywords
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    GroupBy,
    Having,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Like,
    ILike,
    IsNull,
    Distinct,

    // punctuation and operators
    Comma,
    Star,
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,

    // layout
    Space,
    Newline,
    Indent(usize),

    /// A single identifier, quoted as one unit.
    Ident(String),
    /// A dotted reference; each part is quoted on its own: `"t"."col"`.
    Path(Vec<String>),
    LitInt(i64),
    /// Must be finite. The emitter rejects NaN and infinities before
    /// building a token.
    LitFloat(f64),
    LitString(String),
    LitBool(bool),
    LitNull,
    /// `YYYY-MM-DD`
    LitDate(String),
    /// `YYYY-MM-DD HH:MM:SS`
    LitTimestamp(String),
    FunctionName(String),
    /// Already-rendered SQL from this crate. Never user text.
    Raw(String),
}

impl Token {
    /// Text of tokens that read the same in every dialect.
    fn fixed(&self) -> Option<&'static str> {
        let text = match self {
            Token::Select => "SELECT",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::As => "AS",
            Token::GroupBy => "GROUP BY",
            Token::Having => "HAVING",
            Token::Case => "CASE",
            Token::When => "WHEN",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::End => "END",
            Token::In => "IN",
            Token::Like => "LIKE",
            Token::ILike => "ILIKE",
            Token::IsNull => "IS NULL",
            Token::Distinct => "DISTINCT",
            Token::Comma => ",",
            Token::Star | Token::Mul => "*",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Eq => "=",
            Token::Ne => "<>",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Lte => "<=",
            Token::Gte => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Space => " ",
            Token::Newline => "\n",
            Token::LitNull => "NULL",
            _ => return None,
        };
        Some(text)
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        if let Some(text) = self.fixed() {
            return text.to_string();
        }
        match self {
            Token::Indent(depth) => "  ".repeat(*depth),
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::Path(parts) => parts
                .iter()
                .map(|part| dialect.quote_identifier(part))
                .collect::<Vec<_>>()
                .join("."),
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => {
                debug_assert!(f.is_finite(), "non-finite float reached SQL output");
                ryu::Buffer::new().format(*f).to_string()
            }
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).to_string(),
            Token::LitDate(d) => dialect.format_date_literal(d),
            Token::LitTimestamp(ts) => dialect.format_timestamp_literal(ts),
            Token::FunctionName(name) => name.to_uppercase(),
            Token::Raw(sql) => sql.clone(),
            fixed => unreachable!("{:?} has fixed text", fixed),
        }
    }
}

/// Tokens in output order, with chainable push helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend_from_slice(&other.tokens);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }

    pub fn indent(&mut self, depth: usize) -> &mut Self {
        self.push(Token::Indent(depth))
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }

    pub fn raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push(Token::Raw(sql.into()))
    }
}
