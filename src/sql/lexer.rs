//! Tokenizer for WHERE/HAVING clause text.
//!
//! Produces [`Lexeme`]s carrying their byte span so the parser can report
//! errors against the original text.

use std::ops::Range;

use crate::error::SyntaxError;

/// Reserved words recognized case-insensitively. Any other bare word is an
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    Or,
    Not,
    In,
    Between,
    Is,
    Null,
    True,
    False,
    Like,
    ILike,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        let kw = match word.to_ascii_uppercase().as_str() {
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "IN" => Keyword::In,
            "BETWEEN" => Keyword::Between,
            "IS" => Keyword::Is,
            "NULL" => Keyword::Null,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            "LIKE" => Keyword::Like,
            "ILIKE" => Keyword::ILike,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Between => "BETWEEN",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Like => "LIKE",
            Keyword::ILike => "ILIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexemeKind {
    LParen,
    RParen,
    Comma,
    /// String literal, quotes removed and `''` unescaped.
    Str(String),
    /// Identifier, possibly dotted; quoted parts are unescaped.
    Ident(String),
    /// Numeric literal text.
    Number(String),
    /// Comparison or arithmetic operator.
    Op(&'static str),
    Keyword(Keyword),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub span: Range<usize>,
}

impl Lexeme {
    /// Source text of this lexeme, for error messages.
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.span.clone()]
    }
}

/// Split clause text into lexemes.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, SyntaxError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    out: Vec<Lexeme>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
            out: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    /// Byte offset of the current character (input length at end).
    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(o, _)| o)
            .unwrap_or(self.input.len())
    }

    fn emit(&mut self, kind: LexemeKind, start: usize) {
        let span = start..self.offset();
        self.out.push(Lexeme { kind, span });
    }

    fn run(mut self) -> Result<Vec<Lexeme>, SyntaxError> {
        while let Some(c) = self.peek() {
            let start = self.offset();
            match c {
                c if c.is_whitespace() => self.pos += 1,
                '-' if self.peek_at(1) == Some('-') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                '(' => {
                    self.pos += 1;
                    self.emit(LexemeKind::LParen, start);
                }
                ')' => {
                    self.pos += 1;
                    self.emit(LexemeKind::RParen, start);
                }
                ',' => {
                    self.pos += 1;
                    self.emit(LexemeKind::Comma, start);
                }
                '\'' => {
                    let text = self.quoted('\'', "unterminated string literal")?;
                    self.emit(LexemeKind::Str(text), start);
                }
                '"' | '`' => {
                    let name = self.quoted_identifier(c)?;
                    self.emit(LexemeKind::Ident(name), start);
                }
                c if c.is_ascii_digit() => self.number(start),
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number(start),
                c if c.is_alphabetic() || c == '_' => self.word(start),
                _ => self.operator(c, start)?,
            }
        }
        Ok(self.out)
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                break;
            }
        }
    }

    /// Skips to the closing `*/`, or to end of input when there is none.
    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(c) = self.peek() {
            if c == '*' && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    /// Read a `quote`-delimited run, where a doubled quote is one literal quote.
    fn quoted(&mut self, quote: char, unterminated: &str) -> Result<String, SyntaxError> {
        let start = self.offset();
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(SyntaxError::new(unterminated, start).with_found(quote.to_string()))
                }
                Some(c) if c == quote => {
                    if self.peek_at(1) == Some(quote) {
                        text.push(quote);
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        return Ok(text);
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// A quoted identifier, followed by any further `.`-separated parts.
    fn quoted_identifier(&mut self, quote: char) -> Result<String, SyntaxError> {
        let mut name = self.quoted(quote, "unterminated quoted identifier")?;
        while self.peek() == Some('.') {
            match self.peek_at(1) {
                Some(q @ ('"' | '`')) => {
                    self.pos += 1;
                    name.push('.');
                    name.push_str(&self.quoted(q, "unterminated quoted identifier")?);
                }
                Some(c) if is_ident_char(c) => {
                    self.pos += 1;
                    name.push('.');
                    while let Some(c) = self.peek().filter(|&c| is_ident_char(c) && c != '.') {
                        name.push(c);
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        Ok(name)
    }

    fn number(&mut self, start: usize) {
        self.digits();
        if self.peek() == Some('.') {
            self.pos += 1;
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1 + sign;
                self.digits();
            }
        }
        let text = self.input[start..self.offset()].to_string();
        self.emit(LexemeKind::Number(text), start);
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn word(&mut self, start: usize) {
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        let word = &self.input[start..self.offset()];
        let kind = match Keyword::lookup(word) {
            Some(kw) => LexemeKind::Keyword(kw),
            None => LexemeKind::Ident(word.to_string()),
        };
        self.emit(kind, start);
    }

    fn operator(&mut self, c: char, start: usize) -> Result<(), SyntaxError> {
        let two = match (c, self.peek_at(1)) {
            ('>', Some('=')) => Some(">="),
            ('<', Some('=')) => Some("<="),
            ('<', Some('>')) => Some("<>"),
            ('!', Some('=')) => Some("!="),
            ('=', Some('=')) => Some("=="),
            _ => None,
        };
        if let Some(op) = two {
            self.pos += 2;
            self.emit(LexemeKind::Op(op), start);
            return Ok(());
        }
        let op = match c {
            '=' => "=",
            '<' => "<",
            '>' => ">",
            '+' => "+",
            '-' => "-",
            '*' => "*",
            '/' => "/",
            other => {
                return Err(SyntaxError::new(
                    format!("unexpected character '{}'", other),
                    start,
                )
                .with_found(other.to_string()))
            }
        };
        self.pos += 1;
        self.emit(LexemeKind::Op(op), start);
        Ok(())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.')
}
