//! Recursive-descent parser from clause text to a [`Predicate`] tree.
//!
//! Precedence, loosest first:
//!
//! ```text
//! OR < AND < NOT < comparison / IN / BETWEEN / LIKE / IS NULL
//!    < additive (+ -) < multiplicative (* /) < unary minus < primary
//! ```
//!
//! `NOT` directly in front of IN, BETWEEN, LIKE or ILIKE belongs to that
//! construct; anywhere else it negates the whole following predicate.

use super::lexer::{tokenize, Keyword, Lexeme, LexemeKind};
use crate::data::Value;
use crate::error::SyntaxError;
use crate::expr::{BinaryOp, CmpOp, ExprExt, Inclusive, Predicate, ScalarExpr};

type ParseResult<T> = Result<T, SyntaxError>;

/// Parse a WHERE/HAVING-style clause (without the keyword) into a predicate.
pub fn parse_predicate(input: &str) -> ParseResult<Predicate> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let pred = parser.or_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error_at(tok, "unexpected trailing input"));
    }
    Ok(pred)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Cursor
    // =========================================================================

    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self, ahead: usize) -> Option<&LexemeKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn at_keyword(&self, ahead: usize, kw: Keyword) -> bool {
        self.peek_kind(ahead) == Some(&LexemeKind::Keyword(kw))
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        let hit = self.at_keyword(0, kw);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn eat(&mut self, kind: &LexemeKind) -> bool {
        let hit = self.peek_kind(0) == Some(kind);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn next(&mut self) -> Option<Lexeme> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error_at(&self, tok: &Lexeme, message: &str) -> SyntaxError {
        SyntaxError::new(message, tok.span.start).with_found(tok.text(self.input))
    }

    /// Error at the current token, or at end of input.
    fn error_here(&self, message: &str) -> SyntaxError {
        match self.peek() {
            Some(tok) => self.error_at(tok, message),
            None => SyntaxError::new(format!("{} (found end of input)", message), self.input.len()),
        }
    }

    fn expect(&mut self, kind: &LexemeKind, what: &str) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected {}", what)))
        }
    }

    // =========================================================================
    // Boolean layers
    // =========================================================================

    fn or_expr(&mut self) -> ParseResult<Predicate> {
        let mut left = self.and_expr()?;
        while self.eat_keyword(Keyword::Or) {
            left = left.or(self.and_expr()?);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ParseResult<Predicate> {
        let mut left = self.not_expr()?;
        while self.eat_keyword(Keyword::And) {
            left = left.and(self.not_expr()?);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> ParseResult<Predicate> {
        if self.eat_keyword(Keyword::Not) {
            return Ok(self.not_expr()?.negate());
        }
        self.predicate()
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    fn predicate(&mut self) -> ParseResult<Predicate> {
        if self.peek_kind(0) == Some(&LexemeKind::LParen) {
            let saved = self.pos;
            self.pos += 1;
            let grouped = self
                .or_expr()
                .and_then(|p| self.expect(&LexemeKind::RParen, "')'").map(|_| p));
            match grouped {
                Ok(pred) => return Ok(pred),
                Err(as_predicate) => {
                    // Not a grouped predicate; retry as an arithmetic operand.
                    self.pos = saved;
                    return self.comparison().map_err(|as_operand| {
                        if as_predicate.offset > as_operand.offset {
                            as_predicate
                        } else {
                            as_operand
                        }
                    });
                }
            }
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult<Predicate> {
        let left = self.additive()?;

        if self.eat_keyword(Keyword::Is) {
            let negated = self.eat_keyword(Keyword::Not);
            if !self.eat_keyword(Keyword::Null) {
                return Err(self.error_here("expected NULL after IS"));
            }
            return Ok(if negated {
                left.not_null()
            } else {
                left.is_null()
            });
        }

        let negated = self.at_keyword(0, Keyword::Not)
            && [Keyword::In, Keyword::Between, Keyword::Like, Keyword::ILike]
                .iter()
                .any(|&kw| self.at_keyword(1, kw));
        if negated {
            self.pos += 1;
        }

        let pred = if self.eat_keyword(Keyword::Between) {
            self.between(left)?
        } else if self.eat_keyword(Keyword::In) {
            self.in_list(left)?
        } else if self.eat_keyword(Keyword::Like) {
            left.like_expr(self.additive()?, false, false)
        } else if self.eat_keyword(Keyword::ILike) {
            left.like_expr(self.additive()?, true, false)
        } else if let Some(op) = self.cmp_op() {
            self.pos += 1;
            left.cmp_with(op, self.additive()?)
        } else {
            return Err(self.error_here("expected predicate after expression"));
        };

        Ok(if negated { pred.negate() } else { pred })
    }

    fn cmp_op(&self) -> Option<CmpOp> {
        match self.peek_kind(0) {
            Some(LexemeKind::Op(op)) => CmpOp::from_symbol(op),
            _ => None,
        }
    }

    fn between(&mut self, expr: ScalarExpr) -> ParseResult<Predicate> {
        let low = self.bound()?;
        if !self.eat_keyword(Keyword::And) {
            return Err(self.error_here("expected AND in BETWEEN"));
        }
        let high = self.bound()?;
        Ok(expr.between_with(low, high, Inclusive::Both))
    }

    fn bound(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        let expr = self.additive()?;
        match expr.as_literal() {
            Some(value) => Ok(value.clone()),
            None => Err(self.error_at(&self.tokens[start], "BETWEEN bounds must be literals")),
        }
    }

    fn in_list(&mut self, expr: ScalarExpr) -> ParseResult<Predicate> {
        self.expect(&LexemeKind::LParen, "'(' after IN")?;
        let mut values = Vec::new();
        if !self.eat(&LexemeKind::RParen) {
            loop {
                values.push(self.in_value()?);
                if self.eat(&LexemeKind::Comma) {
                    continue;
                }
                self.expect(&LexemeKind::RParen, "',' or ')' in IN list")?;
                break;
            }
        }
        Ok(expr.isin(values))
    }

    fn in_value(&mut self) -> ParseResult<Value> {
        let negative = matches!(self.peek_kind(0), Some(LexemeKind::Op("-")))
            && matches!(self.peek_kind(1), Some(LexemeKind::Number(_)));
        if negative {
            self.pos += 1;
        }
        let Some(tok) = self.next() else {
            return Err(self.error_here("expected literal in IN list"));
        };
        let value = match &tok.kind {
            LexemeKind::Number(text) => number(text, negative),
            LexemeKind::Str(s) => Value::Str(s.clone()),
            LexemeKind::Keyword(Keyword::Null) => Value::Null,
            LexemeKind::Keyword(Keyword::True) => Value::Bool(true),
            LexemeKind::Keyword(Keyword::False) => Value::Bool(false),
            _ => return Err(self.error_at(&tok, "IN list values must be literals")),
        };
        Ok(value)
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    fn additive(&mut self) -> ParseResult<ScalarExpr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek_kind(0) {
                Some(LexemeKind::Op("+")) => BinaryOp::Add,
                Some(LexemeKind::Op("-")) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            left = ScalarExpr::binary(op, left, self.multiplicative()?);
        }
    }

    fn multiplicative(&mut self) -> ParseResult<ScalarExpr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_kind(0) {
                Some(LexemeKind::Op("*")) => BinaryOp::Mul,
                Some(LexemeKind::Op("/")) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            left = ScalarExpr::binary(op, left, self.unary()?);
        }
    }

    fn unary(&mut self) -> ParseResult<ScalarExpr> {
        if matches!(self.peek_kind(0), Some(LexemeKind::Op("-"))) {
            self.pos += 1;
            if let Some(LexemeKind::Number(text)) = self.peek_kind(0) {
                let value = number(text, true);
                self.pos += 1;
                return Ok(ScalarExpr::Literal { value });
            }
            let operand = self.unary()?;
            return Ok(ScalarExpr::binary(BinaryOp::Sub, 0.into(), operand));
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult<ScalarExpr> {
        let Some(tok) = self.next() else {
            return Err(self.error_here("expected expression"));
        };
        let expr = match &tok.kind {
            LexemeKind::Ident(name) => ScalarExpr::Column { name: name.clone() },
            LexemeKind::Str(s) => s.as_str().into(),
            LexemeKind::Number(text) => ScalarExpr::Literal {
                value: number(text, false),
            },
            LexemeKind::Keyword(Keyword::Null) => ScalarExpr::Literal { value: Value::Null },
            LexemeKind::Keyword(Keyword::True) => true.into(),
            LexemeKind::Keyword(Keyword::False) => false.into(),
            LexemeKind::LParen => {
                let inner = self.additive()?;
                self.expect(&LexemeKind::RParen, "')'")?;
                inner
            }
            LexemeKind::Keyword(kw) => {
                let message = format!("unexpected keyword {}", kw.as_str());
                return Err(self.error_at(&tok, &message));
            }
            LexemeKind::RParen | LexemeKind::Comma | LexemeKind::Op(_) => {
                return Err(self.error_at(&tok, "expected expression"));
            }
        };
        Ok(expr)
    }
}

/// Numbers with a fraction or exponent are floats; integers that overflow
/// `i64` fall back to floats.
fn number(text: &str, negative: bool) -> Value {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        let signed = if negative {
            format!("-{}", text)
        } else {
            text.to_string()
        };
        if let Ok(n) = signed.parse::<i64>() {
            return Value::Int(n);
        }
    }
    let f = text.parse::<f64>().unwrap_or(f64::NAN);
    Value::Float(if negative { -f } else { f })
}
