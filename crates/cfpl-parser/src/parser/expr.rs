//! Expression parsing.
//!
//! One function per precedence level, lowest first:
//!
//! | level    | operators                     |
//! |----------|-------------------------------|
//! | concat   | `&`                           |
//! | or       | `OR`                          |
//! | and      | `AND`                         |
//! | not      | `NOT` (prefix)                |
//! | compare  | `==` `<>` `<` `<=` `>` `>=`   |
//! | additive | `+` `-`                       |
//! | term     | `*` `/` `%`                   |
//! | unary    | `-` `+` (prefix)              |
//!
//! Every binary level is left-associative. The left operand is already
//! emitted when the operator is seen, so the session defers the right one.

use cfpl_core::{ParseError, ParseErrorKind, Type};

use super::Parser;
use crate::lexer::TokenKind;

impl<'src, 'ast, 'sess> Parser<'src, 'ast, 'sess> {
    /// Parse an expression and return its static type.
    pub(super) fn parse_expr(&mut self) -> Result<Type, ParseError> {
        self.parse_binary(Level::Concat)
    }

    /// Parse a left-associative chain at `level`.
    fn parse_binary(&mut self, level: Level) -> Result<Type, ParseError> {
        let mut lhs = self.parse_operand(level)?;

        loop {
            let token = self.peek();
            let Some(op) = token.kind.binary_operator().filter(|_| level.accepts(token.kind)) else {
                return Ok(lhs);
            };
            self.advance();

            self.session.start_op2(lhs);
            let rhs = self.parse_operand(level)?;
            self.session.set_span(token.span);
            lhs = self.session.end_op2(op, rhs);
        }
    }

    /// Parse one operand of a `level` chain.
    fn parse_operand(&mut self, level: Level) -> Result<Type, ParseError> {
        match level {
            Level::Concat => self.parse_binary(Level::Or),
            Level::Or => self.parse_binary(Level::And),
            Level::And => self.parse_not(),
            Level::Compare => self.parse_binary(Level::Additive),
            Level::Additive => self.parse_binary(Level::Term),
            Level::Term => self.parse_unary(),
        }
    }

    /// Grammar: `NOT not | compare`
    fn parse_not(&mut self) -> Result<Type, ParseError> {
        let Some(token) = self.eat(TokenKind::Not) else {
            return self.parse_binary(Level::Compare);
        };
        let ty = self.parse_not()?;
        self.session.set_span(token.span);
        Ok(self.session.apply_op1("NOT", ty))
    }

    /// Grammar: `(- | +) unary | primary`
    fn parse_unary(&mut self) -> Result<Type, ParseError> {
        if let Some(token) = self.eat(TokenKind::Minus) {
            let ty = self.parse_unary()?;
            self.session.set_span(token.span);
            return Ok(self.session.neg(ty));
        }
        if self.eat(TokenKind::Plus).is_some() {
            return self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Type, ParseError> {
        let token = self.peek();
        self.session.set_span(token.span);

        let ty = match token.kind {
            TokenKind::IntLiteral => self.session.literal_int(token.lexeme),
            TokenKind::FloatLiteral => self.session.literal_float(token.lexeme),
            TokenKind::CharLiteral => self.session.literal_char(token.lexeme),
            TokenKind::StringLiteral => self.session.literal_string(token.lexeme),
            TokenKind::True => self.session.literal_bool(true),
            TokenKind::False => self.session.literal_bool(false),
            TokenKind::Identifier => self.session.load_var(token.lexeme),
            TokenKind::LeftParen => {
                self.advance();
                let ty = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                return Ok(ty);
            }
            _ => {
                return Err(self.error_at(token, ParseErrorKind::ExpectedExpression, "expression"));
            }
        };

        self.advance();
        Ok(ty)
    }
}

/// Binary precedence levels, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Concat,
    Or,
    And,
    Compare,
    Additive,
    Term,
}

impl Level {
    fn accepts(self, kind: TokenKind) -> bool {
        match self {
            Level::Concat => kind == TokenKind::Amp,
            Level::Or => kind == TokenKind::Or,
            Level::And => kind == TokenKind::And,
            Level::Compare => kind.is_comparison(),
            Level::Additive => matches!(kind, TokenKind::Plus | TokenKind::Minus),
            Level::Term => matches!(
                kind,
                TokenKind::Star | TokenKind::Slash | TokenKind::Percent
            ),
        }
    }
}
