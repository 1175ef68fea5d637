//! Recursive-descent front end.
//!
//! The parser never builds a tree: every production calls straight into a
//! [`CodeSession`], which emits code as the source is read. Operands that
//! must be generated before their conversion is known (right-hand operands,
//! declaration initializers) go through the session's segments.
//!
//! Syntax errors stop the parse and are returned as a [`ParseError`];
//! semantic problems are diagnosed by the session and the parse continues.

mod expr;
mod stmt;

use bumpalo::Bump;
use cfpl_compiler::CodeSession;
use cfpl_core::{ParseError, ParseErrorKind};

use crate::lexer::{Lexer, Token, TokenKind};

/// Parser driving a [`CodeSession`] from CFPL source.
pub struct Parser<'src, 'ast, 'sess> {
    lexer: Lexer<'src, 'ast>,
    session: &'sess mut CodeSession,
}

impl<'src, 'ast, 'sess> Parser<'src, 'ast, 'sess> {
    /// Create a parser over `source`, emitting into `session`.
    pub fn new(source: &'src str, arena: &'ast Bump, session: &'sess mut CodeSession) -> Self {
        Self {
            lexer: Lexer::new(source, arena),
            session,
        }
    }

    /// Parse a whole program.
    ///
    /// Grammar: `{ declaration } START { statement } STOP`
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_program(&mut self) -> Result<(), ParseError> {
        while self.check(TokenKind::Var) {
            self.parse_declaration()?;
        }

        self.parse_block()?;
        self.expect(TokenKind::Eof)?;
        Ok(())
    }

    // =========================================
    // Token helpers
    // =========================================

    fn peek(&mut self) -> Token<'ast> {
        self.lexer.peek()
    }

    fn advance(&mut self) -> Token<'ast> {
        self.lexer.next_token()
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the next token if it is a `kind`.
    fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a `kind` or fail.
    fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        Err(self.unexpected(token, kind.description()))
    }

    fn expect_identifier(&mut self) -> Result<Token<'ast>, ParseError> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier {
            return Ok(self.advance());
        }
        Err(self.error_at(token, ParseErrorKind::ExpectedIdentifier, "identifier"))
    }

    /// Build the error for finding `token` where `expected` should be.
    fn unexpected(&self, token: Token<'ast>, expected: &str) -> ParseError {
        self.error_at(token, ParseErrorKind::ExpectedToken, expected)
    }

    fn error_at(&self, token: Token<'ast>, kind: ParseErrorKind, expected: &str) -> ParseError {
        match token.kind {
            TokenKind::Error => match self.lexer.errors().last() {
                Some(error) => ParseError::from(error.clone()),
                None => ParseError::new(ParseErrorKind::InvalidToken, token.span, "invalid token"),
            },
            TokenKind::Eof => ParseError::unexpected_eof(token.span),
            _ => ParseError::new(
                kind,
                token.span,
                format!("expected {expected}, found {}", token.describe()),
            ),
        }
    }
}

/// Parse `source` as a complete program, emitting into `session`.
pub fn parse_into(source: &str, session: &mut CodeSession) -> Result<(), ParseError> {
    let arena = Bump::new();
    let result = Parser::new(source, &arena, session).parse_program();
    if let Err(error) = &result {
        tracing::debug!(%error, "parse failed");
    }
    result
}
