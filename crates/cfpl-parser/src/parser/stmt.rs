//! Declarations, statements and blocks.

use cfpl_core::{ParseError, ParseErrorKind, Type};

use super::Parser;
use crate::lexer::TokenKind;

impl<'src, 'ast, 'sess> Parser<'src, 'ast, 'sess> {
    /// Parse a declaration.
    ///
    /// Grammar: `VAR IDENT [= expr] {, IDENT [= expr]} AS type`
    pub(super) fn parse_declaration(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Var)?;

        loop {
            let name = self.expect_identifier()?;
            self.session.set_span(name.span);

            if self.eat(TokenKind::Equal).is_some() {
                self.session.open_segment();
                let ty = self.parse_expr()?;
                let init = self.session.close_segment();
                self.session
                    .add_var_with_init(name.lexeme, name.span, init, ty);
            } else {
                self.session.add_var(name.lexeme, name.span);
            }

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.expect(TokenKind::As)?;
        let ty = self.parse_type()?;
        self.session.declare_all_vars(ty);
        Ok(())
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let token = self.peek();
        match token.kind.as_type() {
            Some(ty) => {
                self.advance();
                self.session.set_span(token.span);
                Ok(ty)
            }
            None => Err(self.error_at(token, ParseErrorKind::ExpectedType, "type")),
        }
    }

    /// Parse `START { statement } STOP`.
    pub(super) fn parse_block(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Start)?;
        while !self.check(TokenKind::Stop) {
            self.parse_statement()?;
        }
        self.advance();
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<(), ParseError> {
        let token = self.peek();
        self.session.set_span(token.span);

        match token.kind {
            TokenKind::Identifier => self.parse_assignment(),
            TokenKind::Output => self.parse_output(),
            TokenKind::Input => self.parse_input(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            _ => Err(self.error_at(token, ParseErrorKind::ExpectedStatement, "statement")),
        }
    }

    /// Grammar: `IDENT = expr`
    fn parse_assignment(&mut self) -> Result<(), ParseError> {
        let name = self.advance();
        self.expect(TokenKind::Equal)?;
        let ty = self.parse_expr()?;

        self.session.set_span(name.span);
        self.session.store_var(ty, name.lexeme);
        Ok(())
    }

    /// Grammar: `OUTPUT : expr`
    fn parse_output(&mut self) -> Result<(), ParseError> {
        let keyword = self.advance();
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_expr()?;

        self.session.set_span(keyword.span);
        self.session.output(ty);
        Ok(())
    }

    /// Grammar: `INPUT : IDENT {, IDENT}`
    fn parse_input(&mut self) -> Result<(), ParseError> {
        self.advance();
        self.expect(TokenKind::Colon)?;

        loop {
            let name = self.expect_identifier()?;
            self.session.set_span(name.span);
            self.session.input(name.lexeme);
            if self.eat(TokenKind::Comma).is_none() {
                return Ok(());
            }
        }
    }

    /// Grammar: `IF ( expr ) block [ELSE block]`
    fn parse_if(&mut self) -> Result<(), ParseError> {
        let keyword = self.advance();
        let ty = self.parse_condition()?;
        self.session.set_span(keyword.span);
        let else_label = self.session.start_if(ty);

        self.parse_block()?;

        if self.eat(TokenKind::Else).is_some() {
            let end_label = self.session.start_else(else_label);
            self.parse_block()?;
            self.session.end_if(end_label);
        } else {
            self.session.end_if(else_label);
        }
        Ok(())
    }

    /// Grammar: `WHILE ( expr ) block`
    fn parse_while(&mut self) -> Result<(), ParseError> {
        let keyword = self.advance();
        let top = self.session.start_while();
        let ty = self.parse_condition()?;
        self.session.set_span(keyword.span);
        let exit = self.session.while_cond(ty);

        self.parse_block()?;
        self.session.end_while(top, exit);
        Ok(())
    }

    fn parse_condition(&mut self) -> Result<Type, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let ty = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;
        Ok(ty)
    }
}
