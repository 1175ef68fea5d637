//! Main lexer implementation for CFPL.
//!
//! The [`Lexer`] turns source text into [`Token`]s, dispatching on the first
//! character of each token. Lexemes are copied into an arena so tokens
//! outlive the source string.
//!
//! A line whose first non-blank character is `*` is a comment; a `*`
//! anywhere else is the multiplication operator.

use std::collections::VecDeque;

use bumpalo::Bump;
use cfpl_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for CFPL source code.
///
/// The `'src` lifetime is the source being lexed, `'ast` the arena holding
/// token lexemes.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    /// Tokens scanned ahead by [`peek`](Self::peek).
    lookahead: VecDeque<Token<'ast>>,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            lookahead: VecDeque::with_capacity(2),
            errors: Vec::new(),
        }
    }

    /// Errors recorded so far, one per [`TokenKind::Error`] token.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'ast> {
        if self.lookahead.is_empty() {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        self.lookahead[0]
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'ast> {
        self.skip_trivia();

        let Some(first) = self.cursor.peek() else {
            return self.make_eof();
        };

        let start = Start {
            line: self.cursor.line(),
            col: self.cursor.column(),
            offset: self.cursor.offset(),
        };

        match first {
            '"' => self.scan_quoted(start, '"'),
            '\'' => self.scan_quoted(start, '\''),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if is_ident_start(c) => self.scan_identifier(start),
            _ => self.scan_operator(start),
        }
    }

    /// Skip whitespace and comment lines.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(char::is_whitespace);
            if self.cursor.peek() == Some('*') && self.cursor.at_line_start() {
                self.cursor.skip_line();
            } else {
                break;
            }
        }
    }

    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    fn span_from(&self, start: Start) -> Span {
        Span::new(start.line, start.col, self.cursor.offset() - start.offset)
    }

    /// Create a token from `start` to the current position.
    fn make_token(&self, kind: TokenKind, start: Start) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start.offset));
        Token::new(kind, lexeme, self.span_from(start))
    }

    /// Create an error token and record the error.
    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        tracing::debug!(%error, "lexical error");
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Scanning: literals
    // =========================================

    /// Scan a string or character literal.
    ///
    /// `[x]` escapes any single character, including the closing quote.
    /// Literals end at the line.
    fn scan_quoted(&mut self, start: Start, quote: char) -> Token<'ast> {
        self.cursor.advance();

        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(start);
                    let error = if quote == '"' {
                        LexError::UnterminatedString { span }
                    } else {
                        LexError::UnterminatedChar { span }
                    };
                    return self.make_error(error);
                }
                Some('[') => {
                    self.cursor.advance();
                    if self.cursor.check(|c| c != '\n' && c != '\r') {
                        self.cursor.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    let kind = if quote == '"' {
                        TokenKind::StringLiteral
                    } else {
                        TokenKind::CharLiteral
                    };
                    return self.make_token(kind, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan `digits` or `digits.digits`.
    fn scan_number(&mut self, start: Start) -> Token<'ast> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let is_float = self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            return self.make_token(TokenKind::FloatLiteral, start);
        }
        self.make_token(TokenKind::IntLiteral, start)
    }

    fn scan_identifier(&mut self, start: Start) -> Token<'ast> {
        let text = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    // =========================================
    // Scanning: operators
    // =========================================

    fn scan_operator(&mut self, start: Start) -> Token<'ast> {
        use TokenKind::*;

        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };

        let kind = match (c, self.cursor.peek()) {
            ('=', Some('=')) => self.two(EqualEqual),
            ('=', _) => Equal,
            ('<', Some('>')) => self.two(NotEqual),
            ('<', Some('=')) => self.two(LessEqual),
            ('<', _) => Less,
            ('>', Some('=')) => self.two(GreaterEqual),
            ('>', _) => Greater,
            (',', _) => Comma,
            (':', _) => Colon,
            ('(', _) => LeftParen,
            (')', _) => RightParen,
            ('+', _) => Plus,
            ('-', _) => Minus,
            ('*', _) => Star,
            ('/', _) => Slash,
            ('%', _) => Percent,
            ('&', _) => Amp,
            _ => {
                let span = self.span_from(start);
                return self.make_error(LexError::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind, start)
    }

    /// Consume the second character of a two-character operator.
    fn two(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }
}

/// Position where a token began.
#[derive(Clone, Copy)]
struct Start {
    line: u32,
    col: u32,
    offset: u32,
}

impl<'src, 'ast> Iterator for Lexer<'src, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        let arena = Bump::new();
        Lexer::new(source, &arena)
            .map(|t| (t.kind, t.lexeme.to_string()))
            .collect()
    }

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        Lexer::new(source, &arena).map(|t| t.kind).collect()
    }

    // =========================================
    // Basic tokens
    // =========================================

    #[test]
    fn empty_source() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("", &arena);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            token_kinds("VAR abc AS INT START STOP stop Start"),
            vec![Var, Identifier, As, Int, Start, Stop, Identifier, Identifier]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokenize("42 4.25"),
            vec![
                (TokenKind::IntLiteral, "42".to_string()),
                (TokenKind::FloatLiteral, "4.25".to_string()),
            ]
        );
        // A dot without digits after it is not part of the number.
        let arena = Bump::new();
        let mut lexer = Lexer::new("7.", &arena);
        assert_eq!(lexer.next_token().lexeme, "7");
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
    }

    #[test]
    fn operators() {
        use TokenKind::*;
        assert_eq!(
            token_kinds("= == <> < <= > >= + - * / % & , : ( )"),
            vec![
                Equal, EqualEqual, NotEqual, Less, LessEqual, Greater, GreaterEqual, Plus, Minus,
                Star, Slash, Percent, Amp, Comma, Colon, LeftParen, RightParen,
            ]
        );
    }

    #[test]
    fn adjacent_operators() {
        use TokenKind::*;
        assert_eq!(token_kinds("a<>-1"), vec![Identifier, NotEqual, Minus, IntLiteral]);
        assert_eq!(token_kinds("x=-y"), vec![Identifier, Equal, Minus, Identifier]);
    }

    // =========================================
    // Literals
    // =========================================

    #[test]
    fn string_literal_keeps_quotes() {
        assert_eq!(
            tokenize("\"hi there#\""),
            vec![(TokenKind::StringLiteral, "\"hi there#\"".to_string())]
        );
    }

    #[test]
    fn bracket_escape_can_hold_quote() {
        assert_eq!(
            tokenize("\"say [\"]hi[\"]\" 'x' '[']'"),
            vec![
                (TokenKind::StringLiteral, "\"say [\"]hi[\"]\"".to_string()),
                (TokenKind::CharLiteral, "'x'".to_string()),
                (TokenKind::CharLiteral, "'[']'".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("\"abc\nSTOP", &arena);
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(
            lexer.errors(),
            &[LexError::UnterminatedString {
                span: Span::new(1, 1, 4)
            }]
        );
        assert_eq!(lexer.next_token().kind, TokenKind::Stop);
    }

    #[test]
    fn unterminated_char() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("'a", &arena);
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
        assert!(matches!(lexer.take_errors()[..], [LexError::UnterminatedChar { .. }]));
        assert!(!lexer.has_errors());
    }

    // =========================================
    // Comments
    // =========================================

    #[test]
    fn star_at_line_start_is_comment() {
        use TokenKind::*;
        let source = "* header\nVAR a AS INT\n   * indented note\nSTART\nOUTPUT: a * 2\nSTOP";
        assert_eq!(
            token_kinds(source),
            vec![
                Var, Identifier, As, Int, Start, Output, Colon, Identifier, Star, IntLiteral, Stop,
            ]
        );
    }

    #[test]
    fn comment_at_end_of_input() {
        assert_eq!(token_kinds("STOP\n* done"), vec![TokenKind::Stop]);
    }

    // =========================================
    // Positions, lookahead and errors
    // =========================================

    #[test]
    fn spans_track_lines_and_columns() {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::new("START\n  x = 10", &arena).collect();
        assert_eq!(tokens[0].span, Span::new(1, 1, 5));
        assert_eq!(tokens[1].span, Span::new(2, 3, 1));
        assert_eq!(tokens[3].span, Span::new(2, 7, 2));
    }

    #[test]
    fn peek_does_not_consume() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("a b", &arena);
        assert_eq!(lexer.peek().lexeme, "a");
        assert_eq!(lexer.peek().lexeme, "a");
        assert_eq!(lexer.next_token().lexeme, "a");
        assert_eq!(lexer.next_token().lexeme, "b");
        assert_eq!(lexer.peek().kind, TokenKind::Eof);
    }

    #[test]
    fn unexpected_character() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("a $ b", &arena);
        let kinds: Vec<_> = lexer.by_ref().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::Error, TokenKind::Identifier]
        );
        assert_eq!(
            lexer.errors(),
            &[LexError::UnexpectedChar {
                ch: '$',
                span: Span::new(1, 3, 1)
            }]
        );
    }

    #[test]
    fn lexemes_outlive_source() {
        let arena = Bump::new();
        let token = {
            let source = String::from("counter");
            let mut lexer = Lexer::new(&source, &arena);
            lexer.next_token()
        };
        assert_eq!(token.lexeme, "counter");
    }
}
