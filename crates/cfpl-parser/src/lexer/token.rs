//! Token types for the CFPL lexer.

use cfpl_core::{Span, Type};
use std::fmt;

/// A token from the source code.
///
/// The lexeme lives in the lexer's arena, so tokens stay valid after the
/// source string is dropped.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token.
    pub lexeme: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// How the token reads in a diagnostic.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof | TokenKind::Error => self.kind.description().to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types in CFPL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`
    IntLiteral,
    /// `4.2`
    FloatLiteral,
    /// `'a'`, `'[']'`
    CharLiteral,
    /// `"hi#"`
    StringLiteral,
    /// `count`
    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Var,
    As,
    Start,
    Stop,
    If,
    Else,
    While,
    Output,
    Input,
    And,
    Or,
    Not,
    True,
    False,

    // Type keywords
    Int,
    Float,
    Char,
    Bool,
    String,

    // =========================================
    // Punctuation and operators
    // =========================================
    Comma,
    Colon,
    LeftParen,
    RightParen,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `<>`
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `&`
    Amp,

    // =========================================
    // Special
    // =========================================
    Eof,
    /// Produced after a lexical error; the error itself is recorded by the lexer.
    Error,
}

impl TokenKind {
    /// The type named by a type keyword.
    pub fn as_type(self) -> Option<Type> {
        match self {
            TokenKind::Int => Some(Type::Int),
            TokenKind::Float => Some(Type::Float),
            TokenKind::Char => Some(Type::Char),
            TokenKind::Bool => Some(Type::Bool),
            TokenKind::String => Some(Type::String),
            _ => None,
        }
    }

    /// The operator name this token resolves against, for binary operators.
    pub fn binary_operator(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            Amp => "&",
            Or => "OR",
            And => "AND",
            EqualEqual => "==",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            _ => return None,
        })
    }

    /// Check if this is a comparison operator.
    pub fn is_comparison(self) -> bool {
        use TokenKind::*;
        matches!(self, EqualEqual | NotEqual | Less | LessEqual | Greater | GreaterEqual)
    }

    /// Human-readable name.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            FloatLiteral => "float literal",
            CharLiteral => "character literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Var => "VAR",
            As => "AS",
            Start => "START",
            Stop => "STOP",
            If => "IF",
            Else => "ELSE",
            While => "WHILE",
            Output => "OUTPUT",
            Input => "INPUT",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            True => "TRUE",
            False => "FALSE",
            Int => "INT",
            Float => "FLOAT",
            Char => "CHAR",
            Bool => "BOOL",
            String => "STRING",
            Comma => "','",
            Colon => "':'",
            LeftParen => "'('",
            RightParen => "')'",
            Equal => "'='",
            EqualEqual => "'=='",
            NotEqual => "'<>'",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Amp => "'&'",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a keyword to its [`TokenKind`], or `None` if not a keyword.
///
/// Keywords are upper-case only; `var` is an ordinary identifier.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "VAR" => Var,
        "AS" => As,
        "START" => Start,
        "STOP" => Stop,
        "IF" => If,
        "ELSE" => Else,
        "WHILE" => While,
        "OUTPUT" => Output,
        "INPUT" => Input,
        "AND" => And,
        "OR" => Or,
        "NOT" => Not,
        "TRUE" => True,
        "FALSE" => False,
        "INT" => Int,
        "FLOAT" => Float,
        "CHAR" => Char,
        "BOOL" => Bool,
        "STRING" => String,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(lookup_keyword("START"), Some(TokenKind::Start));
        assert_eq!(lookup_keyword("start"), None);
        assert_eq!(lookup_keyword("Var"), None);
    }

    #[test]
    fn type_keywords_name_types() {
        for ty in [Type::Bool, Type::Char, Type::Int, Type::Float, Type::String] {
            let kind = lookup_keyword(ty.keyword()).unwrap();
            assert_eq!(kind.as_type(), Some(ty));
        }
        assert_eq!(TokenKind::Var.as_type(), None);
    }

    #[test]
    fn binary_operator_names() {
        assert_eq!(TokenKind::NotEqual.binary_operator(), Some("<>"));
        assert_eq!(TokenKind::Amp.binary_operator(), Some("&"));
        assert_eq!(TokenKind::Not.binary_operator(), None);
        assert_eq!(TokenKind::Equal.binary_operator(), None);
    }

    #[test]
    fn describe_uses_lexeme() {
        let token = Token::new(TokenKind::Identifier, "abc", Span::point(1, 1));
        assert_eq!(token.describe(), "'abc'");
        let eof = Token::new(TokenKind::Eof, "", Span::point(1, 1));
        assert_eq!(eof.describe(), "end of file");
    }
}
