//! Unified error types for the CFPL toolchain.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CfplError (top-level wrapper)
//! ├── LexError          - Tokenization errors
//! ├── ParseError        - Syntax errors (with ParseErrorKind)
//! ├── CompilationError  - Diagnosed semantic errors (non-fatal)
//! ├── EmitError         - Label resolution / serialization errors
//! ├── LoadError         - Errors reading a serialized program
//! ├── RuntimeError      - VM execution errors
//! └── io::Error         - File handling
//! ```
//!
//! Compilation errors are collected by the code session rather than
//! returned, so one pass can report several of them.

use thiserror::Error;

use crate::{Span, Type};

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during lexical analysis (tokenization).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not properly terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A character literal was not properly terminated.
    #[error("unterminated character literal at {span}")]
    UnterminatedChar { span: Span },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type keyword was expected.
    ExpectedType,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A statement was expected.
    ExpectedStatement,
    /// The lexer could not produce a token.
    InvalidToken,
}

impl ParseErrorKind {
    /// Human-readable description of the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::InvalidToken => "invalid token",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            span,
            "unexpected end of file".to_string(),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::InvalidToken, err.span(), err.to_string())
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Semantic errors diagnosed while generating code.
///
/// None of these stop the pass: the session records the error, picks a
/// fallback (usually INT, or no conversion) and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// No conversion chain exists between two types.
    #[error("at {span}: no implicit conversion from {from} to {to}")]
    NoConversion {
        /// The source type.
        from: Type,
        /// The requested type.
        to: Type,
        /// Where the conversion was needed.
        span: Span,
    },

    /// No candidate matched the arity and argument types of a call.
    #[error("at {span}: no matching overload for '{name}({args})'")]
    NoMatchingOverload {
        /// The operator or function name.
        name: String,
        /// The argument types as a string.
        args: String,
        /// Where the call occurred.
        span: Span,
    },

    /// A referenced variable was never declared.
    #[error("at {span}: unknown variable '{name}'")]
    UnknownVariable {
        /// The variable name that wasn't found.
        name: String,
        /// Where the variable was referenced.
        span: Span,
    },

    /// A variable was declared twice.
    #[error("at {new_span}: variable '{name}' redeclared (originally declared at {original_span})")]
    VariableRedeclaration {
        /// The variable name.
        name: String,
        /// Where the variable was originally declared.
        original_span: Span,
        /// Where the redeclaration occurred.
        new_span: Span,
    },

    /// An operation is not defined for the operand type.
    #[error("at {span}: {message}")]
    InvalidOperation {
        /// Description of what's invalid.
        message: String,
        /// Where the operation occurred.
        span: Span,
    },

    /// A numeric literal is out of range or malformed.
    #[error("at {span}: invalid literal '{literal}'")]
    InvalidLiteral {
        /// The literal text.
        literal: String,
        /// Where the literal occurred.
        span: Span,
    },

    /// The program needs more local slots than the instruction set can address.
    #[error("at {span}: too many local variables")]
    TooManyLocals {
        /// Where the slot was requested.
        span: Span,
    },

    /// Internal compiler error.
    #[error("internal error: {message}")]
    Internal {
        /// The error message.
        message: String,
    },
}

impl CompilationError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::NoConversion { span, .. } => *span,
            CompilationError::NoMatchingOverload { span, .. } => *span,
            CompilationError::UnknownVariable { span, .. } => *span,
            CompilationError::VariableRedeclaration { new_span, .. } => *new_span,
            CompilationError::InvalidOperation { span, .. } => *span,
            CompilationError::InvalidLiteral { span, .. } => *span,
            CompilationError::TooManyLocals { span } => *span,
            CompilationError::Internal { .. } => Span::default(),
        }
    }
}

// ============================================================================
// Emit Errors
// ============================================================================

/// Errors raised while laying out and serializing a finished program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// A branch refers to a label that was never defined.
    #[error("label L{0} is referenced but never defined")]
    UndefinedLabel(u32),

    /// A label was defined at more than one position.
    #[error("label L{0} is defined more than once")]
    LabelRedefined(u32),

    /// A branch target is too far away for a 16-bit relative offset.
    #[error("jump distance {distance} at offset {offset} does not fit in 16 bits")]
    JumpOutOfRange {
        /// Offset of the branch instruction.
        offset: usize,
        /// The relative distance that overflowed.
        distance: i64,
    },

    /// The constant pool outgrew the 16-bit index space.
    #[error("constant pool overflow ({0} entries)")]
    TooManyConstants(usize),
}

// ============================================================================
// Load Errors
// ============================================================================

/// Errors raised while decoding a serialized program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The input does not start with the program magic.
    #[error("not a CFPL program (bad magic)")]
    BadMagic,

    /// The format version is not supported.
    #[error("unsupported program format version {0}")]
    UnsupportedVersion(u16),

    /// The input ended in the middle of a field.
    #[error("truncated program: expected {expected} more byte(s) at offset {offset}")]
    Truncated {
        /// Where reading stopped.
        offset: usize,
        /// How many bytes were needed.
        expected: usize,
    },

    /// A constant pool entry has an unknown tag.
    #[error("unknown constant tag {0}")]
    UnknownConstantTag(u8),

    /// A string in the program is not valid UTF-8.
    #[error("invalid UTF-8 in program")]
    InvalidUtf8,
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors that occur while executing a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// An instruction popped from an empty stack.
    #[error("stack underflow at offset {offset}")]
    StackUnderflow {
        /// Offset of the failing instruction.
        offset: usize,
    },

    /// An operand had the wrong kind of value.
    #[error("type mismatch at offset {offset}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Offset of the failing instruction.
        offset: usize,
        /// The expected value kind.
        expected: &'static str,
        /// The actual value kind.
        actual: &'static str,
    },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A null string was used where a value was required.
    #[error("null reference")]
    NullReference,

    /// A string could not be parsed as a number.
    #[error("invalid number '{text}'")]
    InvalidNumber {
        /// The text that failed to parse.
        text: String,
    },

    /// Input was requested but none is left.
    #[error("end of input")]
    EndOfInput,

    /// The code contains a byte that is not an opcode.
    #[error("invalid opcode {byte:#04x} at offset {offset}")]
    InvalidOpcode {
        /// The offending byte.
        byte: u8,
        /// Where it was found.
        offset: usize,
    },

    /// An operand referred outside the code, constant pool, or locals.
    #[error("operand out of range at offset {offset}")]
    OperandOutOfRange {
        /// Offset of the failing instruction.
        offset: usize,
    },

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io(err.to_string())
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Top-level error type wrapping every phase.
#[derive(Debug, Error)]
pub enum CfplError {
    /// A lexer error.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A parse error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A compilation error.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// An emit error.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// A load error.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// File handling failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CfplError {
    /// Check if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, CfplError::Parse(_) | CfplError::Lex(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, CfplError::Runtime(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_error_display() {
        let err = CompilationError::NoConversion {
            from: Type::String,
            to: Type::Float,
            span: Span::new(4, 2, 1),
        };
        assert_eq!(
            err.to_string(),
            "at 4:2: no implicit conversion from STRING to FLOAT"
        );
        assert_eq!(err.span(), Span::new(4, 2, 1));
    }

    #[test]
    fn redeclaration_reports_new_span() {
        let err = CompilationError::VariableRedeclaration {
            name: "a".to_string(),
            original_span: Span::point(1, 5),
            new_span: Span::point(2, 5),
        };
        assert_eq!(err.span(), Span::point(2, 5));
        assert!(err.to_string().contains("originally declared at 1:5"));
    }

    #[test]
    fn lex_error_becomes_parse_error() {
        let err: ParseError = LexError::UnexpectedChar {
            ch: '@',
            span: Span::point(3, 1),
        }
        .into();
        assert_eq!(err.kind, ParseErrorKind::InvalidToken);
        assert_eq!(err.span, Span::point(3, 1));
    }

    #[test]
    fn top_level_wrapping() {
        let err: CfplError = RuntimeError::DivisionByZero.into();
        assert!(err.is_runtime());
        assert!(!err.is_parse());
        assert_eq!(err.to_string(), "division by zero");
    }
}
