//! CFPL front end.
//!
//! Turns source text into calls on a [`CodeSession`](cfpl_compiler::CodeSession).
//!
//! # Example
//!
//! ```
//! use cfpl_compiler::CodeSession;
//! use cfpl_parser::parse_into;
//!
//! let mut session = CodeSession::new();
//! parse_into("VAR x = 4 AS INT\nSTART\nOUTPUT: x * 2\nSTOP", &mut session).unwrap();
//! let result = session.finish("double").unwrap();
//! assert!(result.is_success());
//! ```

pub mod lexer;
mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, parse_into};
