//! Shared vocabulary for the CFPL toolchain.
//!
//! - [`Type`]: the closed set of scalar kinds and their slot widths
//! - [`Span`]: source locations for diagnostics
//! - [`error`]: every error type produced by lexing, parsing, compilation,
//!   serialization, loading and execution

pub mod error;
mod span;
mod ty;

pub use error::{
    CfplError, CompilationError, EmitError, LexError, LoadError, ParseError, ParseErrorKind,
    RuntimeError,
};
pub use span::Span;
pub use ty::Type;
