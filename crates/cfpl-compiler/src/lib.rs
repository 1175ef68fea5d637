//! CFPL Compiler
//!
//! A single-pass, type-directed code generator for CFPL.
//!
//! ## Architecture
//!
//! The front end recognizes source constructs and calls [`CodeSession`] in
//! source order. Nothing is built and revisited later: each construct becomes
//! code immediately, and decisions that depend on later context (initializer
//! conversions, overload selection) are handled by generating into owned
//! buffers and splicing them once the context is known.
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, BytecodeChunk, ConstantPool, CompiledProgram)
//! - [`emit`]: Label-threaded code buffers and the assembler
//! - [`conversion`]: Implicit conversion graphs and chain search
//! - [`overload`]: Overload table and the deferred-argument call protocol
//! - [`literals`]: Decoding of quoted literals
//! - [`session`]: The code generation session

pub mod bytecode;
pub mod conversion;
pub mod emit;
pub mod literals;
pub mod overload;
pub mod session;

pub use bytecode::{BytecodeChunk, CompiledProgram, Constant, ConstantPool, OpCode};
pub use conversion::{Chain, ConversionEdge, ConversionGraph};
pub use emit::{Action, CodeBuffer, Label, assemble};
pub use overload::{Candidate, OverloadMatch, OverloadTable};
pub use session::{Builtins, CodeSession, CompilationResult, Variable};

// Re-export CompilationError from core for convenience
pub use cfpl_core::{CompilationError, Type};
