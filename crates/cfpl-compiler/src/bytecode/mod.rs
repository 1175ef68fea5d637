//! Bytecode types for the CFPL compiler.
//!
//! This module contains the core bytecode types:
//!
//! - [`OpCode`] - The instruction set for the VM
//! - [`BytecodeChunk`] - Assembled, label-free bytecode
//! - [`Constant`] and [`ConstantPool`] - Program-level constant storage
//! - [`CompiledProgram`] - The serialized program unit

mod chunk;
mod constant;
mod opcode;
mod program;

pub use chunk::BytecodeChunk;
pub use constant::{Constant, ConstantPool};
pub use opcode::OpCode;
pub use program::CompiledProgram;
