//! Label-threaded code buffers.
//!
//! A [`CodeBuffer`] is an owned, appendable list of abstract instructions.
//! Branches refer to [`Label`]s instead of offsets, so a buffer can be built
//! out of order, moved around and spliced into another buffer with
//! [`CodeBuffer::append`] without invalidating any jump. Offsets are only
//! computed by [`assemble`] once the whole program is known.
//!
//! # Example
//!
//! ```ignore
//! use cfpl_compiler::emit::{CodeBuffer, Label};
//! use cfpl_compiler::bytecode::OpCode;
//!
//! let exit = Label::new(0);
//! let mut code = CodeBuffer::new();
//! code.emit_bool(false);
//! code.emit_branch(OpCode::JumpIfFalse, exit);
//! code.emit_string("unreachable");
//! code.emit(OpCode::Print);
//! code.define_label(exit);
//!
//! let (chunk, constants) = assemble(&code)?;
//! ```

mod action;
mod assemble;

pub use action::Action;
pub use assemble::assemble;

use std::fmt;

use cfpl_core::Type;

use crate::bytecode::{Constant, OpCode};

/// An unresolved jump target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

impl Label {
    /// Create a label with the given id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The label's id.
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One abstract instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// An opcode without operands.
    Op(OpCode),
    /// Push a pooled constant.
    Constant(Constant),
    /// A load or store of a local slot.
    Local(OpCode, u16),
    /// A branch to a label.
    Branch(OpCode, Label),
    /// Defines a label at this position. Emits no code.
    Label(Label),
}

/// An owned sequence of abstract instructions with line information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBuffer {
    instrs: Vec<Instr>,
    /// Source line per instruction (parallel to `instrs`).
    lines: Vec<u32>,
    current_line: u32,
}

impl CodeBuffer {
    /// Create an empty buffer starting at line 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer whose instructions are attributed to `line`.
    pub fn at_line(line: u32) -> Self {
        Self {
            current_line: line,
            ..Self::default()
        }
    }

    /// Set current source line for debug info.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    /// Get current source line.
    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    /// The buffered instructions.
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Source lines, parallel to [`instrs`](Self::instrs).
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// Number of buffered instructions (label definitions included).
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Check if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// The opcodes this buffer will assemble to, ignoring operands and labels.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instrs
            .iter()
            .filter_map(|instr| match instr {
                Instr::Op(op) | Instr::Local(op, _) | Instr::Branch(op, _) => Some(*op),
                Instr::Constant(_) => Some(OpCode::Constant),
                Instr::Label(_) => None,
            })
            .collect()
    }

    /// Splice `other` onto the end of this buffer, consuming it.
    pub fn append(&mut self, mut other: CodeBuffer) {
        self.instrs.append(&mut other.instrs);
        self.lines.append(&mut other.lines);
    }

    fn push(&mut self, instr: Instr) {
        self.instrs.push(instr);
        self.lines.push(self.current_line);
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.push(Instr::Op(op));
    }

    /// Emit a constant load instruction.
    pub fn emit_constant(&mut self, constant: Constant) {
        self.push(Instr::Constant(constant));
    }

    /// Emit an integer constant.
    ///
    /// Optimizes common cases: 0 uses `PushZero`, 1 uses `PushOne`.
    pub fn emit_int(&mut self, value: i64) {
        match value {
            0 => self.emit(OpCode::PushZero),
            1 => self.emit(OpCode::PushOne),
            _ => self.emit_constant(Constant::Int(value)),
        }
    }

    /// Emit a 64-bit float constant.
    pub fn emit_f64(&mut self, value: f64) {
        self.emit_constant(Constant::Float64(value));
    }

    /// Emit a string constant.
    pub fn emit_string(&mut self, value: &str) {
        self.emit_constant(Constant::StringData(value.to_string()));
    }

    /// Emit null.
    pub fn emit_null(&mut self) {
        self.emit(OpCode::PushNull);
    }

    /// Emit boolean.
    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value {
            OpCode::PushTrue
        } else {
            OpCode::PushFalse
        });
    }

    // ==========================================================================
    // Local Variables
    // ==========================================================================

    /// Emit a type-directed load of a local slot.
    pub fn emit_load(&mut self, ty: Type, slot: u16) {
        let op = match ty {
            Type::Float => OpCode::LoadDouble,
            Type::String => OpCode::LoadRef,
            Type::Bool | Type::Char | Type::Int => OpCode::LoadInt,
        };
        self.push(Instr::Local(op, slot));
    }

    /// Emit a type-directed store into a local slot.
    pub fn emit_store(&mut self, ty: Type, slot: u16) {
        let op = match ty {
            Type::Float => OpCode::StoreDouble,
            Type::String => OpCode::StoreRef,
            Type::Bool | Type::Char | Type::Int => OpCode::StoreInt,
        };
        self.push(Instr::Local(op, slot));
    }

    // ==========================================================================
    // Control Flow
    // ==========================================================================

    /// Emit a branch to `label`, which may be defined before or after.
    pub fn emit_branch(&mut self, op: OpCode, label: Label) {
        debug_assert!(op.is_branch(), "{} is not a branch", op.name());
        self.push(Instr::Branch(op, label));
    }

    /// Define `label` at the current position.
    pub fn define_label(&mut self, label: Label) {
        self.push(Instr::Label(label));
    }

    /// Emit end of program.
    pub fn emit_return_void(&mut self) {
        self.emit(OpCode::ReturnVoid);
    }
}
