//! Two-pass assembly of a [`CodeBuffer`] into linear bytecode.
//!
//! Pass 1 interns constants and assigns every instruction its offset, which
//! fixes the position of each label. Pass 2 writes the bytes, encoding
//! branches as signed 16-bit offsets relative to the next instruction.
//!
//! ```text
//!   offset  instruction
//!   ------  -----------------------
//!   0000    JUMP_IF_FALSE  -> 0007     rel = 7 - 3 = +4
//!   0003    CONSTANT       #0
//!   0005    PRINT
//!   0006    RETURN_VOID
//!   0007    ...
//! ```

use cfpl_core::EmitError;
use rustc_hash::FxHashMap;

use super::{CodeBuffer, Instr, Label};
use crate::bytecode::{BytecodeChunk, ConstantPool, OpCode};

/// Resolve labels and encode `code` into a chunk and its constant pool.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn assemble(code: &CodeBuffer) -> Result<(BytecodeChunk, ConstantPool), EmitError> {
    let mut constants = ConstantPool::new();
    let mut constant_indices = Vec::new();
    let mut labels: FxHashMap<Label, usize> = FxHashMap::default();
    let mut size = 0usize;

    // Pass 1: layout
    for instr in code.instrs() {
        size += match instr {
            Instr::Op(_) => 1,
            Instr::Constant(constant) => {
                let index = constants.add(constant.clone());
                if index > u32::from(u16::MAX) {
                    return Err(EmitError::TooManyConstants(constants.len()));
                }
                constant_indices.push(index);
                if index < 256 { 2 } else { 3 }
            }
            Instr::Local(..) | Instr::Branch(..) => 3,
            Instr::Label(label) => {
                if labels.insert(*label, size).is_some() {
                    return Err(EmitError::LabelRedefined(label.id()));
                }
                0
            }
        };
    }

    // Pass 2: encode
    let mut chunk = BytecodeChunk::with_capacity(size);
    let mut constant_indices = constant_indices.into_iter();
    for (instr, &line) in code.instrs().iter().zip(code.lines()) {
        match instr {
            Instr::Op(op) => chunk.write_op(*op, line),
            Instr::Constant(_) => {
                let index = constant_indices.next().unwrap_or_default();
                if index < 256 {
                    chunk.write_op(OpCode::Constant, line);
                    chunk.write_byte(index as u8, line);
                } else {
                    chunk.write_op(OpCode::ConstantWide, line);
                    chunk.write_u16(index as u16, line);
                }
            }
            Instr::Local(op, slot) => {
                chunk.write_op(*op, line);
                chunk.write_u16(*slot, line);
            }
            Instr::Branch(op, label) => {
                let offset = chunk.current_offset();
                let target = *labels
                    .get(label)
                    .ok_or(EmitError::UndefinedLabel(label.id()))?;
                let distance = target as i64 - (offset as i64 + 3);
                let rel = i16::try_from(distance)
                    .map_err(|_| EmitError::JumpOutOfRange { offset, distance })?;
                chunk.write_op(*op, line);
                chunk.write_i16(rel, line);
            }
            Instr::Label(_) => {}
        }
    }

    tracing::debug!(
        bytes = chunk.len(),
        constants = constants.len(),
        labels = labels.len(),
        "assembled program"
    );

    Ok((chunk, constants))
}
