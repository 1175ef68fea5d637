//! Bytecode chunk for an assembled program.
//!
//! A `BytecodeChunk` contains the linear, label-free bytecode produced by
//! the assembler, along with line number information for debugging.

use std::fmt::Write as _;

use super::{Constant, ConstantPool, OpCode};

/// A chunk of assembled bytecode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BytecodeChunk {
    /// The bytecode instructions.
    code: Vec<u8>,
    /// Line numbers for debugging (parallel to code).
    lines: Vec<u32>,
}

impl BytecodeChunk {
    /// Create a new empty bytecode chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bytecode chunk with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity),
            lines: Vec::with_capacity(capacity),
        }
    }

    /// Wrap raw code read back from a serialized program.
    ///
    /// Line information is not serialized, so every byte maps to line 0.
    pub fn from_code(code: Vec<u8>) -> Self {
        let lines = vec![0; code.len()];
        Self { code, lines }
    }

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.code.push(op.into());
        self.lines.push(line);
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_be_bytes() {
            self.code.push(byte);
            self.lines.push(line);
        }
    }

    /// Write a signed 16-bit operand (big-endian).
    pub fn write_i16(&mut self, value: i16, line: u32) {
        self.write_u16(value as u16, line);
    }

    /// Get current code offset.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Get the bytecode.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Get the line numbers.
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// Get the line number for a given offset.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    /// Get the length of the bytecode.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a byte at the given offset.
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read an i16 at the given offset (big-endian).
    pub fn read_i16(&self, offset: usize) -> Option<i16> {
        self.read_u16(offset).map(|v| v as i16)
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Extract all opcodes from the chunk, skipping operands.
    ///
    /// This is useful for testing bytecode sequences without worrying about
    /// specific operand values or instruction offsets.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;

        while offset < self.code.len() {
            if let Some(op) = self.read_op(offset) {
                ops.push(op);
                offset += 1 + op.operand_size();
            } else {
                // Invalid opcode, skip one byte
                offset += 1;
            }
        }

        ops
    }

    /// Render a human-readable listing of the chunk.
    ///
    /// Branch operands are shown as absolute targets and constant operands
    /// are resolved against `constants`.
    pub fn disassemble(&self, constants: &ConstantPool) -> String {
        let mut out = String::new();
        let mut offset = 0;

        while offset < self.code.len() {
            let Some(op) = self.read_op(offset) else {
                let _ = writeln!(out, "{offset:04}  <invalid {:#04x}>", self.code[offset]);
                offset += 1;
                continue;
            };
            let _ = write!(out, "{offset:04}  {:<16}", op.name());
            let next = offset + 1 + op.operand_size();
            match op {
                OpCode::Constant | OpCode::ConstantWide => {
                    let index = if op == OpCode::Constant {
                        self.read_byte(offset + 1).map(u32::from)
                    } else {
                        self.read_u16(offset + 1).map(u32::from)
                    };
                    if let Some(index) = index {
                        let _ = write!(out, "#{index}");
                        match constants.get(index) {
                            Some(Constant::Int(v)) => {
                                let _ = write!(out, " ({v})");
                            }
                            Some(Constant::Float64(v)) => {
                                let _ = write!(out, " ({v:?})");
                            }
                            Some(Constant::StringData(s)) => {
                                let _ = write!(out, " ({s:?})");
                            }
                            None => {}
                        }
                    }
                }
                OpCode::Jump | OpCode::JumpIfFalse => {
                    if let Some(rel) = self.read_i16(offset + 1) {
                        let _ = write!(out, "-> {:04}", next as i64 + i64::from(rel));
                    }
                }
                _ if op.operand_size() == 2 => {
                    if let Some(slot) = self.read_u16(offset + 1) {
                        let _ = write!(out, "slot {slot}");
                    }
                }
                _ => {}
            }
            out.truncate(out.trim_end().len());
            out.push('\n');
            offset = next;
        }

        out
    }

    /// Check if this chunk contains exactly the given opcode sequence.
    ///
    /// This ignores operand values, only checking the opcodes themselves.
    /// Panics with a descriptive message if the sequences don't match.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check if this chunk contains the given opcodes (in order, but not necessarily contiguous).
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}
