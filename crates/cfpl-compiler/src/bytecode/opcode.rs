//! Bytecode operation codes.
//!
//! This module defines the instruction set of the CFPL VM.
//! Each opcode is a single byte, with operands following inline.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The VM is a stack-based machine. Most operations pop operands
/// from the stack and push results back. BOOL, CHAR and INT values share
/// the integer representation; FLOAT values are doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push constant from pool (8-bit index).
    /// Operand: u8 constant index
    Constant = 0,
    /// Push constant from pool (16-bit index).
    /// Operand: u16 constant index (big-endian)
    ConstantWide,
    /// Push null string reference.
    PushNull,
    /// Push integer 1.
    PushTrue,
    /// Push integer 0.
    PushFalse,
    /// Push integer 0.
    PushZero,
    /// Push integer 1.
    PushOne,

    // =========================================================================
    // Local Variables
    // =========================================================================
    /// Load an integer-class local.
    /// Operand: u16 slot
    LoadInt,
    /// Load a double-width local.
    /// Operand: u16 slot
    LoadDouble,
    /// Load a string reference local.
    /// Operand: u16 slot
    LoadRef,
    /// Store an integer-class local.
    /// Operand: u16 slot
    StoreInt,
    /// Store a double-width local.
    /// Operand: u16 slot
    StoreDouble,
    /// Store a string reference local.
    /// Operand: u16 slot
    StoreRef,

    // =========================================================================
    // Arithmetic (i32)
    // =========================================================================
    /// Add two i32 values.
    AddI32,
    /// Subtract two i32 values.
    SubI32,
    /// Multiply two i32 values.
    MulI32,
    /// Divide two i32 values.
    DivI32,
    /// Remainder of two i32 values.
    ModI32,
    /// Negate i32 value.
    NegI32,

    // =========================================================================
    // Arithmetic (f64)
    // =========================================================================
    /// Add two f64 values.
    AddF64,
    /// Subtract two f64 values.
    SubF64,
    /// Multiply two f64 values.
    MulF64,
    /// Divide two f64 values.
    DivF64,
    /// Negate f64 value.
    NegF64,

    // =========================================================================
    // Comparisons (produce bool)
    // =========================================================================
    /// i32 equality.
    EqI32,
    /// i32 inequality.
    NeI32,
    /// i32 less than.
    LtI32,
    /// i32 less than or equal.
    LeI32,
    /// i32 greater than.
    GtI32,
    /// i32 greater than or equal.
    GeI32,
    /// f64 equality.
    EqF64,
    /// f64 inequality.
    NeF64,
    /// f64 less than.
    LtF64,
    /// f64 less than or equal.
    LeF64,
    /// f64 greater than.
    GtF64,
    /// f64 greater than or equal.
    GeF64,

    // =========================================================================
    // Logical Operations
    // =========================================================================
    /// Boolean AND of two integer-class values.
    And,
    /// Boolean OR of two integer-class values.
    Or,
    /// Boolean NOT.
    Not,

    // =========================================================================
    // Strings
    // =========================================================================
    /// Concatenate two strings.
    Concat,

    // =========================================================================
    // Type Conversions
    // =========================================================================
    /// Convert i32 to f64.
    I32toF64,
    /// Convert f64 to i32 (truncating).
    F64toI32,
    /// Render a bool as a string.
    BoolToString,
    /// Render a char as a string.
    CharToString,
    /// Render an i32 as a string.
    I32ToString,
    /// Render an f64 as a string.
    F64ToString,
    /// Parse a string as a bool.
    ParseBool,
    /// Parse a string as an i32.
    ParseI32,
    /// Parse a string as an f64.
    ParseF64,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Unconditional jump.
    /// Operand: i16 offset relative to the next instruction (big-endian)
    Jump,
    /// Pop a value and jump if it is false (zero).
    /// Operand: i16 offset relative to the next instruction (big-endian)
    JumpIfFalse,
    /// End of program.
    ReturnVoid,

    // =========================================================================
    // Input / Output
    // =========================================================================
    /// Pop a string and print it followed by a newline.
    Print,
    /// Push the next comma-separated input value as a string.
    ReadValue,
}

impl OpCode {
    /// Convert from u8, returning None for invalid values.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Get the size of operands for this opcode in bytes.
    ///
    /// This does NOT include the opcode byte itself.
    pub fn operand_size(&self) -> usize {
        match self {
            // 1-byte operand
            OpCode::Constant => 1,

            // 2-byte operand
            OpCode::ConstantWide
            | OpCode::LoadInt
            | OpCode::LoadDouble
            | OpCode::LoadRef
            | OpCode::StoreInt
            | OpCode::StoreDouble
            | OpCode::StoreRef
            | OpCode::Jump
            | OpCode::JumpIfFalse => 2,

            // No operands
            _ => 0,
        }
    }

    /// Whether this opcode is a branch carrying a relative offset.
    pub fn is_branch(&self) -> bool {
        matches!(self, OpCode::Jump | OpCode::JumpIfFalse)
    }

    /// Get the name of this opcode for debugging.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::ConstantWide => "CONSTANT_WIDE",
            OpCode::PushNull => "PUSH_NULL",
            OpCode::PushTrue => "PUSH_TRUE",
            OpCode::PushFalse => "PUSH_FALSE",
            OpCode::PushZero => "PUSH_ZERO",
            OpCode::PushOne => "PUSH_ONE",
            OpCode::LoadInt => "LOAD_INT",
            OpCode::LoadDouble => "LOAD_DOUBLE",
            OpCode::LoadRef => "LOAD_REF",
            OpCode::StoreInt => "STORE_INT",
            OpCode::StoreDouble => "STORE_DOUBLE",
            OpCode::StoreRef => "STORE_REF",
            OpCode::AddI32 => "ADD_I32",
            OpCode::SubI32 => "SUB_I32",
            OpCode::MulI32 => "MUL_I32",
            OpCode::DivI32 => "DIV_I32",
            OpCode::ModI32 => "MOD_I32",
            OpCode::NegI32 => "NEG_I32",
            OpCode::AddF64 => "ADD_F64",
            OpCode::SubF64 => "SUB_F64",
            OpCode::MulF64 => "MUL_F64",
            OpCode::DivF64 => "DIV_F64",
            OpCode::NegF64 => "NEG_F64",
            OpCode::EqI32 => "EQ_I32",
            OpCode::NeI32 => "NE_I32",
            OpCode::LtI32 => "LT_I32",
            OpCode::LeI32 => "LE_I32",
            OpCode::GtI32 => "GT_I32",
            OpCode::GeI32 => "GE_I32",
            OpCode::EqF64 => "EQ_F64",
            OpCode::NeF64 => "NE_F64",
            OpCode::LtF64 => "LT_F64",
            OpCode::LeF64 => "LE_F64",
            OpCode::GtF64 => "GT_F64",
            OpCode::GeF64 => "GE_F64",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Not => "NOT",
            OpCode::Concat => "CONCAT",
            OpCode::I32toF64 => "I32_TO_F64",
            OpCode::F64toI32 => "F64_TO_I32",
            OpCode::BoolToString => "BOOL_TO_STRING",
            OpCode::CharToString => "CHAR_TO_STRING",
            OpCode::I32ToString => "I32_TO_STRING",
            OpCode::F64ToString => "F64_TO_STRING",
            OpCode::ParseBool => "PARSE_BOOL",
            OpCode::ParseI32 => "PARSE_I32",
            OpCode::ParseF64 => "PARSE_F64",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::ReturnVoid => "RETURN_VOID",
            OpCode::Print => "PRINT",
            OpCode::ReadValue => "READ_VALUE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_repr() {
        assert_eq!(OpCode::Constant as u8, 0);
        assert_eq!(OpCode::ConstantWide as u8, 1);
    }

    #[test]
    fn opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Constant));
        assert_eq!(OpCode::from_u8(1), Some(OpCode::ConstantWide));
        assert_eq!(OpCode::from_u8(255), None);

        let last = OpCode::ReadValue as u8;
        assert_eq!(OpCode::from_u8(last), Some(OpCode::ReadValue));
        assert_eq!(OpCode::from_u8(last + 1), None);
    }

    #[test]
    fn opcode_name() {
        assert_eq!(OpCode::Constant.name(), "CONSTANT");
        assert_eq!(OpCode::AddI32.name(), "ADD_I32");
        assert_eq!(OpCode::JumpIfFalse.name(), "JUMP_IF_FALSE");
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(OpCode::AddI32.operand_size(), 0);
        assert_eq!(OpCode::Print.operand_size(), 0);

        assert_eq!(OpCode::Constant.operand_size(), 1);

        assert_eq!(OpCode::ConstantWide.operand_size(), 2);
        assert_eq!(OpCode::LoadDouble.operand_size(), 2);
        assert_eq!(OpCode::Jump.operand_size(), 2);
    }
}
