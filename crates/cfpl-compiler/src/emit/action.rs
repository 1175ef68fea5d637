//! Code-emission actions attached to conversion edges and overload candidates.

use std::fmt;

use super::CodeBuffer;
use crate::bytecode::OpCode;

/// What to emit when a conversion step or an operator is applied.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Nothing; the value representation is already correct.
    None,
    /// A single opcode.
    Op(OpCode),
    /// A fixed opcode sequence.
    Sequence(&'static [OpCode]),
}

impl Action {
    /// Append this action's code to `code`.
    pub fn emit(&self, code: &mut CodeBuffer) {
        match self {
            Action::None => {}
            Action::Op(op) => code.emit(*op),
            Action::Sequence(ops) => {
                for op in ops.iter() {
                    code.emit(*op);
                }
            }
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::None => f.write_str("none"),
            Action::Op(op) => f.write_str(op.name()),
            Action::Sequence(ops) => {
                let names: Vec<_> = ops.iter().map(|op| op.name()).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_emits_nothing() {
        let mut code = CodeBuffer::new();
        Action::None.emit(&mut code);
        assert!(code.is_empty());
    }

    #[test]
    fn sequence_emits_in_order() {
        let mut code = CodeBuffer::new();
        Action::Sequence(&[OpCode::PushZero, OpCode::NeI32]).emit(&mut code);
        assert_eq!(code.opcodes(), vec![OpCode::PushZero, OpCode::NeI32]);
    }

    #[test]
    fn debug_uses_opcode_names() {
        assert_eq!(format!("{:?}", Action::Op(OpCode::I32toF64)), "I32_TO_F64");
        assert_eq!(
            format!("{:?}", Action::Sequence(&[OpCode::PushZero, OpCode::NeI32])),
            "[PUSH_ZERO, NE_I32]"
        );
    }
}
