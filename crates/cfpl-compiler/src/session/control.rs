//! Structured control flow over labels.
//!
//! The front end calls these in source order and keeps the returned labels
//! until the matching closing call.
//!
//! ## Bytecode Layout
//!
//! `IF (cond) START then STOP ELSE START else STOP`:
//! ```text
//!   <cond>
//!   [to BOOL]
//!   JUMP_IF_FALSE else         ; start_if
//!   <then>
//!   JUMP end                   ; start_else
//! else:
//!   <else>
//! end:                         ; end_if(end)
//! ```
//!
//! Without `ELSE`, `end_if` receives the label from `start_if` and the two
//! targets coincide.
//!
//! `WHILE (cond) START body STOP`:
//! ```text
//! top:                         ; start_while
//!   <cond>
//!   [to BOOL]
//!   JUMP_IF_FALSE exit         ; while_cond
//!   <body>
//!   JUMP top                   ; end_while
//! exit:
//! ```

use cfpl_core::Type;

use super::CodeSession;
use crate::bytecode::OpCode;
use crate::emit::Label;

impl CodeSession {
    /// Branch past the then-part when the condition of type `ty` is false.
    ///
    /// Returns the else label.
    pub fn start_if(&mut self, ty: Type) -> Label {
        let else_label = self.new_label();
        self.convert(ty, Type::Bool);
        self.code.emit_branch(OpCode::JumpIfFalse, else_label);
        else_label
    }

    /// End the then-part and start the else-part.
    ///
    /// Returns the end label.
    pub fn start_else(&mut self, else_label: Label) -> Label {
        let end_label = self.new_label();
        self.code.emit_branch(OpCode::Jump, end_label);
        self.code.define_label(else_label);
        end_label
    }

    /// Close an `IF`.
    pub fn end_if(&mut self, label: Label) {
        self.code.define_label(label);
    }

    /// Mark the top of a loop, before its condition.
    pub fn start_while(&mut self) -> Label {
        let top = self.new_label();
        self.code.define_label(top);
        top
    }

    /// Leave the loop when the condition of type `ty` is false.
    ///
    /// Returns the exit label.
    pub fn while_cond(&mut self, ty: Type) -> Label {
        let exit = self.new_label();
        self.convert(ty, Type::Bool);
        self.code.emit_branch(OpCode::JumpIfFalse, exit);
        exit
    }

    /// Jump back to `top` and place `exit` after the loop.
    pub fn end_while(&mut self, top: Label, exit: Label) {
        self.code.emit_branch(OpCode::Jump, top);
        self.code.define_label(exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::BytecodeChunk;

    /// Step through the integer subset of the instruction set and collect
    /// the string constants pushed on the executed path.
    fn trace_prints(session: CodeSession) -> Vec<String> {
        let result = session.finish("flow").unwrap();
        assert!(result.is_success(), "{:?}", result.errors);
        let chunk: &BytecodeChunk = &result.program.chunk;
        let constants = &result.program.constants;

        let mut printed = Vec::new();
        let mut stack: Vec<i64> = Vec::new();
        let mut pc = 0;
        let mut steps = 0;
        while let Some(op) = chunk.read_op(pc) {
            steps += 1;
            assert!(steps < 1000, "runaway loop");
            let next = pc + 1 + op.operand_size();
            pc = match op {
                OpCode::PushZero | OpCode::PushFalse => {
                    stack.push(0);
                    next
                }
                OpCode::PushOne | OpCode::PushTrue => {
                    stack.push(1);
                    next
                }
                OpCode::Constant => {
                    let index = chunk.read_byte(pc + 1).unwrap();
                    match constants.get(u32::from(index)).unwrap() {
                        crate::bytecode::Constant::Int(v) => stack.push(*v),
                        crate::bytecode::Constant::StringData(s) => {
                            printed.push(s.clone());
                            stack.push(0);
                        }
                        other => panic!("unexpected constant {other:?}"),
                    }
                    next
                }
                OpCode::NeI32 => {
                    let b = stack.pop().unwrap();
                    let a = stack.pop().unwrap();
                    stack.push(i64::from(a != b));
                    next
                }
                OpCode::Print => {
                    stack.pop();
                    next
                }
                OpCode::JumpIfFalse => {
                    let rel = chunk.read_i16(pc + 1).unwrap();
                    if stack.pop().unwrap() == 0 {
                        (next as i64 + i64::from(rel)) as usize
                    } else {
                        next
                    }
                }
                OpCode::Jump => {
                    let rel = chunk.read_i16(pc + 1).unwrap();
                    (next as i64 + i64::from(rel)) as usize
                }
                OpCode::ReturnVoid => break,
                other => panic!("unexpected {}", other.name()),
            };
        }
        printed
    }

    fn emit_print(session: &mut CodeSession, text: &str) {
        let ty = session.literal_string(&format!("\"{text}\""));
        session.output(ty);
    }

    fn if_else(cond: &str) -> CodeSession {
        let mut session = CodeSession::new();
        let ty = session.literal_int(cond);
        let else_label = session.start_if(ty);
        emit_print(&mut session, "X");
        let end_label = session.start_else(else_label);
        emit_print(&mut session, "Y");
        session.end_if(end_label);
        session
    }

    #[test]
    fn if_zero_takes_else_branch() {
        assert_eq!(trace_prints(if_else("0")), vec!["Y"]);
    }

    #[test]
    fn if_nonzero_takes_then_branch() {
        assert_eq!(trace_prints(if_else("5")), vec!["X"]);
    }

    #[test]
    fn if_without_else_shares_label() {
        for (cond, expected) in [(false, vec!["after"]), (true, vec!["then", "after"])] {
            let mut session = CodeSession::new();
            let ty = session.literal_bool(cond);
            let label = session.start_if(ty);
            emit_print(&mut session, "then");
            session.end_if(label);
            emit_print(&mut session, "after");
            assert_eq!(trace_prints(session), expected);
        }
    }

    #[test]
    fn if_layout() {
        let mut session = CodeSession::new();
        let ty = session.literal_int("5");
        let else_label = session.start_if(ty);
        let end_label = session.start_else(else_label);
        session.end_if(end_label);
        assert_ne!(else_label, end_label);

        let result = session.finish("layout").unwrap();
        result.program.chunk.assert_opcodes(&[
            OpCode::Constant,
            OpCode::PushZero,
            OpCode::NeI32,
            OpCode::JumpIfFalse,
            OpCode::Jump,
            OpCode::ReturnVoid,
        ]);
    }

    #[test]
    fn while_false_runs_zero_times() {
        let mut session = CodeSession::new();
        let top = session.start_while();
        let ty = session.literal_bool(false);
        let exit = session.while_cond(ty);
        emit_print(&mut session, "body");
        session.end_while(top, exit);
        emit_print(&mut session, "done");

        assert_eq!(trace_prints(session), vec!["done"]);
    }

    #[test]
    fn while_layout_jumps_back_to_top() {
        let mut session = CodeSession::new();
        let top = session.start_while();
        let ty = session.literal_int("0");
        let exit = session.while_cond(ty);
        session.end_while(top, exit);

        let result = session.finish("loop").unwrap();
        let chunk = &result.program.chunk;
        chunk.assert_opcodes(&[
            OpCode::PushZero,
            OpCode::PushZero,
            OpCode::NeI32,
            OpCode::JumpIfFalse,
            OpCode::Jump,
            OpCode::ReturnVoid,
        ]);
        // JUMP at offset 6, next instruction at 9, top at 0
        assert_eq!(chunk.read_i16(7), Some(-9));
        // JUMP_IF_FALSE at 3 lands on RETURN_VOID at 9
        assert_eq!(chunk.read_i16(4), Some(3));
    }

    #[test]
    fn string_condition_parses_bool() {
        let mut session = CodeSession::new();
        let ty = session.literal_string("\"true\"");
        let label = session.start_if(ty);
        session.end_if(label);
        assert_eq!(
            session.code().opcodes(),
            vec![OpCode::Constant, OpCode::ParseBool, OpCode::JumpIfFalse]
        );
    }

    #[test]
    fn labels_are_unique() {
        let mut session = CodeSession::new();
        let a = session.new_label();
        let b = session.new_label();
        assert_ne!(a, b);
    }
}
