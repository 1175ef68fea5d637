//! The interpreter loop.

use std::io::{BufRead, Write};

use cfpl_compiler::{CompiledProgram, Constant, OpCode};
use cfpl_core::RuntimeError;

use crate::input::InputReader;
use crate::value::{Value, format_char, format_double};

/// A CFPL virtual machine reading program input from `R` and printing to `W`.
pub struct Vm<R, W> {
    input: InputReader<R>,
    output: W,
    stack: Vec<Value>,
    locals: Vec<Value>,
    /// Offset of the instruction being executed.
    ip: usize,
}

impl<R: BufRead, W: Write> Vm<R, W> {
    /// Create a VM with an empty stack. Locals are sized per program by
    /// [`Vm::run`].
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: InputReader::new(input),
            output,
            stack: Vec::new(),
            locals: Vec::new(),
            ip: 0,
        }
    }

    /// The output written so far.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Execute `program` from its first instruction until `RETURN_VOID` or
    /// the end of the code.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self, program: &CompiledProgram) -> Result<(), RuntimeError> {
        tracing::debug!(
            name = %program.name,
            code = program.chunk.len(),
            slots = program.slot_count,
            "running program"
        );
        self.stack.clear();
        self.locals = vec![Value::default(); usize::from(program.slot_count)];
        self.ip = 0;

        let result = self.execute(program);
        self.output.flush()?;
        if let Err(error) = &result {
            tracing::debug!(%error, offset = self.ip, "program failed");
        }
        result
    }

    fn execute(&mut self, program: &CompiledProgram) -> Result<(), RuntimeError> {
        let chunk = &program.chunk;

        while let Some(byte) = chunk.read_byte(self.ip) {
            let op = OpCode::from_u8(byte).ok_or(RuntimeError::InvalidOpcode {
                byte,
                offset: self.ip,
            })?;
            let next = self.ip + 1 + op.operand_size();
            tracing::trace!(offset = self.ip, op = op.name(), depth = self.stack.len());

            match op {
                OpCode::Constant => {
                    let index = self.operand(chunk.read_byte(self.ip + 1))?;
                    self.push_constant(program, u32::from(index))?;
                }
                OpCode::ConstantWide => {
                    let index = self.operand(chunk.read_u16(self.ip + 1))?;
                    self.push_constant(program, u32::from(index))?;
                }
                OpCode::PushNull => self.stack.push(Value::Null),
                OpCode::PushTrue | OpCode::PushOne => self.stack.push(Value::Int(1)),
                OpCode::PushFalse | OpCode::PushZero => self.stack.push(Value::Int(0)),

                OpCode::LoadInt | OpCode::LoadDouble | OpCode::LoadRef => {
                    let slot = self.operand(chunk.read_u16(self.ip + 1))?;
                    let value = self.local(slot)?.clone();
                    self.stack.push(value);
                }
                OpCode::StoreInt | OpCode::StoreDouble | OpCode::StoreRef => {
                    let slot = self.operand(chunk.read_u16(self.ip + 1))?;
                    let value = match op {
                        OpCode::StoreInt => Value::Int(self.pop_int()?),
                        OpCode::StoreDouble => Value::Double(self.pop_double()?),
                        _ => self.pop_string_ref()?,
                    };
                    *self.local_mut(slot)? = value;
                }

                OpCode::AddI32 => self.int_binary(i32::wrapping_add)?,
                OpCode::SubI32 => self.int_binary(i32::wrapping_sub)?,
                OpCode::MulI32 => self.int_binary(i32::wrapping_mul)?,
                OpCode::DivI32 | OpCode::ModI32 => {
                    let b = self.pop_int()?;
                    let a = self.pop_int()?;
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    let result = if op == OpCode::DivI32 {
                        a.wrapping_div(b)
                    } else {
                        a.wrapping_rem(b)
                    };
                    self.stack.push(Value::Int(result));
                }
                OpCode::NegI32 => {
                    let a = self.pop_int()?;
                    self.stack.push(Value::Int(a.wrapping_neg()));
                }

                OpCode::AddF64 => self.double_binary(|a, b| a + b)?,
                OpCode::SubF64 => self.double_binary(|a, b| a - b)?,
                OpCode::MulF64 => self.double_binary(|a, b| a * b)?,
                OpCode::DivF64 => self.double_binary(|a, b| a / b)?,
                OpCode::NegF64 => {
                    let a = self.pop_double()?;
                    self.stack.push(Value::Double(-a));
                }

                OpCode::EqI32 => self.int_compare(|a, b| a == b)?,
                OpCode::NeI32 => self.int_compare(|a, b| a != b)?,
                OpCode::LtI32 => self.int_compare(|a, b| a < b)?,
                OpCode::LeI32 => self.int_compare(|a, b| a <= b)?,
                OpCode::GtI32 => self.int_compare(|a, b| a > b)?,
                OpCode::GeI32 => self.int_compare(|a, b| a >= b)?,
                OpCode::EqF64 => self.double_compare(|a, b| a == b)?,
                OpCode::NeF64 => self.double_compare(|a, b| a != b)?,
                OpCode::LtF64 => self.double_compare(|a, b| a < b)?,
                OpCode::LeF64 => self.double_compare(|a, b| a <= b)?,
                OpCode::GtF64 => self.double_compare(|a, b| a > b)?,
                OpCode::GeF64 => self.double_compare(|a, b| a >= b)?,

                OpCode::And => self.int_compare(|a, b| a != 0 && b != 0)?,
                OpCode::Or => self.int_compare(|a, b| a != 0 || b != 0)?,
                OpCode::Not => {
                    let a = self.pop_int()?;
                    self.stack.push(Value::from_bool(a == 0));
                }

                OpCode::Concat => {
                    let b = self.pop_string_ref()?;
                    let a = self.pop_string_ref()?;
                    self.stack.push(Value::Str(format!("{a}{b}")));
                }

                OpCode::I32toF64 => {
                    let a = self.pop_int()?;
                    self.stack.push(Value::Double(f64::from(a)));
                }
                OpCode::F64toI32 => {
                    // Saturating, NaN becomes 0.
                    let a = self.pop_double()?;
                    self.stack.push(Value::Int(a as i32));
                }
                OpCode::BoolToString => {
                    let a = self.pop_int()?;
                    self.stack.push(Value::Str((a != 0).to_string()));
                }
                OpCode::CharToString => {
                    let a = self.pop_int()?;
                    self.stack.push(Value::Str(format_char(a)));
                }
                OpCode::I32ToString => {
                    let a = self.pop_int()?;
                    self.stack.push(Value::Str(a.to_string()));
                }
                OpCode::F64ToString => {
                    let a = self.pop_double()?;
                    self.stack.push(Value::Str(format_double(a)));
                }
                OpCode::ParseBool => {
                    let value = match self.pop_string_ref()? {
                        Value::Str(s) => s.trim().eq_ignore_ascii_case("true"),
                        _ => false,
                    };
                    self.stack.push(Value::from_bool(value));
                }
                OpCode::ParseI32 => {
                    let text = self.pop_string()?;
                    let value = text
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| RuntimeError::InvalidNumber { text })?;
                    self.stack.push(Value::Int(value));
                }
                OpCode::ParseF64 => {
                    let text = self.pop_string()?;
                    let value = text
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| RuntimeError::InvalidNumber { text })?;
                    self.stack.push(Value::Double(value));
                }

                OpCode::Jump => {
                    self.ip = self.branch_target(chunk.read_i16(self.ip + 1), next, chunk.len())?;
                    continue;
                }
                OpCode::JumpIfFalse => {
                    let target = self.branch_target(chunk.read_i16(self.ip + 1), next, chunk.len())?;
                    if self.pop_int()? == 0 {
                        self.ip = target;
                        continue;
                    }
                }
                OpCode::ReturnVoid => return Ok(()),

                OpCode::Print => {
                    let value = self.pop_string_ref()?;
                    writeln!(self.output, "{value}")?;
                }
                OpCode::ReadValue => {
                    let value = self.input.next_value()?;
                    self.stack.push(Value::Str(value));
                }
            }

            self.ip = next;
        }

        Ok(())
    }

    // =========================================
    // Operands
    // =========================================

    fn operand<T>(&self, value: Option<T>) -> Result<T, RuntimeError> {
        value.ok_or(RuntimeError::OperandOutOfRange { offset: self.ip })
    }

    fn push_constant(&mut self, program: &CompiledProgram, index: u32) -> Result<(), RuntimeError> {
        let value = match self.operand(program.constants.get(index))? {
            Constant::Int(v) => Value::Int(self.operand(i32::try_from(*v).ok())?),
            Constant::Float64(v) => Value::Double(*v),
            Constant::StringData(s) => Value::Str(s.clone()),
        };
        self.stack.push(value);
        Ok(())
    }

    fn local(&self, slot: u16) -> Result<&Value, RuntimeError> {
        self.operand(self.locals.get(usize::from(slot)))
    }

    fn local_mut(&mut self, slot: u16) -> Result<&mut Value, RuntimeError> {
        let offset = self.ip;
        self.locals
            .get_mut(usize::from(slot))
            .ok_or(RuntimeError::OperandOutOfRange { offset })
    }

    /// Resolve a relative branch; the target may be the end of the code.
    fn branch_target(&self, rel: Option<i16>, next: usize, len: usize) -> Result<usize, RuntimeError> {
        let rel = self.operand(rel)?;
        let target = next as i64 + i64::from(rel);
        usize::try_from(target)
            .ok()
            .filter(|&t| t <= len)
            .ok_or(RuntimeError::OperandOutOfRange { offset: self.ip })
    }

    // =========================================
    // Stack
    // =========================================

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { offset: self.ip })
    }

    fn mismatch(&self, expected: &'static str, actual: &Value) -> RuntimeError {
        RuntimeError::TypeMismatch {
            offset: self.ip,
            expected,
            actual: actual.kind(),
        }
    }

    fn pop_int(&mut self) -> Result<i32, RuntimeError> {
        match self.pop()? {
            Value::Int(v) => Ok(v),
            other => Err(self.mismatch("int", &other)),
        }
    }

    fn pop_double(&mut self) -> Result<f64, RuntimeError> {
        match self.pop()? {
            Value::Double(v) => Ok(v),
            other => Err(self.mismatch("double", &other)),
        }
    }

    /// Pop a string or null.
    fn pop_string_ref(&mut self) -> Result<Value, RuntimeError> {
        match self.pop()? {
            value @ (Value::Str(_) | Value::Null) => Ok(value),
            other => Err(self.mismatch("string", &other)),
        }
    }

    /// Pop a non-null string.
    fn pop_string(&mut self) -> Result<String, RuntimeError> {
        match self.pop_string_ref()? {
            Value::Str(s) => Ok(s),
            _ => Err(RuntimeError::NullReference),
        }
    }

    fn int_binary(&mut self, f: impl Fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        self.stack.push(Value::Int(f(a, b)));
        Ok(())
    }

    fn int_compare(&mut self, f: impl Fn(i32, i32) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        self.stack.push(Value::from_bool(f(a, b)));
        Ok(())
    }

    fn double_binary(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop_double()?;
        let a = self.pop_double()?;
        self.stack.push(Value::Double(f(a, b)));
        Ok(())
    }

    fn double_compare(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop_double()?;
        let a = self.pop_double()?;
        self.stack.push(Value::from_bool(f(a, b)));
        Ok(())
    }
}
