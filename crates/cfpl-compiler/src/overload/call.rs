//! Deferred-argument call protocol.
//!
//! A stack machine needs every argument on the stack before the operation
//! runs, but which overload is chosen (and therefore which conversions each
//! argument needs) is only known once all argument types are in. The first
//! argument is emitted straight into the live buffer; every later one is
//! emitted into its own buffer and held back.
//!
//! ```text
//!   a + b        (a: INT, b: FLOAT)
//!
//!   live:      <a>
//!   deferred:  [<b>]
//!
//!   resolve "+" (INT, FLOAT) -> FLOAT + FLOAT
//!
//!   live:      <a>  I32_TO_F64  <b>  ADD_F64
//!               |   chain 0      |   action
//!               |                spliced, chain 1 empty
//! ```

use cfpl_core::{CompilationError, Span, Type};

use super::{OverloadTable, format_types};
use crate::conversion::ConversionGraph;
use crate::emit::CodeBuffer;

/// Where the next argument's code goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgTarget {
    /// Inline into the live buffer.
    Live,
    /// Into a fresh buffer handed back through [`CallBuilder::end_arg`].
    Deferred,
}

/// State of one call while its arguments are being generated.
#[derive(Debug, Default)]
pub struct CallBuilder {
    arg_types: Vec<Type>,
    /// Code of every argument after the first.
    deferred: Vec<CodeBuffer>,
    /// Set between `start_arg` and `end_arg`.
    open: Option<ArgTarget>,
}

impl CallBuilder {
    /// Create a call with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin the next argument and say where its code must be emitted.
    pub fn start_arg(&mut self) -> ArgTarget {
        let target = if self.arg_types.is_empty() {
            ArgTarget::Live
        } else {
            ArgTarget::Deferred
        };
        self.open = Some(target);
        target
    }

    /// The target of the argument currently being generated.
    pub fn open_arg(&self) -> Option<ArgTarget> {
        self.open
    }

    /// Record the type of the argument just generated.
    ///
    /// `code` must be the argument's buffer when it was deferred.
    pub fn end_arg(&mut self, ty: Type, code: Option<CodeBuffer>) {
        self.arg_types.push(ty);
        self.deferred.extend(code);
        self.open = None;
    }

    /// Argument types recorded so far.
    pub fn arg_types(&self) -> &[Type] {
        &self.arg_types
    }

    /// Resolve `name` and emit the call into `code`.
    ///
    /// On success the first argument's conversion is applied, each deferred
    /// argument is spliced and converted in turn, and the candidate's action
    /// follows. On failure the deferred code is dropped and nothing is
    /// emitted.
    pub fn finish(
        self,
        name: &str,
        overloads: &OverloadTable,
        graph: &ConversionGraph,
        code: &mut CodeBuffer,
        span: Span,
    ) -> Result<Type, CompilationError> {
        let Some(found) = overloads.resolve(name, &self.arg_types, graph) else {
            return Err(CompilationError::NoMatchingOverload {
                name: name.to_string(),
                args: format_types(&self.arg_types),
                span,
            });
        };

        let mut chains = found.chains.iter();
        if let Some(first) = chains.next() {
            first.apply(code);
        }
        for (arg, chain) in self.deferred.into_iter().zip(chains) {
            code.append(arg);
            chain.apply(code);
        }
        found.candidate.action.emit(code);

        Ok(found.candidate.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use crate::conversion::widening;
    use crate::overload::operators;

    /// Run the protocol for `lhs <name> rhs` where each operand pushes `op`.
    fn binary(
        name: &str,
        lhs: (Type, OpCode),
        rhs: (Type, OpCode),
    ) -> (Result<Type, CompilationError>, CodeBuffer) {
        let mut live = CodeBuffer::new();
        let mut call = CallBuilder::new();

        assert_eq!(call.start_arg(), ArgTarget::Live);
        live.emit(lhs.1);
        call.end_arg(lhs.0, None);

        assert_eq!(call.start_arg(), ArgTarget::Deferred);
        let mut arg = CodeBuffer::new();
        arg.emit(rhs.1);
        call.end_arg(rhs.0, Some(arg));

        let result = call.finish(name, &operators(), &widening(), &mut live, Span::default());
        (result, live)
    }

    #[test]
    fn int_plus_float_widens_first_operand() {
        let (result, code) = binary(
            "+",
            (Type::Int, OpCode::PushOne),
            (Type::Float, OpCode::ConstantWide),
        );
        assert_eq!(result, Ok(Type::Float));
        assert_eq!(
            code.opcodes(),
            vec![OpCode::PushOne, OpCode::I32toF64, OpCode::ConstantWide, OpCode::AddF64]
        );
    }

    #[test]
    fn float_plus_int_widens_second_operand_after_splice() {
        let (result, code) = binary(
            "+",
            (Type::Float, OpCode::ConstantWide),
            (Type::Int, OpCode::PushOne),
        );
        assert_eq!(result, Ok(Type::Float));
        assert_eq!(
            code.opcodes(),
            vec![OpCode::ConstantWide, OpCode::PushOne, OpCode::I32toF64, OpCode::AddF64]
        );
    }

    #[test]
    fn concat_needs_no_conversion() {
        let (result, code) = binary(
            "&",
            (Type::String, OpCode::PushNull),
            (Type::String, OpCode::PushNull),
        );
        assert_eq!(result, Ok(Type::String));
        assert_eq!(
            code.opcodes(),
            vec![OpCode::PushNull, OpCode::PushNull, OpCode::Concat]
        );
    }

    #[test]
    fn failure_drops_deferred_code() {
        let (result, code) = binary(
            "AND",
            (Type::Bool, OpCode::PushTrue),
            (Type::Float, OpCode::ConstantWide),
        );
        assert!(matches!(
            result,
            Err(CompilationError::NoMatchingOverload { ref name, ref args, .. })
                if name == "AND" && args == "BOOL, FLOAT"
        ));
        assert_eq!(code.opcodes(), vec![OpCode::PushTrue]);
    }

    #[test]
    fn unary_call_has_nothing_deferred() {
        let mut live = CodeBuffer::new();
        let mut call = CallBuilder::new();
        call.start_arg();
        live.emit(OpCode::PushFalse);
        call.end_arg(Type::Bool, None);
        assert_eq!(call.arg_types(), &[Type::Bool]);
        assert_eq!(call.open_arg(), None);

        let result = call.finish("NOT", &operators(), &widening(), &mut live, Span::default());
        assert_eq!(result, Ok(Type::Bool));
        assert_eq!(live.opcodes(), vec![OpCode::PushFalse, OpCode::Not]);
    }

    #[test]
    fn three_arguments_splice_in_order() {
        let mut table = OverloadTable::new();
        table.add(
            "pick",
            Type::Int,
            &[Type::Int, Type::Int, Type::Int],
            crate::emit::Action::Op(OpCode::AddI32),
        );

        let mut live = CodeBuffer::new();
        let mut call = CallBuilder::new();
        call.start_arg();
        live.emit(OpCode::PushZero);
        call.end_arg(Type::Int, None);
        for op in [OpCode::PushOne, OpCode::PushTrue] {
            assert_eq!(call.start_arg(), ArgTarget::Deferred);
            let mut arg = CodeBuffer::new();
            arg.emit(op);
            call.end_arg(if op == OpCode::PushTrue { Type::Bool } else { Type::Int }, Some(arg));
        }

        let result = call.finish("pick", &table, &widening(), &mut live, Span::default());
        assert_eq!(result, Ok(Type::Int));
        assert_eq!(
            live.opcodes(),
            vec![OpCode::PushZero, OpCode::PushOne, OpCode::PushTrue, OpCode::AddI32]
        );
    }
}
