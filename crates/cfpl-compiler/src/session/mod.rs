//! Single-pass code generation session.
//!
//! A [`CodeSession`] is driven by the front end in source order. It owns the
//! live [`CodeBuffer`], a stack of suspended buffers, the open calls, the
//! pending declarations and the variable table, and turns every construct
//! into code as soon as it is recognized.
//!
//! ## Segments
//!
//! Some code can only be placed once later context is known: an initializer
//! has to be converted to a type that is parsed after it, an operand to the
//! parameter type of an operator that is resolved after it. Such code goes
//! into a *segment*:
//!
//! ```text
//!   open_segment()       live buffer pushed, fresh buffer becomes live
//!   ... emit ...
//!   close_segment()      fresh buffer returned, previous buffer live again
//! ```
//!
//! The returned buffer is spliced later with [`CodeBuffer::append`], or
//! dropped.
//!
//! ## Errors
//!
//! Semantic errors are recorded, logged and recovered from; generation goes
//! on so that one pass reports as many errors as possible.

mod control;
mod decl;

pub use decl::Variable;

use cfpl_core::{CompilationError, EmitError, Span, Type};

use crate::bytecode::{CompiledProgram, OpCode};
use crate::conversion::{self, ConversionGraph};
use crate::emit::{self, CodeBuffer, Label};
use crate::literals;
use crate::overload::{self, ArgTarget, CallBuilder, OverloadTable};
use decl::{PendingDeclaration, VariableTable};

/// Conversion graphs and operator table used by a session.
#[derive(Debug, Clone)]
pub struct Builtins {
    /// Lossless conversions, used for overload applicability.
    pub widening: ConversionGraph,
    /// Superset of `widening`, used for assignment, conditions and output.
    pub permissive: ConversionGraph,
    /// Operators and functions.
    pub overloads: OverloadTable,
}

impl Builtins {
    /// The standard CFPL graphs and operators.
    pub fn standard() -> Self {
        Self {
            widening: conversion::widening(),
            permissive: conversion::permissive(),
            overloads: overload::operators(),
        }
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::standard()
    }
}

/// Output of [`CodeSession::finish`].
#[derive(Debug)]
pub struct CompilationResult {
    /// The assembled program.
    pub program: CompiledProgram,
    /// Every error diagnosed during the pass.
    pub errors: Vec<CompilationError>,
}

impl CompilationResult {
    /// Check if compilation succeeded (no errors).
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Code generation state for one compiled unit.
#[derive(Debug)]
pub struct CodeSession {
    builtins: Builtins,
    /// Buffer currently receiving code.
    code: CodeBuffer,
    /// Suspended buffers, innermost last.
    segments: Vec<CodeBuffer>,
    /// Open calls, innermost last.
    calls: Vec<CallBuilder>,
    pending: Vec<PendingDeclaration>,
    vars: VariableTable,
    next_label: u32,
    span: Span,
    errors: Vec<CompilationError>,
}

impl Default for CodeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSession {
    /// Create a session using the standard builtins.
    pub fn new() -> Self {
        Self::with_builtins(Builtins::standard())
    }

    /// Create a session using custom graphs and operators.
    pub fn with_builtins(builtins: Builtins) -> Self {
        Self {
            builtins,
            code: CodeBuffer::new(),
            segments: Vec::new(),
            calls: Vec::new(),
            pending: Vec::new(),
            vars: VariableTable::default(),
            next_label: 0,
            span: Span::default(),
            errors: Vec::new(),
        }
    }

    /// The builtins this session resolves against.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Set the source position of the construct being generated.
    ///
    /// Used for diagnostics and the line table.
    pub fn set_span(&mut self, span: Span) {
        self.span = span;
        self.code.set_line(span.line);
    }

    /// The current source position.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Errors diagnosed so far.
    pub fn errors(&self) -> &[CompilationError] {
        &self.errors
    }

    /// The live buffer.
    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    /// Record a diagnosed error.
    pub fn report(&mut self, error: CompilationError) {
        tracing::error!(%error, "compilation error");
        self.errors.push(error);
    }

    fn internal(&mut self, message: impl Into<String>) {
        self.report(CompilationError::Internal {
            message: message.into(),
        });
    }

    // ==========================================================================
    // Segments
    // ==========================================================================

    /// Suspend the live buffer and start a nested one.
    pub fn open_segment(&mut self) {
        let nested = CodeBuffer::at_line(self.span.line);
        let parent = std::mem::replace(&mut self.code, nested);
        self.segments.push(parent);
    }

    /// Finish the nested buffer and resume its parent.
    ///
    /// The caller owns the returned code and decides whether to splice it.
    pub fn close_segment(&mut self) -> CodeBuffer {
        match self.segments.pop() {
            Some(parent) => std::mem::replace(&mut self.code, parent),
            None => {
                self.internal("segment closed without being opened");
                CodeBuffer::at_line(self.span.line)
            }
        }
    }

    /// Splice a closed segment into the live buffer.
    pub fn append(&mut self, code: CodeBuffer) {
        self.code.append(code);
    }

    /// Number of suspended buffers.
    pub fn segment_depth(&self) -> usize {
        self.segments.len()
    }

    // ==========================================================================
    // Conversions
    // ==========================================================================

    /// Convert the value on top of the stack from `from` to `to` through the
    /// permissive graph. Overload arguments use the widening graph instead,
    /// inside the call protocol.
    ///
    /// A missing chain is diagnosed and nothing is emitted.
    pub fn convert(&mut self, from: Type, to: Type) {
        if from == to {
            return;
        }
        match self.builtins.permissive.chain(from, to) {
            Some(chain) => chain.apply(&mut self.code),
            None => {
                let span = self.span;
                self.report(CompilationError::NoConversion { from, to, span });
            }
        }
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Open a call, nested inside any call already open.
    pub fn start_call(&mut self) {
        self.calls.push(CallBuilder::new());
    }

    /// Begin generating the next argument of the innermost call.
    pub fn start_arg(&mut self) {
        let Some(call) = self.calls.last_mut() else {
            self.internal("argument started outside of a call");
            return;
        };
        if call.start_arg() == ArgTarget::Deferred {
            self.open_segment();
        }
    }

    /// Record the type of the argument just generated.
    pub fn end_arg(&mut self, ty: Type) {
        let target = self.calls.last().and_then(CallBuilder::open_arg);
        let deferred = match target {
            Some(ArgTarget::Deferred) => Some(self.close_segment()),
            Some(ArgTarget::Live) => None,
            None => {
                self.internal("argument ended without being started");
                return;
            }
        };
        if let Some(call) = self.calls.last_mut() {
            call.end_arg(ty, deferred);
        }
    }

    /// Resolve the innermost call against `name` and emit it.
    ///
    /// Returns the result type, or INT when no candidate applies.
    pub fn end_call(&mut self, name: &str) -> Type {
        let Some(call) = self.calls.pop() else {
            self.internal(format!("call to '{name}' ended without being started"));
            return Type::Int;
        };
        if call.open_arg().is_some() {
            self.internal(format!("call to '{name}' ended inside an argument"));
        }
        let span = self.span;
        let result = call.finish(
            name,
            &self.builtins.overloads,
            &self.builtins.widening,
            &mut self.code,
            span,
        );
        match result {
            Ok(ty) => ty,
            Err(error) => {
                self.report(error);
                Type::Int
            }
        }
    }

    /// Number of open calls.
    pub fn call_depth(&self) -> usize {
        self.calls.len()
    }

    /// Begin a binary operator whose left operand of type `lhs` is already
    /// emitted. The right operand is generated next.
    pub fn start_op2(&mut self, lhs: Type) {
        self.start_call();
        self.start_arg();
        self.end_arg(lhs);
        self.start_arg();
    }

    /// Finish a binary operator once the right operand of type `rhs` is
    /// generated.
    pub fn end_op2(&mut self, op: &str, rhs: Type) -> Type {
        self.end_arg(rhs);
        self.end_call(op)
    }

    /// Apply a unary operator to the operand of type `ty` already emitted.
    pub fn apply_op1(&mut self, op: &str, ty: Type) -> Type {
        self.start_call();
        self.start_arg();
        self.end_arg(ty);
        self.end_call(op)
    }

    // ==========================================================================
    // Literals
    // ==========================================================================

    /// Push an integer literal.
    pub fn literal_int(&mut self, text: &str) -> Type {
        match text.parse::<i32>() {
            Ok(value) => self.code.emit_int(i64::from(value)),
            Err(_) => {
                let span = self.span;
                self.report(CompilationError::InvalidLiteral {
                    literal: text.to_string(),
                    span,
                });
                self.code.emit_int(0);
            }
        }
        Type::Int
    }

    /// Push a floating literal.
    pub fn literal_float(&mut self, text: &str) -> Type {
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => self.code.emit_f64(value),
            _ => {
                let span = self.span;
                self.report(CompilationError::InvalidLiteral {
                    literal: text.to_string(),
                    span,
                });
                self.code.emit_f64(0.0);
            }
        }
        Type::Float
    }

    /// Push a quoted character literal.
    pub fn literal_char(&mut self, raw: &str) -> Type {
        let c = literals::unescape_char(raw);
        self.code.emit_int(i64::from(u32::from(c)));
        Type::Char
    }

    /// Push a quoted string literal.
    pub fn literal_string(&mut self, raw: &str) -> Type {
        let s = literals::unescape(raw);
        self.code.emit_string(&s);
        Type::String
    }

    /// Push `TRUE` or `FALSE`.
    pub fn literal_bool(&mut self, value: bool) -> Type {
        self.code.emit_bool(value);
        Type::Bool
    }

    // ==========================================================================
    // Expressions and statements
    // ==========================================================================

    /// Negate the value of type `ty` on top of the stack.
    pub fn neg(&mut self, ty: Type) -> Type {
        match ty {
            Type::Bool | Type::Char | Type::Int => {
                self.code.emit(OpCode::NegI32);
                Type::Int
            }
            Type::Float => {
                self.code.emit(OpCode::NegF64);
                Type::Float
            }
            Type::String => {
                let span = self.span;
                self.report(CompilationError::InvalidOperation {
                    message: "cannot negate a STRING".to_string(),
                    span,
                });
                Type::Int
            }
        }
    }

    /// Print the value of type `ty` on top of the stack.
    pub fn output(&mut self, ty: Type) {
        self.convert(ty, Type::String);
        self.code.emit(OpCode::Print);
    }

    /// Read the next input value into variable `name`.
    pub fn input(&mut self, name: &str) {
        self.code.emit(OpCode::ReadValue);
        self.store_var(Type::String, name);
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Allocate a label for the current unit.
    pub fn new_label(&mut self) -> Label {
        let label = Label::new(self.next_label);
        self.next_label += 1;
        label
    }

    /// End the program and assemble it.
    ///
    /// Unbalanced segments, unfinished calls and declarations still waiting
    /// for their type are reported as internal errors. Label problems make
    /// the program unassemblable and are returned as an [`EmitError`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finish(mut self, name: &str) -> Result<CompilationResult, EmitError> {
        if !self.calls.is_empty() {
            let open = self.calls.len();
            self.internal(format!("{open} call(s) never ended"));
        }
        if !self.pending.is_empty() {
            let names: Vec<_> = self.pending.iter().map(|p| p.name.clone()).collect();
            self.internal(format!("declarations without a type: {}", names.join(", ")));
        }
        if !self.segments.is_empty() {
            self.internal(format!("{} segment(s) never closed", self.segments.len()));
            while let Some(mut parent) = self.segments.pop() {
                parent.append(std::mem::take(&mut self.code));
                self.code = parent;
            }
        }

        self.code.emit_return_void();
        let (chunk, constants) = emit::assemble(&self.code)?;

        tracing::debug!(
            name,
            slots = self.vars.slot_count(),
            errors = self.errors.len(),
            "finished compilation unit"
        );

        Ok(CompilationResult {
            program: CompiledProgram {
                name: name.to_string(),
                slot_count: self.vars.slot_count(),
                constants,
                chunk,
            },
            errors: self.errors,
        })
    }
}
