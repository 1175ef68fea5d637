//! Variable declarations and access.
//!
//! CFPL lists names before their type (`VAR a, b = 2 AS INT`), so declared
//! names wait in a pending list until [`CodeSession::declare_all_vars`] sees
//! the type. Only then are slots allocated and initializers converted.
//!
//! ## Bytecode Layout
//!
//! ```text
//!   VAR a, b = 1.9 AS INT
//!
//!   PUSH_ZERO                  ; default for a
//!   STORE_INT  slot 0
//!   CONSTANT   #0 (1.9)        ; initializer segment, spliced
//!   F64_TO_I32                 ; FLOAT -> INT
//!   STORE_INT  slot 1
//! ```

use cfpl_core::{CompilationError, Span, Type};
use rustc_hash::FxHashMap;

use super::CodeSession;
use crate::emit::CodeBuffer;

/// A declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    /// Declared type.
    pub ty: Type,
    /// First slot; FLOAT variables also own the next one.
    pub slot: u16,
    /// Where the variable was declared.
    pub span: Span,
}

/// A name waiting for its type.
#[derive(Debug)]
pub(super) struct PendingDeclaration {
    pub(super) name: String,
    pub(super) span: Span,
    pub(super) init: Option<(CodeBuffer, Type)>,
}

/// Declared variables and slot allocation.
#[derive(Debug, Default)]
pub(super) struct VariableTable {
    vars: FxHashMap<String, Variable>,
    next_slot: u32,
}

impl VariableTable {
    pub(super) fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Reserve slots for a value of type `ty`.
    fn allocate(&mut self, ty: Type) -> Option<u16> {
        let slot = u16::try_from(self.next_slot).ok()?;
        let end = self.next_slot + u32::from(ty.slot_width());
        if end > u32::from(u16::MAX) {
            return None;
        }
        self.next_slot = end;
        Some(slot)
    }

    fn insert(&mut self, name: String, var: Variable) {
        self.vars.insert(name, var);
    }

    pub(super) fn slot_count(&self) -> u16 {
        self.next_slot as u16
    }

    pub(super) fn len(&self) -> usize {
        self.vars.len()
    }
}

impl CodeSession {
    /// Queue a declaration without initializer.
    pub fn add_var(&mut self, name: &str, span: Span) {
        self.pending.push(PendingDeclaration {
            name: name.to_string(),
            span,
            init: None,
        });
    }

    /// Queue a declaration whose initializer was generated into `init`
    /// (a closed segment) with type `init_ty`.
    pub fn add_var_with_init(&mut self, name: &str, span: Span, init: CodeBuffer, init_ty: Type) {
        self.pending.push(PendingDeclaration {
            name: name.to_string(),
            span,
            init: Some((init, init_ty)),
        });
    }

    /// Number of declarations waiting for a type.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Declare every pending name with type `ty`.
    ///
    /// Each variable gets fresh slots and is stored either its converted
    /// initializer or the default for `ty`. A name that is already declared
    /// is diagnosed and skipped along with its initializer.
    pub fn declare_all_vars(&mut self, ty: Type) {
        for decl in std::mem::take(&mut self.pending) {
            if let Some(original) = self.vars.get(&decl.name) {
                let original_span = original.span;
                self.report(CompilationError::VariableRedeclaration {
                    name: decl.name,
                    original_span,
                    new_span: decl.span,
                });
                continue;
            }

            let Some(slot) = self.vars.allocate(ty) else {
                self.report(CompilationError::TooManyLocals { span: decl.span });
                continue;
            };

            match decl.init {
                Some((init, init_ty)) => {
                    self.code.append(init);
                    self.convert(init_ty, ty);
                }
                None => self.default_value(ty),
            }
            self.code.emit_store(ty, slot);

            tracing::trace!(name = %decl.name, %ty, slot, "declared variable");
            self.vars.insert(
                decl.name,
                Variable {
                    ty,
                    slot,
                    span: decl.span,
                },
            );
        }
    }

    fn default_value(&mut self, ty: Type) {
        match ty {
            Type::Bool | Type::Char | Type::Int => self.code.emit_int(0),
            Type::Float => self.code.emit_f64(0.0),
            Type::String => self.code.emit_null(),
        }
    }

    /// Look up a declared variable.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Number of declared variables.
    pub fn variable_count(&self) -> usize {
        self.vars.len()
    }

    /// Push the value of `name` and return its type.
    ///
    /// An unknown name is diagnosed and treated as INT.
    pub fn load_var(&mut self, name: &str) -> Type {
        match self.vars.get(name).copied() {
            Some(var) => {
                self.code.emit_load(var.ty, var.slot);
                var.ty
            }
            None => {
                self.unknown_variable(name);
                Type::Int
            }
        }
    }

    /// Store the value of type `ty` on top of the stack into `name`.
    pub fn store_var(&mut self, ty: Type, name: &str) {
        match self.vars.get(name).copied() {
            Some(var) => {
                self.convert(ty, var.ty);
                self.code.emit_store(var.ty, var.slot);
            }
            None => self.unknown_variable(name),
        }
    }

    fn unknown_variable(&mut self, name: &str) {
        let span = self.span;
        self.report(CompilationError::UnknownVariable {
            name: name.to_string(),
            span,
        });
    }
}
