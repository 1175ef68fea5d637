//! Overload resolution for operators and functions.
//!
//! ## Algorithm
//!
//! 1. Look up the candidates registered under the name
//! 2. Skip candidates whose arity differs from the argument count
//! 3. Find a widening chain from every argument type to the parameter type
//! 4. The first candidate, in registration order, where every chain exists wins
//!
//! There is no ranking: a candidate needing more conversions is still picked
//! over a later exact match if it was registered first.

mod builtin;
mod call;

pub use builtin::operators;
pub use call::{ArgTarget, CallBuilder};

use cfpl_core::Type;
use rustc_hash::FxHashMap;

use crate::conversion::{Chain, ConversionGraph};
use crate::emit::Action;

/// One registered signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Operator or function name.
    pub name: String,
    /// Type of the value left on the stack.
    pub result: Type,
    /// Parameter types, in order.
    pub params: Vec<Type>,
    /// Code implementing the operation.
    pub action: Action,
}

/// Result of successful overload resolution.
#[derive(Debug, Clone)]
pub struct OverloadMatch<'a> {
    /// The selected candidate.
    pub candidate: &'a Candidate,
    /// Conversion for each argument, in order.
    pub chains: Vec<Chain>,
}

/// Name-keyed sets of overload candidates.
#[derive(Debug, Clone, Default)]
pub struct OverloadTable {
    candidates: FxHashMap<String, Vec<Candidate>>,
}

impl OverloadTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate under `name`.
    pub fn add(&mut self, name: &str, result: Type, params: &[Type], action: Action) {
        self.candidates
            .entry(name.to_string())
            .or_default()
            .push(Candidate {
                name: name.to_string(),
                result,
                params: params.to_vec(),
                action,
            });
    }

    /// Candidates registered under `name`, in registration order.
    pub fn candidates(&self, name: &str) -> &[Candidate] {
        self.candidates
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Select the first candidate applicable to `args` through `graph`.
    pub fn resolve(
        &self,
        name: &str,
        args: &[Type],
        graph: &ConversionGraph,
    ) -> Option<OverloadMatch<'_>> {
        'candidates: for candidate in self.candidates(name) {
            if candidate.params.len() != args.len() {
                continue;
            }
            let mut chains = Vec::with_capacity(args.len());
            for (&arg, &param) in args.iter().zip(&candidate.params) {
                match graph.chain(arg, param) {
                    Some(chain) => chains.push(chain),
                    None => continue 'candidates,
                }
            }
            tracing::trace!(
                name,
                args = %format_types(args),
                params = %format_types(&candidate.params),
                "overload resolved"
            );
            return Some(OverloadMatch { candidate, chains });
        }
        None
    }
}

/// Render a type list as `INT, FLOAT`.
pub fn format_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|ty| ty.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use crate::conversion::widening;

    #[test]
    fn unknown_name_has_no_candidates() {
        let table = OverloadTable::new();
        assert!(table.candidates("+").is_empty());
        assert!(table.resolve("+", &[Type::Int, Type::Int], &widening()).is_none());
    }

    #[test]
    fn arity_selects_candidate() {
        let mut table = OverloadTable::new();
        table.add("-", Type::Int, &[Type::Int], Action::Op(OpCode::NegI32));
        table.add("-", Type::Int, &[Type::Int, Type::Int], Action::Op(OpCode::SubI32));

        let graph = widening();
        let unary = table.resolve("-", &[Type::Int], &graph).unwrap();
        assert_eq!(unary.candidate.action, Action::Op(OpCode::NegI32));

        let binary = table.resolve("-", &[Type::Int, Type::Int], &graph).unwrap();
        assert_eq!(binary.candidate.action, Action::Op(OpCode::SubI32));

        assert!(table.resolve("-", &[], &graph).is_none());
    }

    #[test]
    fn first_applicable_candidate_wins() {
        // FLOAT registered first: an INT pair widens to it even though an
        // exact INT candidate exists later.
        let mut table = OverloadTable::new();
        table.add("+", Type::Float, &[Type::Float, Type::Float], Action::Op(OpCode::AddF64));
        table.add("+", Type::Int, &[Type::Int, Type::Int], Action::Op(OpCode::AddI32));

        let found = table.resolve("+", &[Type::Int, Type::Int], &widening()).unwrap();
        assert_eq!(found.candidate.result, Type::Float);
        assert_eq!(found.chains[0].len(), 1);
        assert_eq!(found.chains[1].len(), 1);
    }

    #[test]
    fn inapplicable_candidates_are_skipped() {
        let mut table = OverloadTable::new();
        table.add("+", Type::Int, &[Type::Int, Type::Int], Action::Op(OpCode::AddI32));
        table.add("+", Type::Float, &[Type::Float, Type::Float], Action::Op(OpCode::AddF64));

        let found = table.resolve("+", &[Type::Int, Type::Float], &widening()).unwrap();
        assert_eq!(found.candidate.result, Type::Float);
        assert_eq!(found.chains[0].len(), 1);
        assert!(found.chains[1].is_empty());
    }

    #[test]
    fn no_candidate_when_an_argument_cannot_widen() {
        let mut table = OverloadTable::new();
        table.add("%", Type::Int, &[Type::Int, Type::Int], Action::Op(OpCode::ModI32));
        assert!(table.resolve("%", &[Type::Float, Type::Int], &widening()).is_none());
    }

    #[test]
    fn resolution_is_deterministic() {
        let table = operators();
        let graph = widening();
        let first = table.resolve("+", &[Type::Char, Type::Float], &graph).unwrap();
        for _ in 0..10 {
            let again = table.resolve("+", &[Type::Char, Type::Float], &graph).unwrap();
            assert!(std::ptr::eq(first.candidate, again.candidate));
            assert_eq!(first.chains, again.chains);
        }
    }

    #[test]
    fn format_types_joins_keywords() {
        assert_eq!(format_types(&[Type::Int, Type::String]), "INT, STRING");
        assert_eq!(format_types(&[]), "");
    }
}
