//! The standard conversion graphs.
//!
//! - The *widening* graph only holds lossless steps. Overload resolution uses
//!   it to decide whether a candidate applies.
//! - The *permissive* graph is the widening graph plus narrowing and parsing
//!   steps. Assignment, conditions and output convert through it.

use cfpl_core::Type;

use super::ConversionGraph;
use crate::bytecode::OpCode;
use crate::emit::Action;

/// Build the widening graph.
///
/// ```text
/// BOOL -> CHAR -> INT -> FLOAT
///   \       \      \       \
///    +-------+------+-------+--> STRING
/// ```
pub fn widening() -> ConversionGraph {
    let mut graph = ConversionGraph::new();
    // BOOL, CHAR and INT share a representation.
    graph.add(Type::Bool, Type::Char, Action::None);
    graph.add(Type::Char, Type::Int, Action::None);
    graph.add(Type::Int, Type::Float, Action::Op(OpCode::I32toF64));
    graph.add(Type::Bool, Type::String, Action::Op(OpCode::BoolToString));
    graph.add(Type::Char, Type::String, Action::Op(OpCode::CharToString));
    graph.add(Type::Int, Type::String, Action::Op(OpCode::I32ToString));
    graph.add(Type::Float, Type::String, Action::Op(OpCode::F64ToString));
    graph
}

/// Build the permissive graph, a superset of [`widening`].
///
/// INT->CHAR is registered ahead of the widening edges: chains into CHAR
/// must prefer INT over BOOL, so STRING->CHAR parses a number.
pub fn permissive() -> ConversionGraph {
    let mut graph = ConversionGraph::new();
    graph.add(Type::Int, Type::Char, Action::None);
    let strict = widening();
    for ty in Type::ALL {
        for edge in strict.edges_into(ty) {
            graph.add(edge.from, edge.to, edge.action);
        }
    }
    graph.add(Type::Float, Type::Int, Action::Op(OpCode::F64toI32));
    graph.add(
        Type::Int,
        Type::Bool,
        Action::Sequence(&[OpCode::PushZero, OpCode::NeI32]),
    );
    graph.add(Type::String, Type::Bool, Action::Op(OpCode::ParseBool));
    graph.add(Type::String, Type::Int, Action::Op(OpCode::ParseI32));
    graph.add(Type::String, Type::Float, Action::Op(OpCode::ParseF64));
    graph
}
