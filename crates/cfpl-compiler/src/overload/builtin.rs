//! The standard CFPL operator set.

use cfpl_core::Type;

use super::OverloadTable;
use crate::bytecode::OpCode;
use crate::emit::Action;

/// Build the operator table.
///
/// INT candidates are registered before FLOAT ones, so an expression whose
/// operands are all integral stays integral.
pub fn operators() -> OverloadTable {
    use Type::{Bool, Float, Int, String};

    let mut table = OverloadTable::new();

    table.add("&", String, &[String, String], Action::Op(OpCode::Concat));
    table.add("AND", Bool, &[Bool, Bool], Action::Op(OpCode::And));
    table.add("OR", Bool, &[Bool, Bool], Action::Op(OpCode::Or));
    table.add("NOT", Bool, &[Bool], Action::Op(OpCode::Not));

    let arithmetic = [
        ("+", OpCode::AddI32, OpCode::AddF64),
        ("-", OpCode::SubI32, OpCode::SubF64),
        ("*", OpCode::MulI32, OpCode::MulF64),
        ("/", OpCode::DivI32, OpCode::DivF64),
    ];
    for (name, int_op, float_op) in arithmetic {
        table.add(name, Int, &[Int, Int], Action::Op(int_op));
        table.add(name, Float, &[Float, Float], Action::Op(float_op));
    }
    table.add("%", Int, &[Int, Int], Action::Op(OpCode::ModI32));

    let comparisons = [
        ("==", OpCode::EqI32, OpCode::EqF64),
        ("<>", OpCode::NeI32, OpCode::NeF64),
        ("<", OpCode::LtI32, OpCode::LtF64),
        ("<=", OpCode::LeI32, OpCode::LeF64),
        (">", OpCode::GtI32, OpCode::GtF64),
        (">=", OpCode::GeI32, OpCode::GeF64),
    ];
    for (name, int_op, float_op) in comparisons {
        table.add(name, Bool, &[Int, Int], Action::Op(int_op));
        table.add(name, Bool, &[Float, Float], Action::Op(float_op));
    }

    table
}
