//! Scalar types of the CFPL language.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A CFPL scalar type.
///
/// The discriminants are dense so a `Type` can index fixed-size tables
/// (see [`Type::index`] and [`Type::COUNT`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Type {
    Bool = 0,
    Char,
    Int,
    Float,
    String,
}

impl Type {
    /// Number of scalar types.
    pub const COUNT: usize = 5;

    /// Every type, in discriminant order.
    pub const ALL: [Type; Type::COUNT] =
        [Type::Bool, Type::Char, Type::Int, Type::Float, Type::String];

    /// Dense table index of this type.
    #[inline]
    pub fn index(self) -> usize {
        u8::from(self) as usize
    }

    /// Number of local slots a variable of this type occupies.
    ///
    /// FLOAT is stored double-width, everything else takes one slot.
    #[inline]
    pub fn slot_width(self) -> u16 {
        match self {
            Type::Float => 2,
            _ => 1,
        }
    }

    /// Whether values of this type live on the integer side of the machine
    /// (BOOL and CHAR share INT's representation).
    #[inline]
    pub fn is_integral(self) -> bool {
        matches!(self, Type::Bool | Type::Char | Type::Int)
    }

    /// The source keyword naming this type.
    pub fn keyword(self) -> &'static str {
        match self {
            Type::Bool => "BOOL",
            Type::Char => "CHAR",
            Type::Int => "INT",
            Type::Float => "FLOAT",
            Type::String => "STRING",
        }
    }

    /// Look a type up by its source keyword.
    pub fn from_keyword(keyword: &str) -> Option<Type> {
        Type::ALL.into_iter().find(|ty| ty.keyword() == keyword)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
