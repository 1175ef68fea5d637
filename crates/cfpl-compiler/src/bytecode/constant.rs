//! Constant pool for compiled programs.
//!
//! The constant pool stores values that are referenced by bytecode
//! instructions: integer and floating literals and string data.

use rustc_hash::FxHashMap;

/// Values stored in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Signed integer literal.
    Int(i64),
    /// Double-width floating literal.
    Float64(f64),
    /// String literal, already unescaped.
    StringData(String),
}

impl Constant {
    /// Tag byte used by the binary program format.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Constant::Int(_) => 0,
            Constant::Float64(_) => 1,
            Constant::StringData(_) => 2,
        }
    }
}

/// Program-level constant pool with deduplication.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// The actual constants.
    constants: Vec<Constant>,
    /// Deduplication index: maps constant to its index.
    index: FxHashMap<ConstantKey, u32>,
}

/// Key for constant deduplication (hashable version of Constant).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int(i64),
    Float64(u64), // Bit pattern for hashing
    StringData(String),
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns index.
    ///
    /// Deduplicates identical constants.
    pub fn add(&mut self, constant: Constant) -> u32 {
        let key = Self::to_key(&constant);

        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }

        let idx = self.constants.len() as u32;
        self.constants.push(constant);
        self.index.insert(key, idx);
        idx
    }

    /// Add an integer constant.
    pub fn add_int(&mut self, value: i64) -> u32 {
        self.add(Constant::Int(value))
    }

    /// Add a double constant.
    pub fn add_f64(&mut self, value: f64) -> u32 {
        self.add(Constant::Float64(value))
    }

    /// Add string data.
    pub fn add_string(&mut self, data: impl Into<String>) -> u32 {
        self.add(Constant::StringData(data.into()))
    }

    /// Get constant by index.
    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Get all constants (for serialization).
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Number of constants.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Convert a Constant to its hashable key representation.
    fn to_key(constant: &Constant) -> ConstantKey {
        match constant {
            Constant::Int(v) => ConstantKey::Int(*v),
            Constant::Float64(v) => ConstantKey::Float64(v.to_bits()),
            Constant::StringData(s) => ConstantKey::StringData(s.clone()),
        }
    }
}

impl FromIterator<Constant> for ConstantPool {
    fn from_iter<I: IntoIterator<Item = Constant>>(iter: I) -> Self {
        let mut pool = ConstantPool::new();
        for constant in iter {
            pool.add(constant);
        }
        pool
    }
}
