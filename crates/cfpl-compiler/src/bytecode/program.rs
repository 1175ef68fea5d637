//! Serialized program units.
//!
//! A [`CompiledProgram`] is what the compiler hands to the outside world:
//! the assembled bytecode, its constant pool and the number of local slots.
//!
//! ## Binary format
//!
//! All integers are big-endian.
//!
//! ```text
//! magic      "CFPL"
//! version    u16
//! name       u16 length + UTF-8 bytes
//! slots      u16
//! constants  u32 count, then per entry a tag byte:
//!              0 = int     (i64)
//!              1 = double  (f64 bits)
//!              2 = string  (u32 length + UTF-8 bytes)
//! code       u32 length + bytes
//! ```

use cfpl_core::LoadError;

use super::{BytecodeChunk, Constant, ConstantPool};

const MAGIC: &[u8; 4] = b"CFPL";
const VERSION: u16 = 1;

/// A complete, runnable program unit.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    /// Program name (the source file stem).
    pub name: String,
    /// Number of local slots the program needs.
    pub slot_count: u16,
    /// Constant pool referenced by the code.
    pub constants: ConstantPool,
    /// Assembled bytecode.
    pub chunk: BytecodeChunk,
}

impl CompiledProgram {
    /// Encode the program in the binary format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.name.len() + self.chunk.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());

        let name = truncate_utf8(&self.name, u16::MAX as usize);
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());

        out.extend_from_slice(&self.slot_count.to_be_bytes());

        let constants = self.constants.constants();
        out.extend_from_slice(&(constants.len() as u32).to_be_bytes());
        for constant in constants {
            out.push(constant.tag());
            match constant {
                Constant::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
                Constant::Float64(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
                Constant::StringData(s) => {
                    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                    out.extend_from_slice(s.as_bytes());
                }
            }
        }

        out.extend_from_slice(&(self.chunk.len() as u32).to_be_bytes());
        out.extend_from_slice(self.chunk.code());
        out
    }

    /// Decode a program from the binary format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut reader = Reader { bytes, offset: 0 };

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(LoadError::BadMagic);
        }
        let version = reader.u16()?;
        if version != VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }

        let name_len = reader.u16()? as usize;
        let name = reader.string(name_len)?;
        let slot_count = reader.u16()?;

        let count = reader.u32()? as usize;
        let mut constants = ConstantPool::new();
        for _ in 0..count {
            let constant = match reader.u8()? {
                0 => Constant::Int(i64::from_be_bytes(reader.array()?)),
                1 => Constant::Float64(f64::from_bits(u64::from_be_bytes(reader.array()?))),
                2 => {
                    let len = reader.u32()? as usize;
                    Constant::StringData(reader.string(len)?)
                }
                tag => return Err(LoadError::UnknownConstantTag(tag)),
            };
            constants.add(constant);
        }

        let code_len = reader.u32()? as usize;
        let code = reader.take(code_len)?.to_vec();

        Ok(Self {
            name,
            slot_count,
            constants,
            chunk: BytecodeChunk::from_code(code),
        })
    }
}

fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Cursor over the serialized bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let end = self.offset.checked_add(len).filter(|&end| end <= self.bytes.len());
        let Some(end) = end else {
            return Err(LoadError::Truncated {
                offset: self.offset,
                expected: len,
            });
        };
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], LoadError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, LoadError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, LoadError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, LoadError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn string(&mut self, len: usize) -> Result<String, LoadError> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| LoadError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;

    fn sample() -> CompiledProgram {
        let mut constants = ConstantPool::new();
        constants.add_int(42);
        constants.add_f64(2.5);
        constants.add_string("héllo");

        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(2, 1);
        chunk.write_op(OpCode::Print, 1);
        chunk.write_op(OpCode::ReturnVoid, 1);

        CompiledProgram {
            name: "sample".to_string(),
            slot_count: 3,
            constants,
            chunk,
        }
    }

    #[test]
    fn encoded_program_loads_back() {
        let program = sample();
        let loaded = CompiledProgram::from_bytes(&program.to_bytes()).unwrap();

        assert_eq!(loaded.name, "sample");
        assert_eq!(loaded.slot_count, 3);
        assert_eq!(loaded.constants.constants(), program.constants.constants());
        assert_eq!(loaded.chunk.code(), program.chunk.code());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert_eq!(CompiledProgram::from_bytes(&bytes).unwrap_err(), LoadError::BadMagic);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = sample().to_bytes();
        bytes[5] = 9;
        assert_eq!(
            CompiledProgram::from_bytes(&bytes).unwrap_err(),
            LoadError::UnsupportedVersion(9)
        );
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = sample().to_bytes();
        let err = CompiledProgram::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, LoadError::Truncated { expected: 4, .. }));
    }
}
