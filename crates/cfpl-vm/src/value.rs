//! Runtime values.

use std::fmt;

/// A value on the operand stack or in a local slot.
///
/// BOOL, CHAR and INT all live in [`Value::Int`]; the compiler's no-op
/// conversions between them rely on that.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A BOOL, CHAR or INT.
    Int(i32),
    /// A FLOAT.
    Double(f64),
    /// A non-null STRING.
    Str(String),
    /// The null string reference.
    Null,
}

impl Value {
    /// Name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Null => "null",
        }
    }

    /// Wrap a boolean in the integer representation.
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        Value::Int(i32::from(b))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Double(v) => f.write_str(&format_double(*v)),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
        }
    }
}

/// Render a double so that integral values keep a fractional part
/// (`3.0`, not `3`).
pub(crate) fn format_double(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}

/// Render a CHAR code point, substituting U+FFFD for invalid ones.
pub(crate) fn format_char(code: i32) -> String {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_keep_a_fraction() {
        assert_eq!(format_double(3.0), "3.0");
        assert_eq!(format_double(-0.5), "-0.5");
        assert_eq!(format_double(1e20), "100000000000000000000.0");
        assert_eq!(format_double(f64::INFINITY), "inf");
    }

    #[test]
    fn chars_render_from_code_points() {
        assert_eq!(format_char(65), "A");
        assert_eq!(format_char(10), "\n");
        assert_eq!(format_char(-1), "\u{FFFD}");
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Double(2.0).to_string(), "2.0");
        assert_eq!(Value::Str("x".into()).to_string(), "x");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from_bool(true), Value::Int(1));
        assert_eq!(Value::default().kind(), "int");
    }
}
