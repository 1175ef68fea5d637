//! Decoding of quoted CFPL literals.
//!
//! Escapes:
//! - `#` is a newline
//! - `[x]` is the literal character `x`, for characters that would otherwise
//!   be special (`[#]`, `[[]`, `["]`, `[']`)
//!
//! The raw literal still carries its enclosing quote marks; they are removed
//! after decoding.

/// Decoder state.
#[derive(Clone, Copy)]
enum State {
    Plain,
    Escaped,
    Closing,
}

/// Decode a quoted string literal.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut state = State::Plain;

    for c in raw.chars() {
        state = match (state, c) {
            (State::Plain, '#') => {
                out.push('\n');
                State::Plain
            }
            (State::Plain, '[') => State::Escaped,
            (State::Plain, c) => {
                out.push(c);
                State::Plain
            }
            (State::Escaped, c) => {
                out.push(c);
                State::Closing
            }
            (State::Closing, ']') => State::Plain,
            // Malformed escape: keep the character.
            (State::Closing, c) => {
                out.push(c);
                State::Plain
            }
        };
    }

    let mut chars = out.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

/// Decode a quoted character literal.
///
/// An empty literal decodes to NUL.
pub fn unescape_char(raw: &str) -> char {
    unescape(raw).chars().next().unwrap_or('\0')
}
