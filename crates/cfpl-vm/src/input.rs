//! Comma-separated program input.

use std::collections::VecDeque;
use std::io::BufRead;

use cfpl_core::RuntimeError;

/// Hands out input values one at a time.
///
/// A line such as `4, 2.5,abc` yields `4`, `2.5` and `abc`. A new line is
/// only read once every value of the previous one has been consumed.
pub struct InputReader<R> {
    source: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> InputReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            pending: VecDeque::new(),
        }
    }

    /// Next value, trimmed of surrounding whitespace.
    pub fn next_value(&mut self) -> Result<String, RuntimeError> {
        if self.pending.is_empty() {
            let mut line = String::new();
            if self.source.read_line(&mut line)? == 0 {
                return Err(RuntimeError::EndOfInput);
            }
            self.pending
                .extend(line.split(',').map(|part| part.trim().to_string()));
        }
        self.pending.pop_front().ok_or(RuntimeError::EndOfInput)
    }
}
