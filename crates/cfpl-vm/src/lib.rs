//! Stack machine executing compiled CFPL programs.
//!
//! ```
//! use cfpl_compiler::CodeSession;
//! use cfpl_vm::Vm;
//!
//! let mut session = CodeSession::new();
//! let ty = session.literal_string("\"hello\"");
//! session.output(ty);
//! let program = session.finish("hello").unwrap().program;
//!
//! let mut vm = Vm::new(std::io::empty(), Vec::new());
//! vm.run(&program).unwrap();
//! assert_eq!(vm.into_output(), b"hello\n");
//! ```

mod input;
mod value;
mod vm;

pub use input::InputReader;
pub use value::Value;
pub use vm::Vm;
