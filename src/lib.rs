//! CFPL: a small teaching language compiled in a single pass to a compact
//! stack bytecode.
//!
//! The pipeline:
//!
//! ```text
//! source ──cfpl-parser──▶ CodeSession ──assemble──▶ CompiledProgram ──cfpl-vm──▶ output
//! ```
//!
//! # Example
//!
//! ```
//! let result = cfpl::compile("VAR n = 6 AS INT\nSTART\nOUTPUT: n * 7\nSTOP", "answer").unwrap();
//! assert!(result.is_success());
//!
//! let output = cfpl::run(&result.program, "".as_bytes(), Vec::new()).unwrap();
//! assert_eq!(output, b"42\n");
//! ```

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub use cfpl_compiler::{
    Builtins, BytecodeChunk, CodeSession, CompilationResult, CompiledProgram, ConversionGraph,
    OpCode, OverloadTable,
};
pub use cfpl_core::{
    CfplError, CompilationError, EmitError, LexError, LoadError, ParseError, ParseErrorKind,
    RuntimeError, Span, Type,
};
pub use cfpl_parser::parse_into;
pub use cfpl_vm::Vm;

/// Extension of CFPL source files.
pub const SOURCE_EXTENSION: &str = "cfpl";
/// Extension of compiled programs.
pub const PROGRAM_EXTENSION: &str = "cfplc";

/// Compile `source` into a program called `name`.
///
/// Syntax errors fail immediately. Semantic errors are collected in
/// [`CompilationResult::errors`]; the program is still assembled so it can
/// be inspected.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile(source: &str, name: &str) -> Result<CompilationResult, CfplError> {
    let mut session = CodeSession::new();
    parse_into(source, &mut session)?;
    let result = session.finish(name)?;
    if result.is_success() {
        tracing::info!(name, bytes = result.program.chunk.len(), "compiled");
    } else {
        tracing::warn!(name, errors = result.errors.len(), "compiled with errors");
    }
    Ok(result)
}

/// Execute `program`, reading `INPUT` from `input` and returning the sink
/// `OUTPUT` was written to.
pub fn run<R: BufRead, W: Write>(
    program: &CompiledProgram,
    input: R,
    output: W,
) -> Result<W, CfplError> {
    let mut vm = Vm::new(input, output);
    vm.run(program)?;
    Ok(vm.into_output())
}

/// Compile and run `source` in one go, returning everything it printed.
///
/// The first semantic error, if any, is returned instead of running.
pub fn run_source(source: &str, input: &str) -> Result<String, CfplError> {
    let result = compile(source, "main")?;
    if let Some(error) = result.errors.into_iter().next() {
        return Err(error.into());
    }
    let output = run(&result.program, input.as_bytes(), Vec::new())?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Load a program previously written with [`CompiledProgram::to_bytes`].
pub fn load(bytes: &[u8]) -> Result<CompiledProgram, CfplError> {
    Ok(CompiledProgram::from_bytes(bytes)?)
}

/// The default output path for a source file: `.cfpl` becomes `.cfplc`,
/// any other name gets `.cfplc` appended.
pub fn output_path(source: &Path) -> PathBuf {
    if source.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
        source.with_extension(PROGRAM_EXTENSION)
    } else {
        let mut name = source.as_os_str().to_owned();
        name.push(".");
        name.push(PROGRAM_EXTENSION);
        PathBuf::from(name)
    }
}

/// The name embedded in a compiled program: the source file stem.
pub fn program_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_source_extension() {
        assert_eq!(output_path(Path::new("dir/hello.cfpl")), PathBuf::from("dir/hello.cfplc"));
    }

    #[test]
    fn output_path_appends_otherwise() {
        assert_eq!(output_path(Path::new("hello.txt")), PathBuf::from("hello.txt.cfplc"));
        assert_eq!(output_path(Path::new("hello")), PathBuf::from("hello.cfplc"));
    }

    #[test]
    fn program_name_is_stem() {
        assert_eq!(program_name(Path::new("a/b/loop.cfpl")), "loop");
        assert_eq!(program_name(Path::new("")), "main");
    }

    #[test]
    fn compile_reports_syntax_errors() {
        let err = compile("START", "x").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn run_source_stops_on_semantic_errors() {
        let err = run_source("START\nOUTPUT: ghost\nSTOP", "").unwrap_err();
        assert!(matches!(
            err,
            CfplError::Compilation(CompilationError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn runtime_errors_are_wrapped() {
        let err = run_source("VAR n AS INT\nSTART\nINPUT: n\nSTOP", "").unwrap_err();
        assert!(err.is_runtime());
    }
}
