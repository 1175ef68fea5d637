//! End-to-end tests: scripts under `test_scripts/` are compiled, serialized,
//! loaded back and run.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use cfpl::{CfplError, CompilationError, OpCode, ParseErrorKind};

fn script_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(name)
}

fn read_script(name: &str) -> String {
    let path = script_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Compile `name`, round-trip it through the binary format and run it.
fn run_script(name: &str, input: &str) -> String {
    let result = cfpl::compile(&read_script(name), name).unwrap();
    assert!(result.is_success(), "{name}: {:?}", result.errors);

    let loaded = cfpl::load(&result.program.to_bytes()).unwrap();
    assert_eq!(loaded.name, name);
    assert_eq!(loaded.chunk.code(), result.program.chunk.code());

    let output = cfpl::run(&loaded, input.as_bytes(), Vec::new()).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn hello_world() {
    assert_eq!(run_script("hello.cfpl", ""), "Hello, World!\n");
}

#[test]
fn declarations_get_defaults_and_initializers() {
    assert_eq!(
        run_script("declarations.cfpl", ""),
        "0\n5\n1.9\n0.0\nc\nfalse\nnull\n"
    );
}

#[test]
fn arithmetic_and_overloads() {
    assert_eq!(
        run_script("arithmetic.cfpl", ""),
        "3.5\nab\n3\n3\n17.5\n-6\n16\nt=7\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn mixed_addition_widens_left_operand() {
    let result = cfpl::compile("START\nOUTPUT: 1 + 2.5\nSTOP", "b").unwrap();
    result.program.chunk.assert_opcodes(&[
        OpCode::PushOne,
        OpCode::I32toF64,
        OpCode::Constant,
        OpCode::AddF64,
        OpCode::F64ToString,
        OpCode::Print,
        OpCode::ReturnVoid,
    ]);
}

#[test]
fn concatenation_inserts_no_conversions() {
    let result = cfpl::compile("START\nOUTPUT: \"a\" & \"b\"\nSTOP", "c").unwrap();
    result.program.chunk.assert_opcodes(&[
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Concat,
        OpCode::Print,
        OpCode::ReturnVoid,
    ]);
}

#[test]
fn branches_follow_int_truthiness() {
    assert_eq!(run_script("branches.cfpl", ""), "Y\nX\nno else\n");
}

#[test]
fn loops() {
    assert_eq!(run_script("loops.cfpl", ""), "total: 10\n");
}

#[test]
fn input_is_comma_separated() {
    assert_eq!(
        run_script("input.cfpl", "4, 2.5\nAda, true\n"),
        "Ada: 10.0\nok\n"
    );
}

#[test]
fn strings_into_char_parse_the_code_point() {
    let source = "VAR c, d AS CHAR\nSTART\nINPUT: c\nd = \"66\"\nOUTPUT: c & d\nSTOP";
    assert_eq!(cfpl::run_source(source, "65\n").unwrap(), "AB\n");
}

#[test]
fn assignments_convert_permissively() {
    assert_eq!(
        run_script("conversions.cfpl", ""),
        "2.75\n2\ntrue\ntrue\n"
    );
}

#[test]
fn escapes() {
    assert_eq!(
        run_script("escapes.cfpl", ""),
        "line one\nline two\n# and [ and \"\n'\n"
    );
}

#[test]
fn semantic_errors_are_all_reported() {
    let result = cfpl::compile(&read_script("semantic_errors.cfpl"), "errors").unwrap();
    assert_eq!(result.errors.len(), 3, "{:?}", result.errors);
    assert!(matches!(
        result.errors[0],
        CompilationError::VariableRedeclaration { .. }
    ));
    assert!(matches!(
        result.errors[1],
        CompilationError::UnknownVariable { .. }
    ));
    assert!(matches!(
        result.errors[2],
        CompilationError::NoMatchingOverload { .. }
    ));
}

#[test]
fn syntax_error_is_fatal() {
    match cfpl::compile(&read_script("syntax_error.cfpl"), "syntax") {
        Err(CfplError::Parse(error)) => {
            assert_eq!(error.kind, ParseErrorKind::ExpectedToken);
            assert_eq!(error.span.line, 2);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn corrupted_program_fails_to_load() {
    let result = cfpl::compile(&read_script("hello.cfpl"), "hello").unwrap();
    let bytes = result.program.to_bytes();
    let err = cfpl::load(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, CfplError::Load(_)));
}

// =========================================
// CLI
// =========================================

fn cfplc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cfplc"))
}

#[test]
fn cli_writes_program_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("hello.cfpl");
    fs::copy(script_path("hello.cfpl"), &source).unwrap();

    let status = cfplc().arg(&source).status().unwrap();
    assert!(status.success());

    let bytes = fs::read(dir.path().join("hello.cfplc")).unwrap();
    let program = cfpl::load(&bytes).unwrap();
    assert_eq!(program.name, "hello");
}

#[test]
fn cli_compiles_and_runs_with_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.cfplc");

    let mut child = cfplc()
        .arg(script_path("input.cfpl"))
        .arg("-o")
        .arg(&output)
        .arg("--run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"2, 1.5\nBo, false\n")
        .unwrap();
    let result = child.wait_with_output().unwrap();

    assert!(result.status.success());
    assert_eq!(String::from_utf8(result.stdout).unwrap(), "Bo: 3.0\n");
    assert!(output.exists());
}

#[test]
fn cli_runs_and_lists_compiled_program() {
    let dir = tempfile::tempdir().unwrap();
    let program = dir.path().join("loops.cfplc");
    let status = cfplc()
        .arg(script_path("loops.cfpl"))
        .arg("-o")
        .arg(&program)
        .status()
        .unwrap();
    assert!(status.success());

    let result = cfplc()
        .arg(&program)
        .arg("--run")
        .arg("--disassemble")
        .output()
        .unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.starts_with("== loops =="), "{stdout}");
    assert!(stdout.contains("JUMP_IF_FALSE"));
    assert!(stdout.ends_with("total: 10\n"));
}

#[test]
fn cli_reports_errors_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("bad.cfpl");
    fs::copy(script_path("semantic_errors.cfpl"), &source).unwrap();

    let result = cfplc().arg(&source).output().unwrap();
    assert!(!result.status.success());
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.contains("3 error(s)"), "{stderr}");
    assert!(!dir.path().join("bad.cfplc").exists());
}
