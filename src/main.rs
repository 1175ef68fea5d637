//! cfplc - CFPL compiler CLI
//!
//! Compiles a `.cfpl` source file to a `.cfplc` program, optionally listing
//! and running it. A `.cfplc` file given as the source is loaded instead of
//! compiled.
//!
//! Usage:
//!   cfplc hello.cfpl                  # writes hello.cfplc
//!   cfplc hello.cfpl -o out.cfplc     # explicit output path
//!   cfplc hello.cfpl --run            # compile, then run
//!   cfplc hello.cfplc --disassemble   # list a compiled program

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cfpl::{CfplError, CompiledProgram, PROGRAM_EXTENSION};
use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "cfplc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CFPL compiler - compile .cfpl programs to bytecode", long_about = None)]
struct Cli {
    /// Source file (.cfpl), or a compiled program (.cfplc)
    source: PathBuf,

    /// Output path (defaults to the source path with a .cfplc extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the program after compiling
    #[arg(long)]
    run: bool,

    /// Print the bytecode listing
    #[arg(long)]
    disassemble: bool,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: &Cli) -> Result<ExitCode, CfplError> {
    let program = if cli.source.extension().is_some_and(|ext| ext == PROGRAM_EXTENSION) {
        cfpl::load(&fs::read(&cli.source)?)?
    } else {
        match compile_file(&cli.source, cli.output.as_deref())? {
            Some(program) => program,
            None => return Ok(ExitCode::FAILURE),
        }
    };

    if cli.disassemble {
        println!("== {} ==", program.name);
        print!("{}", program.chunk.disassemble(&program.constants));
    }

    if cli.run {
        cfpl::run(&program, io::stdin().lock(), io::stdout().lock())?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Compile `source` and write the program. Returns `None` after reporting
/// errors in the source.
fn compile_file(source: &Path, output: Option<&Path>) -> Result<Option<CompiledProgram>, CfplError> {
    let text = fs::read_to_string(source)?;
    let result = match cfpl::compile(&text, &cfpl::program_name(source)) {
        Ok(result) => result,
        Err(CfplError::Parse(error)) => {
            eprintln!("{}: {error}", source.display());
            return Ok(None);
        }
        Err(error) => return Err(error),
    };

    if !result.is_success() {
        for error in &result.errors {
            eprintln!("{}: {error}", source.display());
        }
        eprintln!("{} error(s), no output written", result.errors.len());
        return Ok(None);
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cfpl::output_path(source));
    fs::write(&output, result.program.to_bytes())?;
    tracing::info!(output = %output.display(), "wrote program");

    Ok(Some(result.program))
}
