//! lox-drv - The `lox` command line driver.
//!
//! The driver owns everything outside the compile-and-run core: argument
//! handling, the REPL line loop, file loading, diagnostic printing, exit
//! codes, and logging.
//!
//! # Usage
//!
//! Run a script:
//!   lox program.lox
//!
//! Start the REPL:
//!   lox
//!
//! # Exit codes
//!
//! - 0: success
//! - 64: usage error (more than one argument)
//! - 65: compile error in the script
//! - 70: runtime error in the script
//! - 74: the script file could not be read
//!
//! # Environment
//!
//! The argv contract is fixed, so debugging switches are environment
//! variables rather than flags:
//!
//! - `LOX_DUMP=1` disassembles each compiled chunk to stderr before it
//!   runs.
//! - `LOX_TRACE=1` prints the value stack and the current instruction to
//!   stderr before every dispatch step.
//! - `RUST_LOG` controls `tracing` output (e.g. `RUST_LOG=lox_drv=debug`).
//!
//! Program output goes to stdout; every diagnostic goes to stderr.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use lox_vm::{InterpretError, Vm};

/// Exit code for command line usage errors.
const EX_USAGE: u8 = 64;
/// Exit code for compile errors.
const EX_DATAERR: u8 = 65;
/// Exit code for runtime errors.
const EX_SOFTWARE: u8 = 70;
/// Exit code for unreadable input files.
const EX_IOERR: u8 = 74;

/// Driver entry point: dispatches on the argument count.
pub fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    match args.len() {
        1 => repl(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: lox [path]");
            ExitCode::from(EX_USAGE)
        },
    }
}

/// Builds the session VM, applying the environment switches.
fn new_vm() -> Vm {
    let mut vm = Vm::new();
    vm.set_trace(env_flag("LOX_TRACE"));
    vm.set_dump(env_flag("LOX_DUMP"));
    vm
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|value| !value.is_empty() && value != "0")
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads and interprets a script file.
fn run_file(path: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(EX_IOERR);
        },
    };

    tracing::debug!(path, bytes = source.len(), "running script");

    let mut vm = new_vm();
    match vm.interpret(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn read_source(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("could not read \"{path}\""))
}

/// The read-eval-print loop. One VM lives for the whole session, so
/// globals and interned strings accumulate across lines; errors are
/// reported and the loop continues.
fn repl() -> ExitCode {
    tracing::debug!("starting repl");

    let mut vm = new_vm();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::from(EX_IOERR);
        }

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return ExitCode::SUCCESS;
            },
            Ok(_) => {},
            Err(err) => {
                eprintln!("error: could not read stdin: {err}");
                return ExitCode::from(EX_IOERR);
            },
        }

        if let Err(err) = vm.interpret(&line) {
            report(&err);
        }
    }
}

/// Prints an interpreter failure to stderr and picks its exit code.
fn report(err: &InterpretError) -> ExitCode {
    match err {
        InterpretError::Compile(err) => {
            for diagnostic in &err.diagnostics {
                eprintln!("{diagnostic}");
            }
            ExitCode::from(EX_DATAERR)
        },
        InterpretError::Runtime(err) => {
            eprintln!("{err}");
            ExitCode::from(EX_SOFTWARE)
        },
    }
}
