use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use rill::error::report_error;
use rill::interp::{Environment, Interpreter, Value};

/// Rill - a small dynamically-typed scripting language
#[derive(Parser)]
#[command(name = "rill", version, about)]
struct Cli {
    /// Script to run; omit to start the REPL
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.file {
        Some(file) => run_file(&file),
        None => run_repl(),
    }
}

fn run_file(path: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let filename = path.display().to_string();
    let program = match rill::parser::parse(&source) {
        Ok(program) => program,
        Err(errors) => {
            for error in &errors {
                report_error(&filename, &source, error);
            }
            return ExitCode::FAILURE;
        }
    };
    let mut interpreter = Interpreter::new();
    let env = Environment::new().into_ref();
    match interpreter.eval_program(&program, &env) {
        Value::Error { message } => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    }
}

fn run_repl() -> ExitCode {
    let mut repl = match rill::repl::Repl::new() {
        Ok(repl) => repl,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    match repl.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
