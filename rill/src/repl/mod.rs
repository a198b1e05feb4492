//! Interactive REPL built on rustyline.

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::interp::{Environment, EnvRef, Interpreter, Value};
use crate::parser::parse;

const PROMPT: &str = ">> ";
const HISTORY_FILE: &str = ".rill_history";

pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    env: EnvRef,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new() -> rustyline::Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|home| home.join(HISTORY_FILE));
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }
        Ok(Self {
            editor,
            interpreter: Interpreter::new(),
            env: Environment::new().into_ref(),
            history_path,
        })
    }

    pub fn run(&mut self) -> rustyline::Result<()> {
        println!("Rill v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.");
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);
                    match line {
                        ":quit" | ":q" => break,
                        ":help" | ":h" => print_help(),
                        ":clear" => {
                            self.env = Environment::new().into_ref();
                            println!("Environment cleared.");
                        }
                        _ => self.eval_line(line),
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }
        if let Some(path) = &self.history_path {
            let _ = self.editor.save_history(path);
        }
        Ok(())
    }

    fn eval_line(&mut self, line: &str) {
        let program = match parse(line) {
            Ok(program) => program,
            Err(errors) => {
                for error in errors {
                    eprintln!("{error}");
                }
                return;
            }
        };
        match self.interpreter.eval_program(&program, &self.env) {
            Value::Null => {}
            Value::Error { message } => eprintln!("{message}"),
            value => println!("{value}"),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help, :h   show this help");
    println!("  :quit, :q   exit the REPL");
    println!("  :clear      reset the environment");
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
