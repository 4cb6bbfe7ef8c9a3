//! Argument parsing and dispatch, structured the way `clap`-derive CLIs are
//! laid out elsewhere in this code base's ecosystem.

use crate::builtins;
use crate::error::LibResult;
use crate::evaluator;
use crate::parser;
use clap::Parser;
use log::debug;
use snafu::ResultExt;
use std::io;

/// File I/O failures exit with this sentinel code rather than `1`, which is reserved
/// for parse errors.
pub const FILE_ERROR_EXIT_CODE: i32 = 144;

#[derive(Parser, Debug)]
#[command(name = "mlang", about = "A small dynamically-typed scripting language with a MIDI composition API.", version)]
pub struct Cli {
    /// Script file to execute. Omit to see usage, or combine with --repl/--benchmark.
    pub file: Option<String>,

    /// Start an interactive read-eval-print loop.
    #[arg(long)]
    pub repl: bool,

    /// Run the internal micro-benchmark and print timing.
    #[arg(long)]
    pub benchmark: bool,
}

/// Runs the CLI to completion and returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    if cli.benchmark {
        let elapsed = crate::benchmark::run();
        println!("fib(28): {:?}", elapsed);
        return 0;
    }

    if cli.repl {
        let stdin = io::stdin();
        let stdout = io::stdout();
        return match crate::repl::run(stdin.lock(), stdout.lock()) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("repl I/O error: {}", e);
                FILE_ERROR_EXIT_CODE
            }
        };
    }

    match &cli.file {
        Some(path) => match run_file(path) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}", e);
                FILE_ERROR_EXIT_CODE
            }
        },
        None => {
            print_usage();
            0
        }
    }
}

fn print_usage() {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    let _ = cmd.print_help();
    println!();
}

fn run_file(path: &str) -> LibResult<i32> {
    debug!("reading script file {}", path);
    let source = std::fs::read_to_string(path).context(io_err!(path.to_string()))?;

    let (statements, errors) = parser::parse(&source);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("parse error: {}", e);
        }
        return Ok(1);
    }

    let env = builtins::new_global_env();
    let result = evaluator::eval_program(&statements, &env);
    Ok(match result {
        crate::value::Value::Exit(code) => code as i32,
        crate::value::Value::Error(msg) => {
            eprintln!("ERROR: {}", msg);
            1
        }
        _ => 0,
    })
}
