//! The interactive read-eval-print loop: a line-at-a-time loop over a generic
//! `Read`/`Write` pair rather than committing to stdin/stdout directly, so it stays
//! unit-testable against an in-memory buffer.

use crate::builtins;
use crate::evaluator;
use crate::parser;
use crate::value::Value;
use std::io::{self, BufRead, Write};

const PROMPT: &str = ">>> ";

/// Runs the REPL against `input`/`output` until EOF or a program-level `exit(code)`.
/// Parse errors are printed and the loop continues; they never terminate the session.
pub fn run<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<i32> {
    let env = builtins::new_global_env();

    let mut line = String::new();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        let bytes_read = input.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(0);
        }

        let (statements, errors) = parser::parse(&line);
        if !errors.is_empty() {
            for e in &errors {
                writeln!(output, "parse error: {}", e)?;
            }
            continue;
        }

        let result = evaluator::eval_program(&statements, &env);
        match result {
            Value::Exit(code) => return Ok(code as i32),
            Value::Null => {}
            other => writeln!(output, "{}", other.inspect())?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prints_results_of_expression_statements() {
        let input = Cursor::new(b"1 + 1;\n".to_vec());
        let mut output = Vec::new();
        let code = run(input, &mut output).unwrap();
        assert_eq!(code, 0);
        assert!(String::from_utf8(output).unwrap().contains("2"));
    }

    #[test]
    fn exit_call_stops_the_loop_with_its_code() {
        let input = Cursor::new(b"exit(7);\nthis_line_never_runs();\n".to_vec());
        let mut output = Vec::new();
        let code = run(input, &mut output).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn parse_errors_are_reported_without_terminating_the_session() {
        let input = Cursor::new(b"let = ;\n1;\n".to_vec());
        let mut output = Vec::new();
        let code = run(input, &mut output).unwrap();
        assert_eq!(code, 0);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("parse error"));
        assert!(text.contains("1"));
    }

    #[test]
    fn eof_ends_session_with_code_zero() {
        let input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let code = run(input, &mut output).unwrap();
        assert_eq!(code, 0);
    }
}
