//! Shared helpers for the integration test binaries.

use mlang::value::Value;

/// Parses and evaluates `source` against a fresh root environment, panicking on any
/// parse error so a broken fixture fails loudly instead of silently returning `Null`.
pub fn run(source: &str) -> Value {
    let (statements, errors) = mlang::parser::parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    let env = mlang::builtins::new_global_env();
    mlang::evaluator::eval_program(&statements, &env)
}
