//! Parser round-trip and error-surfacing properties, exercised through
//! the public `mlang::parser::parse` entry point rather than the parser's own
//! `#[cfg(test)]` module (which covers its internals directly).

fn render(source: &str) -> String {
    let (stmts, errors) = mlang::parser::parse(source);
    assert!(errors.is_empty(), "unexpected parse errors for {:?}: {:?}", source, errors);
    stmts
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// For every parseable program, re-parsing `to_string(parse(P))` yields an AST whose
/// rendering is a fixed point (the parser round-trip property).
fn assert_round_trips(source: &str) {
    let once = render(source);
    let twice = render(&once);
    assert_eq!(once, twice, "round-trip was not a fixed point for {:?}", source);
}

#[test]
fn arithmetic_precedence_round_trips() {
    assert_round_trips("1 + 2 * 3 - 4 / 2;");
}

#[test]
fn comparisons_and_equality_round_trip() {
    assert_round_trips("a < b == c != d;");
}

#[test]
fn array_and_hash_literals_round_trip() {
    assert_round_trips(r#"let a = [1, 2, 3]; let h = {"x": 1, "y": 2};"#);
}

#[test]
fn if_else_round_trips() {
    assert_round_trips("if (a[0] < 2) { return 1; } else { return 0; }");
}

#[test]
fn for_loop_round_trips() {
    assert_round_trips("for (i in range(0, 10)) { print(i); }");
}

#[test]
fn function_declaration_round_trips() {
    assert_round_trips("function add(a, b) { return a + b; }");
}

#[test]
fn access_chain_round_trips() {
    assert_round_trips("m->AddNote(60, 4, 100); m->Wait(4);");
}

#[test]
fn compound_assignment_round_trips() {
    assert_round_trips("x += 1; y -= 2; z *= 3;");
}

#[test]
fn indexed_assignment_round_trips() {
    assert_round_trips("a[0] = 9;");
}

#[test]
fn missing_closing_paren_is_a_located_error_not_a_panic() {
    let (_stmts, errors) = mlang::parser::parse("if (1 { }");
    assert!(!errors.is_empty());
    assert!(errors[0].contains("line"));
}

#[test]
fn malformed_let_collects_an_error() {
    let (_stmts, errors) = mlang::parser::parse("let x = ;");
    assert!(!errors.is_empty());
}

#[test]
fn invalid_assignment_target_is_reported() {
    let (_stmts, errors) = mlang::parser::parse("1 + 1 = 2;");
    assert!(!errors.is_empty());
}
