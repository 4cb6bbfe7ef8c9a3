//! The tree-walking evaluator: implements the language's runtime semantics
//! over the `Value` domain. Grounded in `Evaluator.cpp`, with the reference bugs
//! fixed rather than reproduced (see DESIGN.md).

use crate::ast::{AssignOp, AssignTarget, Expr, ForClause, Stmt};
use crate::builtins;
use crate::environment::{EnvRef, Environment};
use crate::value::{FieldTable, HashKey, Value};
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Evaluates a whole program: a flat statement list sharing the root environment.
/// Unwraps a top-level `ReturnValue`; short-circuits on `Exit` and `Error`.
pub fn eval_program(statements: &[Stmt], env: &EnvRef) -> Value {
    let mut result = Value::Null;
    for stmt in statements {
        result = eval_statement(stmt, env);
        match &result {
            Value::Exit(_) | Value::Error(_) => return result,
            Value::ReturnValue(inner) => return (**inner).clone(),
            _ => {}
        }
    }
    result
}

fn eval_block(statements: &[Stmt], env: &EnvRef) -> Value {
    let mut result = Value::Null;
    for stmt in statements {
        result = eval_statement(stmt, env);
        if matches!(result, Value::ReturnValue(_) | Value::Error(_) | Value::Break | Value::Exit(_)) {
            return result;
        }
    }
    result
}

fn eval_statement(stmt: &Stmt, env: &EnvRef) -> Value {
    trace!("evaluating statement: {}", stmt);
    match stmt {
        Stmt::Let { name, value, token } => {
            let v = eval_expr(value, env);
            if v.is_error() {
                return v;
            }
            if is_builtin_name(name) {
                return Value::error(token.line, format!("cannot shadow built-in: {}", name));
            }
            env.declare(name.clone(), v);
            Value::Null
        }
        Stmt::Assign {
            target,
            op,
            value,
            token,
        } => eval_assign(target, op, value, env, token.line),
        Stmt::Return { value, .. } => {
            let v = match value {
                Some(expr) => eval_expr(expr, env),
                None => Value::Null,
            };
            if v.is_error() {
                v
            } else {
                Value::ReturnValue(Box::new(v))
            }
        }
        Stmt::Break { .. } => Value::Break,
        Stmt::Expression { expr, .. } => eval_expr(expr, env),
        Stmt::Block { statements, .. } => {
            let block_env = Environment::new_enclosed(env);
            eval_block(statements, &block_env)
        }
        Stmt::FunctionDecl {
            name, params, body, token,
        } => {
            if is_builtin_name(name) {
                return Value::error(token.line, format!("cannot shadow built-in: {}", name));
            }
            let function = Value::Function(Rc::new(crate::value::FunctionValue {
                params: params.clone(),
                body: (**body).clone(),
                env: Rc::clone(env),
            }));
            env.declare(name.clone(), function);
            Value::Null
        }
    }
}

fn is_builtin_name(name: &str) -> bool {
    builtins::lookup_builtin(name).is_some() || name == "NOTES" || name == "TIME"
}

fn eval_assign(
    target: &AssignTarget,
    op: &AssignOp,
    value: &Expr,
    env: &EnvRef,
    line: usize,
) -> Value {
    let rhs = eval_expr(value, env);
    if rhs.is_error() {
        return rhs;
    }
    match target {
        AssignTarget::Identifier(name) => {
            let new_value = match op {
                AssignOp::Assign => rhs,
                _ => {
                    let current = match env.get(name) {
                        Some(v) => v,
                        None => {
                            return Value::error(line, format!("identifier not found: {}", name))
                        }
                    };
                    match apply_compound(op, &current, &rhs, line) {
                        Ok(v) => v,
                        Err(e) => return e,
                    }
                }
            };
            if new_value.is_error() {
                return new_value;
            }
            env.set(name, new_value.clone());
            new_value
        }
        AssignTarget::Index { name, index } => {
            let index_value = eval_expr(index, env);
            if index_value.is_error() {
                return index_value;
            }
            let new_value = match op {
                AssignOp::Assign => rhs,
                _ => {
                    let current = read_indexed(env, name, &index_value, line);
                    if current.is_error() {
                        return current;
                    }
                    match apply_compound(op, &current, &rhs, line) {
                        Ok(v) => v,
                        Err(e) => return e,
                    }
                }
            };
            if new_value.is_error() {
                return new_value;
            }
            env.set_indexed(name, index_value, new_value, line)
        }
    }
}

fn read_indexed(env: &EnvRef, name: &str, index: &Value, line: usize) -> Value {
    let container = match env.get(name) {
        Some(v) => v,
        None => return Value::error(line, format!("identifier not found: {}", name)),
    };
    eval_index(&container, index, line)
}

/// `+= -= *=` require both operands to be `Integer` (`/=` reserved for symmetry);
/// string `+=` is not defined.
fn apply_compound(op: &AssignOp, current: &Value, rhs: &Value, line: usize) -> Result<Value, Value> {
    match (current, rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                AssignOp::AddAssign => a + b,
                AssignOp::SubAssign => a - b,
                AssignOp::MulAssign => a * b,
                AssignOp::DivAssign => {
                    if *b == 0 {
                        return Err(Value::error(line, "division by zero"));
                    }
                    a / b
                }
                AssignOp::Assign => unreachable!(),
            };
            Ok(Value::Integer(result))
        }
        _ => Err(Value::error(
            line,
            format!(
                "type mismatch: {} {} {}",
                current.type_tag(),
                op,
                rhs.type_tag()
            ),
        )),
    }
}

fn eval_expr(expr: &Expr, env: &EnvRef) -> Value {
    match expr {
        Expr::Identifier { name, token } => {
            if let Some(v) = resolve_identifier(env, name) {
                return v;
            }
            if let Some(field) = env
                .get("_this")
                .and_then(|this| field_table(&this))
                .and_then(|table| table.get(name))
            {
                return Value::Integer(field);
            }
            Value::error(token.line, format!("identifier not found: {}", name))
        }
        Expr::IntegerLit { value, .. } => Value::Integer(*value),
        Expr::BooleanLit { value, .. } => Value::Boolean(*value),
        Expr::StringLit { value, .. } => Value::String(value.clone()),
        Expr::ArrayLit { elements, .. } => {
            let mut values = Vec::with_capacity(elements.len());
            for e in elements {
                let v = eval_expr(e, env);
                if v.is_error() {
                    return v;
                }
                values.push(v);
            }
            Value::Array(Rc::new(RefCell::new(values)))
        }
        Expr::HashLit { pairs, token } => eval_hash_literal(pairs, env, token.line),
        Expr::Prefix { op, right, token } => {
            let r = eval_expr(right, env);
            if r.is_error() {
                return r;
            }
            eval_prefix(op, &r, token.line)
        }
        Expr::Infix {
            op, left, right, token,
        } => {
            let l = eval_expr(left, env);
            if l.is_error() {
                return l;
            }
            let r = eval_expr(right, env);
            if r.is_error() {
                return r;
            }
            eval_infix(op, &l, &r, token.line)
        }
        Expr::Index { left, index, token } => {
            let l = eval_expr(left, env);
            if l.is_error() {
                return l;
            }
            let idx = eval_expr(index, env);
            if idx.is_error() {
                return idx;
            }
            eval_index(&l, &idx, token.line)
        }
        Expr::Call {
            function, args, token,
        } => eval_call(function, args, env, token.line),
        Expr::If {
            condition,
            consequence,
            alternative,
            ..
        } => eval_if(condition, consequence, alternative.as_deref(), env),
        Expr::For { clause, body, .. } => eval_for(clause, body, env),
        Expr::Access { parent, child, .. } => eval_access(parent, child, env),
    }
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &EnvRef, line: usize) -> Value {
    let mut entries = HashMap::new();
    for (key_expr, value_expr) in pairs {
        let key = eval_expr(key_expr, env);
        if key.is_error() {
            return key;
        }
        let value = eval_expr(value_expr, env);
        if value.is_error() {
            return value;
        }
        match HashKey::from_value(&key) {
            Some(hk) => {
                entries.insert(hk, (key, value));
            }
            None => {
                return Value::error(
                    line,
                    format!("unusable as hash key: {}", key.type_tag()),
                )
            }
        }
    }
    Value::Hash(Rc::new(RefCell::new(entries)))
}

fn eval_prefix(op: &str, right: &Value, line: usize) -> Value {
    match op {
        "!" => Value::Boolean(!right.is_truthy()),
        "-" => match right {
            Value::Integer(i) => Value::Integer(-i),
            other => Value::error(line, format!("unknown operator: -{}", other.type_tag())),
        },
        other => Value::error(line, format!("unknown operator: {}", other)),
    }
}

fn eval_infix(op: &str, left: &Value, right: &Value, line: usize) -> Value {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(op, *a, *b, line),
        (Value::String(a), Value::String(b)) => eval_string_infix(op, a, b, line),
        _ => match op {
            "==" => match left.structural_eq(right) {
                Some(b) => Value::Boolean(b),
                None => Value::Boolean(false),
            },
            "!=" => match left.structural_eq(right) {
                Some(b) => Value::Boolean(!b),
                None => Value::Boolean(true),
            },
            _ => Value::error(
                line,
                format!(
                    "type mismatch: {} {} {}",
                    left.type_tag(),
                    op,
                    right.type_tag()
                ),
            ),
        },
    }
}

fn eval_integer_infix(op: &str, a: i64, b: i64, line: usize) -> Value {
    match op {
        "+" => Value::Integer(a.wrapping_add(b)),
        "-" => Value::Integer(a.wrapping_sub(b)),
        "*" => Value::Integer(a.wrapping_mul(b)),
        "/" => {
            if b == 0 {
                Value::error(line, "division by zero")
            } else {
                Value::Integer(a.wrapping_div(b))
            }
        }
        "<" => Value::Boolean(a < b),
        ">" => Value::Boolean(a > b),
        "==" => Value::Boolean(a == b),
        "!=" => Value::Boolean(a != b),
        other => Value::error(line, format!("unknown operator: INTEGER {} INTEGER", other)),
    }
}

fn eval_string_infix(op: &str, a: &str, b: &str, line: usize) -> Value {
    match op {
        "+" => Value::String(format!("{}{}", a, b)),
        "==" => Value::Boolean(a == b),
        "!=" => Value::Boolean(a != b),
        other => Value::error(line, format!("unknown operator: STRING {} STRING", other)),
    }
}

fn eval_index(left: &Value, index: &Value, line: usize) -> Value {
    match (left, index) {
        (Value::Array(elems), Value::Integer(i)) => {
            let elems = elems.borrow();
            if *i < 0 || *i as usize >= elems.len() {
                Value::Null
            } else {
                elems[*i as usize].clone()
            }
        }
        (Value::Hash(entries), key) => match HashKey::from_value(key) {
            Some(hk) => entries
                .borrow()
                .get(&hk)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null),
            None => Value::error(line, format!("unusable as hash key: {}", key.type_tag())),
        },
        (other, _) => Value::error(
            line,
            format!("index operator not supported: {}", other.type_tag()),
        ),
    }
}

fn eval_if(condition: &Expr, consequence: &Stmt, alternative: Option<&Stmt>, env: &EnvRef) -> Value {
    let cond = eval_expr(condition, env);
    if cond.is_error() {
        return cond;
    }
    if cond.is_truthy() {
        eval_statement(consequence, env)
    } else if let Some(alt) = alternative {
        eval_statement(alt, env)
    } else {
        Value::Null
    }
}

fn eval_for(clause: &ForClause, body: &Stmt, env: &EnvRef) -> Value {
    let source = eval_expr(&clause.source, env);
    if source.is_error() {
        return source;
    }
    match source {
        Value::Array(elems) => {
            let items = elems.borrow().clone();
            for item in items {
                let loop_env = Environment::new_enclosed(env);
                loop_env.declare(clause.index.clone(), item);
                let result = eval_statement(body, &loop_env);
                match result {
                    Value::Break => break,
                    Value::ReturnValue(_) | Value::Error(_) | Value::Exit(_) => return result,
                    _ => {}
                }
            }
            Value::Null
        }
        Value::Iter { low, high, step } => {
            if step == 0 {
                return Value::error(clause.source.line(), "range step must not be zero");
            }
            let mut i = low;
            while (step > 0 && i < high) || (step < 0 && i > high) {
                let loop_env = Environment::new_enclosed(env);
                loop_env.declare(clause.index.clone(), Value::Integer(i));
                let result = eval_statement(body, &loop_env);
                match result {
                    Value::Break => break,
                    Value::ReturnValue(_) | Value::Error(_) | Value::Exit(_) => return result,
                    _ => {}
                }
                i += step;
            }
            Value::Null
        }
        other => Value::error(
            clause.source.line(),
            format!("for-in source not iterable: {}", other.type_tag()),
        ),
    }
}

fn eval_call(function: &Expr, args: &[Expr], env: &EnvRef, line: usize) -> Value {
    let callee = eval_expr(function, env);
    if callee.is_error() {
        return callee;
    }
    let mut arg_values = Vec::with_capacity(args.len());
    for a in args {
        let v = eval_expr(a, env);
        if v.is_error() {
            return v;
        }
        arg_values.push(v);
    }
    apply_function(&callee, &arg_values, env, line)
}

fn apply_function(callee: &Value, args: &[Value], env: &EnvRef, line: usize) -> Value {
    match callee {
        Value::Function(f) => {
            if f.params.len() != args.len() {
                return Value::error(
                    line,
                    format!(
                        "wrong number of arguments: want {}, got {}",
                        f.params.len(),
                        args.len()
                    ),
                );
            }
            let call_env = Environment::new_enclosed(&f.env);
            for (param, arg) in f.params.iter().zip(args.iter()) {
                call_env.declare(param.clone(), arg.clone());
            }
            let result = eval_statement(&f.body, &call_env);
            match result {
                Value::ReturnValue(inner) => *inner,
                other => other,
            }
        }
        Value::Builtin(f) => f(args, line),
        Value::AccessBuiltin(_) => {
            let this = match env.get("_this") {
                Some(v) => v,
                None => return Value::error(line, "access builtin called without a receiver"),
            };
            if let Value::AccessBuiltin(f) = callee {
                f(&this, args, line)
            } else {
                unreachable!()
            }
        }
        other => Value::error(line, format!("not a function: {}", other.type_tag())),
    }
}

/// Access dispatch: evaluates `parent`, builds a temporary environment with
/// `_this = parent` and the access-builtin table, then evaluates `child` in it.
/// Bare-field access (`NOTES -> C5`) and method calls (`midi -> AddNote(...)`) both
/// fall out of this uniformly: the child is just an identifier or call evaluated
/// against that environment, and `Expr::Identifier` already knows to consult `_this`'s
/// field table once the usual environment/builtin lookups miss.
fn eval_access(parent: &Expr, child: &Stmt, env: &EnvRef) -> Value {
    let this = eval_expr(parent, env);
    if this.is_error() {
        return this;
    }
    let access_env = Environment::new_enclosed(env);
    access_env.declare("_this", this);
    eval_statement(child, &access_env)
}

fn field_table(value: &Value) -> Option<Rc<FieldTable>> {
    match value {
        Value::Note(t) | Value::Time(t) => Some(Rc::clone(t)),
        _ => None,
    }
}

/// Identifier resolution order: local/enclosing environment bindings, then global
/// builtins, then access builtins — the last only actually reachable as the callee of
/// an `Access`'s child expression, since nothing else binds `_this`.
fn resolve_identifier(env: &EnvRef, name: &str) -> Option<Value> {
    env.get(name)
        .or_else(|| builtins::lookup_builtin(name))
        .or_else(|| builtins::lookup_access_builtin(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(source: &str) -> Value {
        let (stmts, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        let env = builtins::new_global_env();
        eval_program(&stmts, &env)
    }

    #[test]
    fn let_binding_evaluates_to_initializer() {
        let v = run("let x = 5; x;");
        assert!(matches!(v, Value::Integer(5)));
    }

    #[test]
    fn arrays_share_by_reference() {
        let v = run("let a = [1,2,3]; let b = a; a[0] = 9; b[0];");
        assert!(matches!(v, Value::Integer(9)));
    }

    #[test]
    fn closures_capture_bindings_across_calls() {
        let v = run(
            "function make(){ let c = 0; function inc(){ c = c + 1; return c; } return inc; }
             let f = make(); f(); f(); f();",
        );
        assert!(matches!(v, Value::Integer(3)));
    }

    #[test]
    fn hash_round_trips_any_hashable_key() {
        let v = run("let h = {}; h[\"k\"] = 42; h[\"k\"];");
        assert!(matches!(v, Value::Integer(42)));
    }

    #[test]
    fn range_iterates_exactly_b_minus_a_times() {
        let v = run("let n = 0; for (i in range(0, 5)) { n = n + 1; } n;");
        assert!(matches!(v, Value::Integer(5)));
    }

    #[test]
    fn break_terminates_loop_but_following_statements_run() {
        let v = run("let n = 0; for (i in range(0, 10)) { if (i == 3) { break; } n = n + 1; } n;");
        assert!(matches!(v, Value::Integer(3)));
    }

    #[test]
    fn return_unwinds_one_function_frame() {
        let v = run("function f(){ return 1; } function g(){ let x = f(); return x + 1; } g();");
        assert!(matches!(v, Value::Integer(2)));
    }

    #[test]
    fn fibonacci_worked_example() {
        let v = run(
            "function fib(x){ let a=0; let b=1; for (i in range(0,x)){ let c=b; b=a+b; a=c; } return a; } fib(10);",
        );
        assert!(matches!(v, Value::Integer(55)));
    }

    #[test]
    fn hash_access_worked_example() {
        let v = run(r#"let h = {"a":1,"b":2}; h["a"]+h["b"];"#);
        assert!(matches!(v, Value::Integer(3)));
    }

    #[test]
    fn type_mismatch_reports_error() {
        let v = run(r#"let a = 1 + "x";"#);
        match v {
            Value::Error(msg) => assert!(msg.contains("type mismatch: INTEGER + STRING")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn exit_call_propagates_to_program_top() {
        let v = run("exit(42);");
        assert!(matches!(v, Value::Exit(42)));
    }

    #[test]
    fn division_by_zero_is_an_error_value() {
        let v = run("1 / 0;");
        assert!(v.is_error());
    }

    #[test]
    fn heterogeneous_equality_is_structural_not_stringly() {
        let v = run(r#"12 == "12";"#);
        assert!(matches!(v, Value::Boolean(false)));
    }

    #[test]
    fn array_index_at_length_is_out_of_range_not_off_by_one() {
        let v = run("let a = [1,2,3]; a[3];");
        assert!(matches!(v, Value::Null));
    }

    #[test]
    fn set_indexed_array_index_zero_is_allowed() {
        let v = run("let a = [1,2,3]; a[0] = 9; a[0];");
        assert!(matches!(v, Value::Integer(9)));
    }

    #[test]
    fn note_table_field_access() {
        let v = run("NOTES->C5;");
        assert!(matches!(v, Value::Integer(60)));
    }

    #[test]
    fn time_table_field_access() {
        let v = run("TIME->QUARTER;");
        assert!(matches!(v, Value::Integer(4)));
    }

    #[test]
    fn midi_access_method_calls_round_trip() {
        let v = run(
            "let m = MakeMidi(); m->AddNote(60,4,100); m->Type();",
        );
        assert!(matches!(v, Value::String(ref s) if s == "MIDI"));
    }

    #[test]
    fn cannot_shadow_builtin_with_let() {
        let v = run("let print = 1;");
        assert!(v.is_error());
    }

    #[test]
    fn loop_variable_does_not_leak() {
        let v = run("for (i in range(0, 3)) { } i;");
        assert!(v.is_error());
    }
}
