//! Lexically-scoped environments. Bindings share structure through
//! `Rc<Environment>` so that closures can capture an environment and later calls to
//! `set` see mutations made through any handle — the same reference-counted interior
//! mutability used for `Array`/`Hash`.

use crate::value::{HashKey, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type EnvRef = Rc<Environment>;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn new_root() -> EnvRef {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn new_enclosed(parent: &EnvRef) -> EnvRef {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Walks the parent chain; returns a clone of the bound value.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.bindings.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// `let` always inserts into the current frame, shadowing any ancestor binding.
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Assignment semantics: mutate the nearest ancestor frame (including this
    /// one) that already binds `name`; otherwise insert into the current frame. This
    /// always succeeds, so it returns `()` rather than a fallible result.
    pub fn set(&self, name: &str, value: Value) {
        if self.set_existing(name, value.clone()) {
            return;
        }
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    fn set_existing(&self, name: &str, value: Value) -> bool {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.set_existing(name, value),
            None => false,
        }
    }

    /// The indexed-assignment path. Locates `name` by walking the parent chain
    /// and mutates the bound `Array`/`Hash` container in place (reference semantics
    /// mean the container itself, not the binding, is what's mutated). Returns an
    /// `Error` on an absent name, wrong container type, or out-of-range index — the
    /// fix to the reference's silent no-op.
    pub fn set_indexed(&self, name: &str, index: Value, value: Value, line: usize) -> Value {
        let existing = match self.get(name) {
            Some(v) => v,
            None => return Value::error(line, format!("identifier not found: {}", name)),
        };
        match existing {
            Value::Array(elems) => match index {
                Value::Integer(i) => {
                    let mut elems = elems.borrow_mut();
                    if i < 0 || i as usize >= elems.len() {
                        return Value::error(line, format!("index out of range: {}", i));
                    }
                    elems[i as usize] = value.clone();
                    value
                }
                other => Value::error(
                    line,
                    format!("index operator not supported: {}", other.type_tag()),
                ),
            },
            Value::Hash(entries) => match HashKey::from_value(&index) {
                Some(key) => {
                    entries.borrow_mut().insert(key, (index, value.clone()));
                    value
                }
                None => Value::error(
                    line,
                    format!("unusable as hash key: {}", index.type_tag()),
                ),
            },
            other => Value::error(
                line,
                format!("index assignment not supported on: {}", other.type_tag()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_shadows_in_current_frame() {
        let root = Environment::new_root();
        root.declare("x", Value::Integer(1));
        let child = Environment::new_enclosed(&root);
        child.declare("x", Value::Integer(2));
        assert!(matches!(child.get("x"), Some(Value::Integer(2))));
        assert!(matches!(root.get("x"), Some(Value::Integer(1))));
    }

    #[test]
    fn assignment_mutates_ancestor_frame() {
        let root = Environment::new_root();
        root.declare("x", Value::Integer(1));
        let child = Environment::new_enclosed(&root);
        child.set("x", Value::Integer(9));
        assert!(matches!(root.get("x"), Some(Value::Integer(9))));
    }

    #[test]
    fn assignment_with_no_existing_binding_creates_in_current_frame() {
        let root = Environment::new_root();
        let child = Environment::new_enclosed(&root);
        child.set("y", Value::Integer(5));
        assert!(root.get("y").is_none());
        assert!(matches!(child.get("y"), Some(Value::Integer(5))));
    }

    #[test]
    fn set_indexed_array_out_of_range_errors() {
        let root = Environment::new_root();
        root.declare(
            "a",
            Value::Array(Rc::new(RefCell::new(vec![Value::Integer(1)]))),
        );
        let result = root.set_indexed("a", Value::Integer(5), Value::Integer(9), 1);
        assert!(result.is_error());
    }
}
