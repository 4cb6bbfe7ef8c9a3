//! The value domain: tagged variants with a uniform `inspect()`/`type_tag()`
//! pair. `Array`, `Hash`, and `Midi` share by reference (`Rc<RefCell<_>>`) so that
//! mutation through one binding is visible through every alias, the reference-counted
//! interior mutability choice over an arena.

use crate::ast::Stmt;
use crate::environment::EnvRef;
use crate::midi::MidiData;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// Mirrors the reference's `ObjectType` enum (`Object.hpp`) including sentinel tags
/// that are never surfaced to user code but are kept for diagnostic fidelity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeTag {
    Null,
    Boolean,
    Integer,
    String,
    Array,
    Hash,
    Function,
    Builtin,
    AccessBuiltin,
    ReturnValue,
    Break,
    Error,
    Exit,
    Iterator,
    Midi,
    Note,
    Time,
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::Null => "NULL",
            TypeTag::Boolean => "BOOLEAN",
            TypeTag::Integer => "INTEGER",
            TypeTag::String => "STRING",
            TypeTag::Array => "ARRAY",
            TypeTag::Hash => "HASH",
            TypeTag::Function => "FUNCTION",
            TypeTag::Builtin => "BUILTIN",
            TypeTag::AccessBuiltin => "ACCESS_BUILTIN",
            TypeTag::ReturnValue => "RETURN_VALUE",
            TypeTag::Break => "BREAK",
            TypeTag::Error => "ERROR",
            TypeTag::Exit => "EXIT",
            TypeTag::Iterator => "ITERATOR",
            TypeTag::Midi => "MIDI",
            TypeTag::Note => "NOTE",
            TypeTag::Time => "TIME",
        };
        write!(f, "{}", s)
    }
}

/// A key restricted to the hashable variants: integer, boolean, or
/// string. Any other variant used as a hash key produces a runtime `Error`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Display for HashKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Integer(i) => write!(f, "{}", i),
            HashKey::Boolean(b) => write!(f, "{}", b),
            HashKey::String(s) => write!(f, "{}", s),
        }
    }
}

impl HashKey {
    pub fn from_value(value: &Value) -> Option<HashKey> {
        match value {
            Value::Integer(i) => Some(HashKey::Integer(*i)),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::String(s) => Some(HashKey::String(s.clone())),
            _ => None,
        }
    }
}

pub type BuiltinFn = fn(&[Value], usize) -> Value;
pub type AccessBuiltinFn = fn(&Value, &[Value], usize) -> Value;

#[derive(Debug)]
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: Stmt,
    pub env: EnvRef,
}

/// An immutable record of named integer fields, used for the `NOTES` and `TIME`
/// pre-populated tables. Built once at root-environment construction and shared
/// by `Rc` thereafter — cheap to clone, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldTable {
    pub fields: Vec<(String, i64)>,
}

impl FieldTable {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashMap<HashKey, (Value, Value)>>>),
    Function(Rc<FunctionValue>),
    Builtin(BuiltinFn),
    AccessBuiltin(AccessBuiltinFn),
    ReturnValue(Box<Value>),
    Break,
    Error(String),
    Exit(i64),
    Iter { low: i64, high: i64, step: i64 },
    Midi(Rc<RefCell<MidiData>>),
    Note(Rc<FieldTable>),
    Time(Rc<FieldTable>),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Integer(_) => TypeTag::Integer,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Hash(_) => TypeTag::Hash,
            Value::Function(_) => TypeTag::Function,
            Value::Builtin(_) => TypeTag::Builtin,
            Value::AccessBuiltin(_) => TypeTag::AccessBuiltin,
            Value::ReturnValue(_) => TypeTag::ReturnValue,
            Value::Break => TypeTag::Break,
            Value::Error(_) => TypeTag::Error,
            Value::Exit(_) => TypeTag::Exit,
            Value::Iter { .. } => TypeTag::Iterator,
            Value::Midi(_) => TypeTag::Midi,
            Value::Note(_) => TypeTag::Note,
            Value::Time(_) => TypeTag::Time,
        }
    }

    /// `false` and `null` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn error(line: usize, message: impl Display) -> Value {
        Value::Error(format!("line {}: {}", line, message))
    }

    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(elems) => {
                let items: Vec<String> = elems.borrow().iter().map(|v| v.inspect()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Hash(entries) => {
                let items: Vec<String> = entries
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::Function(f) => format!("function({})", f.params.join(", ")),
            Value::Builtin(_) => "builtin function".to_string(),
            Value::AccessBuiltin(_) => "builtin method".to_string(),
            Value::ReturnValue(v) => v.inspect(),
            Value::Break => "break".to_string(),
            Value::Error(msg) => format!("ERROR: {}", msg),
            Value::Exit(code) => format!("exit({})", code),
            Value::Iter { low, high, step } => format!("range({}, {}, {})", low, high, step),
            Value::Midi(data) => format!("Midi({} events)", data.borrow().events.len()),
            Value::Note(_) => "NOTES".to_string(),
            Value::Time(_) => "TIME".to_string(),
        }
    }

    /// Structural, type-aware equality — the upgrade from the reference's lossy
    /// `inspect()`-string comparison.
    pub fn structural_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(true),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
            (Value::Integer(a), Value::Integer(b)) => Some(a == b),
            (Value::String(a), Value::String(b)) => Some(a == b),
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return Some(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if x.structural_eq(y) != Some(true) {
                        return Some(false);
                    }
                }
                Some(true)
            }
            (Value::Hash(a), Value::Hash(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return Some(false);
                }
                for (k, (_, v)) in a.iter() {
                    match b.get(k) {
                        Some((_, v2)) if v.structural_eq(v2) == Some(true) => {}
                        _ => return Some(false),
                    }
                }
                Some(true)
            }
            (Value::Function(a), Value::Function(b)) => Some(Rc::ptr_eq(a, b)),
            (Value::Midi(a), Value::Midi(b)) => Some(Rc::ptr_eq(a, b)),
            (Value::Builtin(a), Value::Builtin(b)) => Some(std::ptr::eq(
                *a as *const (),
                *b as *const (),
            )),
            (Value::Iter { low: l1, high: h1, step: s1 }, Value::Iter { low: l2, high: h2, step: s2 }) => {
                Some(l1 == l2 && h1 == h2 && s1 == s2)
            }
            _ if self.type_tag() != other.type_tag() => Some(false),
            _ => Some(false),
        }
    }
}
