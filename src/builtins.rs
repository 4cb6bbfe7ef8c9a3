//! Global callables, access functions, and the pre-populated `NOTES`/`TIME` tables.
//! Grounded in `Builtins.cpp` (`ExitCall`, `Range`, `Print`, `MakeMidiObject`,
//! `Type`, `AddNote`) and `Object.hpp`'s `NOTES` array and `TICKS_PER_QUARTER`.

use crate::environment::{EnvRef, Environment};
use crate::midi::{duration_ticks, MidiData};
use crate::value::{AccessBuiltinFn, BuiltinFn, FieldTable, Value};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// A root environment pre-populated with the `NOTES`/`TIME` field tables, shared by
/// the REPL, file execution, and the benchmark driver.
pub fn new_global_env() -> EnvRef {
    let env = Environment::new_root();
    env.declare("NOTES", Value::Note(build_notes_table()));
    env.declare("TIME", Value::Time(build_time_table()));
    env
}

/// Semitone offsets within an octave, in the reference's declared order.
const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Builds the `NOTES` table: `C0 ... B10`, skipping any value above 127.
pub fn build_notes_table() -> Rc<FieldTable> {
    let mut fields = Vec::new();
    for octave in 0..=10i64 {
        for (semitone, name) in NOTE_NAMES.iter().enumerate() {
            let value = semitone as i64 + octave * 12;
            if value > 127 {
                continue;
            }
            fields.push((format!("{}{}", name, octave), value));
        }
    }
    Rc::new(FieldTable { fields })
}

/// Builds the `TIME` table: note-duration denominators.
pub fn build_time_table() -> Rc<FieldTable> {
    Rc::new(FieldTable {
        fields: vec![
            ("WHOLE".to_string(), 1),
            ("HALF".to_string(), 2),
            ("QUARTER".to_string(), 4),
            ("EIGHTH".to_string(), 8),
            ("SIXTEENTH".to_string(), 16),
            ("THIRTY_SECOND".to_string(), 32),
            ("SIXTY_FOURTH".to_string(), 64),
        ],
    })
}

/// Looks up a global builtin callable by name (`exit`, `range`, `print`, `MakeMidi`).
pub fn lookup_builtin(name: &str) -> Option<Value> {
    let f: BuiltinFn = match name {
        "exit" => exit_call,
        "range" => range_call,
        "print" => print_call,
        "MakeMidi" => make_midi_call,
        _ => return None,
    };
    Some(Value::Builtin(f))
}

/// Looks up an access (method-style) builtin by name (`Type`, `AddNote`, `Wait`,
/// `GenerateMidi`), invoked via `recv -> Name(args)`.
pub fn lookup_access_builtin(name: &str) -> Option<Value> {
    let f: AccessBuiltinFn = match name {
        "Type" => type_call,
        "AddNote" => add_note_call,
        "Wait" => wait_call,
        "GenerateMidi" => generate_midi_call,
        _ => return None,
    };
    Some(Value::AccessBuiltin(f))
}

fn exit_call(args: &[Value], line: usize) -> Value {
    match args {
        [] => Value::Exit(0),
        [Value::Integer(code)] => Value::Exit(*code),
        [other] => Value::error(line, format!("argument to `exit` not supported, got {}", other.type_tag())),
        _ => Value::error(line, format!("wrong number of arguments to `exit`: got {}, want 0 or 1", args.len())),
    }
}

fn range_call(args: &[Value], line: usize) -> Value {
    let (low, high, step) = match args {
        [Value::Integer(low), Value::Integer(high)] => (*low, *high, 1),
        [Value::Integer(low), Value::Integer(high), Value::Integer(step)] => (*low, *high, *step),
        _ => {
            return Value::error(
                line,
                "`range` expects (int, int) or (int, int, int)".to_string(),
            )
        }
    };
    if step == 0 {
        return Value::error(line, "`range` step must not be zero".to_string());
    }
    Value::Iter { low, high, step }
}

fn print_call(args: &[Value], _line: usize) -> Value {
    for arg in args {
        println!("{}", arg.inspect());
    }
    Value::Null
}

fn make_midi_call(args: &[Value], line: usize) -> Value {
    if !args.is_empty() {
        return Value::error(line, "`MakeMidi` takes no arguments".to_string());
    }
    Value::Midi(Rc::new(RefCell::new(MidiData::default())))
}

fn type_call(this: &Value, args: &[Value], line: usize) -> Value {
    if !args.is_empty() {
        return Value::error(line, "`Type` takes no arguments".to_string());
    }
    Value::String(this.type_tag().to_string())
}

fn add_note_call(this: &Value, args: &[Value], line: usize) -> Value {
    let midi = match this {
        Value::Midi(data) => data,
        other => return Value::error(line, format!("`AddNote` called on non-Midi value: {}", other.type_tag())),
    };
    let (note, denom, velocity) = match args {
        [Value::Integer(note), Value::Integer(denom), Value::Integer(velocity)] => {
            (*note, *denom, *velocity)
        }
        _ => {
            return Value::error(
                line,
                "`AddNote` expects (int note, int denom, int velocity)".to_string(),
            )
        }
    };
    if !(0..=127).contains(&note) {
        return Value::error(line, format!("note out of range 0..=127: {}", note));
    }
    if !(0..=127).contains(&velocity) {
        return Value::error(line, format!("velocity out of range 0..=127: {}", velocity));
    }
    let duration = match duration_ticks(denom) {
        Some(d) => d,
        None => return Value::error(line, format!("invalid note denominator: {}", denom)),
    };
    midi.borrow_mut().add_note(note as u8, velocity as u8, duration);
    Value::Null
}

fn wait_call(this: &Value, args: &[Value], line: usize) -> Value {
    let midi = match this {
        Value::Midi(data) => data,
        other => return Value::error(line, format!("`Wait` called on non-Midi value: {}", other.type_tag())),
    };
    let denom = match args {
        [Value::Integer(denom)] => *denom,
        _ => return Value::error(line, "`Wait` expects (int denom)".to_string()),
    };
    let duration = match duration_ticks(denom) {
        Some(d) => d,
        None => return Value::error(line, format!("invalid wait denominator: {}", denom)),
    };
    midi.borrow_mut().wait(duration);
    Value::Null
}

fn generate_midi_call(this: &Value, args: &[Value], line: usize) -> Value {
    let midi = match this {
        Value::Midi(data) => data,
        other => {
            return Value::error(
                line,
                format!("`GenerateMidi` called on non-Midi value: {}", other.type_tag()),
            )
        }
    };
    let path = match args {
        [Value::String(path)] => path,
        _ => return Value::error(line, "`GenerateMidi` expects (string path)".to_string()),
    };
    match midi.borrow().generate(Path::new(path)) {
        Ok(()) => Value::Null,
        Err(e) => Value::error(line, format!("GenerateMidi failed: {}", e)),
    }
}
