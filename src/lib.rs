//! `mlang`: an interpreter for a small dynamically-typed scripting language whose
//! distinguishing feature is a first-class MIDI composition API. Programs build up a
//! MIDI track by invoking methods on a `Midi` value through the `->` operator and
//! finally emit a Standard MIDI File (SMF, format 1).
//!
//! The pipeline is a conventional one: [`lexer`] produces a token stream, [`parser`]
//! turns that into an [`ast`], [`evaluator`] walks the AST against a [`value`] domain
//! and an [`environment`], and [`midi`] serializes whatever a script built up on a
//! `Value::Midi` into bytes. [`builtins`] wires the global callables (`range`, `print`,
//! `exit`, `MakeMidi`) and the `NOTES`/`TIME` field tables into a fresh root
//! environment. [`cli`] and [`repl`] are the two ways a user drives all of this; this
//! crate's `main.rs` is a thin shell around [`cli::run`].

#![allow(dead_code)]

#[macro_use]
mod error;

pub mod ast;
pub mod benchmark;
pub mod builtins;
pub mod cli;
pub mod constants;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod midi;
pub mod parser;
pub mod repl;
pub mod token;
pub mod value;
pub mod vlq;

pub use error::{Error, Result};
pub use value::Value;
