//! The MIDI emitter: accumulates `MidiNoteEvent`s on a `Midi`
//! value and serializes them into a well-formed SMF type-1 file. Grounded in
//! `Object.hpp`'s `MidiNoteEvent`/`MidiObj` and `Builtins.cpp`'s `AddNote`.

use crate::constants::{END_OF_TRACK, STATUS_NOTE_OFF, STATUS_NOTE_ON, TICKS_PER_QUARTER};
use crate::error::{self, LibResult};
use crate::vlq;
use snafu::ResultExt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A single note-on or note-off event at an absolute tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MidiNoteEvent {
    pub note: u8,
    pub velocity: u8,
    pub time_ticks: u32,
    pub is_on: bool,
}

/// The accumulating state behind a `Value::Midi`. `cursor_ticks` advances only on
/// `Wait`; `AddNote` always schedules relative to the current cursor without moving it.
#[derive(Clone, Debug, Default)]
pub struct MidiData {
    pub events: Vec<MidiNoteEvent>,
    pub cursor_ticks: u32,
}

/// Duration in ticks for a note value of `1/denom` (a quarter note is `denom=4`).
pub fn duration_ticks(denom: i64) -> Option<u32> {
    if denom <= 0 {
        return None;
    }
    Some((TICKS_PER_QUARTER * 4) / denom as u32)
}

impl MidiData {
    pub fn add_note(&mut self, note: u8, velocity: u8, duration: u32) {
        let start = self.cursor_ticks;
        self.events.push(MidiNoteEvent {
            note,
            velocity,
            time_ticks: start,
            is_on: true,
        });
        self.events.push(MidiNoteEvent {
            note,
            velocity,
            time_ticks: start + duration,
            is_on: false,
        });
    }

    pub fn wait(&mut self, duration: u32) {
        self.cursor_ticks += duration;
    }

    /// Writes the accumulated events as an SMF format-1 file with a single track.
    pub fn generate(&self, path: &Path) -> LibResult<()> {
        let path_str = path.display().to_string();
        let file = File::create(path).context(midi_io_err!(path_str.clone()))?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, &path_str)?;
        write_track(&mut writer, &self.events, &path_str)?;
        writer.flush().context(midi_io_err!(path_str))?;
        Ok(())
    }
}

fn write_header<W: Write>(w: &mut W, path: &str) -> LibResult<()> {
    w.write_all(b"MThd").context(midi_io_err!(path.to_string()))?;
    w.write_all(&6u32.to_be_bytes())
        .context(midi_io_err!(path.to_string()))?;
    w.write_all(&1u16.to_be_bytes())
        .context(midi_io_err!(path.to_string()))?; // format 1
    w.write_all(&1u16.to_be_bytes())
        .context(midi_io_err!(path.to_string()))?; // num_tracks
    w.write_all(&(TICKS_PER_QUARTER as u16).to_be_bytes())
        .context(midi_io_err!(path.to_string()))?; // division
    Ok(())
}

fn write_track<W: Write>(w: &mut W, events: &[MidiNoteEvent], path: &str) -> LibResult<()> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|e| e.time_ticks);

    let mut body = Vec::new();
    let mut previous_tick = 0u32;
    for event in &sorted {
        let delta = event.time_ticks - previous_tick;
        previous_tick = event.time_ticks;
        body.extend(vlq::to_bytes(&[delta]));
        let status = if event.is_on {
            STATUS_NOTE_ON
        } else {
            STATUS_NOTE_OFF
        };
        body.push(status);
        body.push(event.note);
        body.push(event.velocity);
    }
    body.extend_from_slice(&END_OF_TRACK);

    w.write_all(b"MTrk").context(midi_io_err!(path.to_string()))?;
    w.write_all(&(body.len() as u32).to_be_bytes())
        .context(midi_io_err!(path.to_string()))?;
    w.write_all(&body).context(midi_io_err!(path.to_string()))?;
    Ok(())
}
