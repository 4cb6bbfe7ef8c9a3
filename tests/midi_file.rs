//! SMF-1 byte-level properties, exercised against files produced by
//! running real `mlang` source through the public pipeline rather than poking
//! `MidiData` directly (that's `src/midi.rs`'s own `#[cfg(test)]` module).

mod utils;

use utils::run;

fn generate(source_tail: &str) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("generated.mid");
    let source = format!(
        "let m = MakeMidi();\n{}\nm->GenerateMidi(\"{}\");",
        source_tail,
        path.display()
    );
    run(&source);
    std::fs::read(&path).unwrap()
}

#[test]
fn header_chunk_is_fourteen_bytes_with_format_one_and_division_480() {
    let bytes = generate("m->AddNote(60, 4, 100);");
    assert_eq!(&bytes[0..4], b"MThd");
    assert_eq!(
        u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        6
    );
    assert_eq!(u16::from_be_bytes([bytes[8], bytes[9]]), 1, "format");
    assert_eq!(u16::from_be_bytes([bytes[10], bytes[11]]), 1, "num_tracks");
    assert_eq!(u16::from_be_bytes([bytes[12], bytes[13]]), 480, "division");
}

#[test]
fn track_chunk_length_matches_its_body() {
    let bytes = generate("m->AddNote(60, 4, 100); m->Wait(4); m->AddNote(62, 4, 100);");
    assert_eq!(&bytes[14..18], b"MTrk");
    let declared_len = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
    assert_eq!(declared_len, bytes.len() - 22);
}

#[test]
fn ends_with_the_end_of_track_meta_event() {
    let bytes = generate("m->AddNote(60, 4, 100);");
    assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0xFF, 0x2F, 0x00]);
}

#[test]
fn events_are_emitted_in_nondecreasing_absolute_tick_order_even_when_added_out_of_order() {
    // Two overlapping notes: the second AddNote schedules earlier in wall-clock script
    // order than the first note's note-off, so the writer's sort-before-serialize step
    // is actually exercised.
    let bytes = generate(
        "m->AddNote(64, 4, 100);
         m->AddNote(60, 8, 100);",
    );
    let body = &bytes[22..bytes.len() - 4];
    let ticks = decode_tick_sequence(body);
    let mut sorted = ticks.clone();
    sorted.sort_unstable();
    assert_eq!(ticks, sorted);
}

#[test]
fn delta_time_vlq_boundaries_match_byte_count_transitions() {
    // 127 ticks needs one VLQ byte, 128 needs two — force that boundary via two
    // sixty-fourth notes (480*4/64 = 30 ticks) repeated to land just past 127.
    let bytes = generate(
        "m->AddNote(60, 64, 100);
         m->Wait(64);
         m->AddNote(60, 64, 100);
         m->Wait(64);
         m->AddNote(60, 64, 100);
         m->Wait(64);
         m->AddNote(60, 64, 100);
         m->Wait(64);
         m->AddNote(60, 64, 100);",
    );
    let body = &bytes[22..bytes.len() - 4];
    let ticks = decode_tick_sequence(body);
    assert!(ticks.iter().any(|&t| t > 127));
}

/// Decodes the `<delta VLQ><status><note><velocity>` event stream into absolute ticks.
fn decode_tick_sequence(body: &[u8]) -> Vec<u32> {
    let mut ticks = Vec::new();
    let mut running = 0u32;
    let mut i = 0usize;
    while i < body.len() {
        let start = i;
        while body[i] & 0x80 != 0 {
            i += 1;
        }
        let delta = mlang::vlq::from_bytes(&body[start..=i]).unwrap()[0];
        i += 1;
        running += delta;
        ticks.push(running);
        i += 3; // status, note, velocity
    }
    ticks
}
