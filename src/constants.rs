//! Status byte constants used by the SMF-1 note-event emitter.

/// `0x80`: a `Note Off` message, channel 0.
pub(crate) const STATUS_NOTE_OFF: u8 = 0x80;

/// `0x90`: a `Note On` message, channel 0.
pub(crate) const STATUS_NOTE_ON: u8 = 0x90;

/// `0xFF 0x2F 0x00`: the end-of-track meta event, with a zero delta-time prefix.
pub(crate) const END_OF_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];

/// Ticks per quarter note (the SMF header's `division` field, and the unit every
/// note/wait duration is computed in).
pub(crate) const TICKS_PER_QUARTER: u32 = 480;
