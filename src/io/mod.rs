// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;
pub mod stream;

pub use converter::{midi_note_to_freq, midi_to_synth};
pub use midi::MidiEvent;
pub use stream::BlockStream;
