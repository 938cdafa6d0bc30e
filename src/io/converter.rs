use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Controller number of the MIDI "all notes off" channel mode message.
pub const CC_ALL_NOTES_OFF: u8 = 123;
/// Default pitch-wheel range, in semitones either way.
pub const DEFAULT_BEND_RANGE: f32 = 2.0;

/// Translate a MIDI event on `channel_filter` into a synth message.
///
/// Pitch bend is scaled to `bend_range` semitones at full deflection.
/// Events on other channels, and anything the synth has no message for,
/// map to `None`.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8, bend_range: f32) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }
    match midi {
        MidiEvent::NoteOn { key, velocity: 0, .. } | MidiEvent::NoteOff { key, .. } => {
            Some(SynthMessage::NoteOff { note: key })
        }
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::PitchBend { value, .. } => Some(SynthMessage::PitchBend {
            semitones: bend_semitones(value, bend_range),
        }),
        MidiEvent::ControlChange {
            controller: CC_ALL_NOTES_OFF,
            ..
        } => Some(SynthMessage::AllNotesOff),
        MidiEvent::ControlChange { .. } | MidiEvent::ProgramChange { .. } => None,
    }
}

/// Wheel position (-8192..=8191) to semitones.
pub fn bend_semitones(value: i16, bend_range: f32) -> f32 {
    let normalized = if value >= 0 {
        value as f32 / 8191.0
    } else {
        value as f32 / 8192.0
    };
    normalized * bend_range
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}
