#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Centered on zero: -8192..=8191.
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Parse one channel message. A note-on with velocity 0 is a note-off.
    /// Returns `None` for short or unsupported messages.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let data1 = data.first().map(|b| b & 0x7F);
        let data2 = data.get(1).map(|b| b & 0x7F);

        match (status & 0xF0, data1, data2) {
            (0x90, Some(key), Some(0)) => Some(MidiEvent::NoteOff {
                channel,
                key,
                velocity: 0,
            }),
            (0x90, Some(key), Some(velocity)) => Some(MidiEvent::NoteOn {
                channel,
                key,
                velocity,
            }),
            (0x80, Some(key), Some(velocity)) => Some(MidiEvent::NoteOff {
                channel,
                key,
                velocity,
            }),
            (0xB0, Some(controller), Some(value)) => Some(MidiEvent::ControlChange {
                channel,
                controller,
                value,
            }),
            (0xC0, Some(program), _) => Some(MidiEvent::ProgramChange { channel, program }),
            (0xE0, Some(lsb), Some(msb)) => Some(MidiEvent::PitchBend {
                channel,
                value: (((msb as i16) << 7) | lsb as i16) - 8192,
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_messages() {
        assert_eq!(
            MidiEvent::from_bytes(&[0x92, 60, 100]),
            Some(MidiEvent::NoteOn {
                channel: 2,
                key: 60,
                velocity: 100
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0x90, 60, 0]),
            Some(MidiEvent::NoteOff {
                channel: 0,
                key: 60,
                velocity: 0
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xE0, 0x00, 0x40]),
            Some(MidiEvent::PitchBend { channel: 0, value: 0 })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xE0, 0x7F, 0x7F]),
            Some(MidiEvent::PitchBend { channel: 0, value: 8191 })
        );
    }

    #[test]
    fn rejects_short_and_system_messages() {
        assert_eq!(MidiEvent::from_bytes(&[]), None);
        assert_eq!(MidiEvent::from_bytes(&[0x90, 60]), None);
        assert_eq!(MidiEvent::from_bytes(&[0xF8]), None);
    }
}
