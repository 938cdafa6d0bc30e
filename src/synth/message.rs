#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::param::ParamId;

/// Control events for the audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ParamUpdate { id: ParamId, value: f32 },
    PitchBend { semitones: f32 },
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Receiving end of the control queue, owned by the audio thread.
#[cfg(feature = "rtrb")]
pub type ControlReceiver = Consumer<SynthMessage>;

/// Sending end of the control queue.
///
/// Never blocks: when the queue is full the message is dropped and counted.
#[cfg(feature = "rtrb")]
pub struct ControlSender {
    producer: Producer<SynthMessage>,
    dropped: u64,
}

#[cfg(feature = "rtrb")]
impl ControlSender {
    /// Returns `false` if the queue was full and the message was dropped.
    pub fn try_send(&mut self, message: SynthMessage) -> bool {
        match self.producer.push(message) {
            Ok(()) => true,
            Err(_) => {
                self.dropped += 1;
                tracing::trace!(?message, dropped = self.dropped, "control queue full");
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Free space left in the queue.
    pub fn slots(&self) -> usize {
        self.producer.slots()
    }
}

/// Bounded single-producer single-consumer queue for [`SynthMessage`]s.
#[cfg(feature = "rtrb")]
pub fn control_queue(capacity: usize) -> (ControlSender, ControlReceiver) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    (
        ControlSender {
            producer,
            dropped: 0,
        },
        consumer,
    )
}
