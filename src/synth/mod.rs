// Purpose: Voice management, polyphony, control messages, presets
// This layer sits above graph nodes and manages multiple voices

pub mod factory;
pub mod message;
pub mod poly;
pub mod polysynth;
pub mod preset;
pub mod voice;

pub use factory::VoiceFactory;
pub use message::{MessageReceiver, SynthMessage};
pub use poly::{Allocation, PolyVoice, StealMode};
pub use polysynth::Polysynth;
pub use preset::{Preset, PresetBank};
pub use voice::{Voice, VoiceState};

#[cfg(feature = "rtrb")]
pub use message::{control_queue, ControlReceiver, ControlSender};
