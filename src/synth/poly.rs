#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::mix::Mixer;
use crate::graph::node::{Node, RenderCtx};
use crate::param::ParamPool;
use crate::synth::voice::{Voice, VoiceState};
use crate::Block;

/*
Voice Allocation
================

A fixed pool of voices, each a mixer input. Keys come and go; voices stay.

    slot   voice   key    index   state
    0      V0      60     7       Active
    1      V1      -      3       Free        (muted, not rendered)
    2      V2      64     5       Releasing   (key up, envelope still going)

note_on(key):
  1. a slot already holds the key   → retrigger it in place
  2. a voice is idle                 → claim it
  3. otherwise steal, per StealMode:
       Oldest    lowest index (the note started longest ago)
       Quietest  lowest amplitude-envelope level
       NoSteal   drop the new note

`index` is a counter bumped on every assignment, so "oldest" is simply the
smallest one. A slot keeps its key through the release; it is only freed
when its envelopes go idle, which is checked at the top of every `process`.
The same check mutes idle voices, so a free slot costs nothing to render.

The active-count limit restricts new notes to the first N slots (1 = mono).
Lowering it never cuts off notes already sounding in higher slots.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealMode {
    #[default]
    Oldest,
    Quietest,
    NoSteal,
}

impl StealMode {
    /// From a param value: 0 oldest, 1 quietest, 2 no steal.
    pub fn from_value(value: f32) -> Self {
        match crate::dsp::clamp_finite(value.round(), 0.0, 2.0) as u8 {
            0 => StealMode::Oldest,
            1 => StealMode::Quietest,
            _ => StealMode::NoSteal,
        }
    }

    pub fn value(self) -> f32 {
        match self {
            StealMode::Oldest => 0.0,
            StealMode::Quietest => 1.0,
            StealMode::NoSteal => 2.0,
        }
    }
}

/// What `note_on` did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// The key was already sounding in this slot.
    Retriggered(usize),
    /// An idle slot took the key.
    Claimed(usize),
    /// A sounding voice was taken over.
    Stolen { slot: usize, previous: Option<u8> },
    /// No voice free and stealing disabled.
    Dropped,
}

impl Allocation {
    pub fn slot(self) -> Option<usize> {
        match self {
            Allocation::Retriggered(slot) | Allocation::Claimed(slot) => Some(slot),
            Allocation::Stolen { slot, .. } => Some(slot),
            Allocation::Dropped => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotAssignment {
    key: Option<u8>,
    index: u64,
    released: bool,
}

pub struct PolyVoice<G = Box<dyn Node>> {
    mixer: Mixer<Voice<G>>,
    slots: Vec<SlotAssignment>,
    next_index: u64,
    steal_mode: StealMode,
    active_limit: usize,
}

impl<G: Node> PolyVoice<G> {
    pub fn new(voices: Vec<Voice<G>>) -> Self {
        let capacity = voices.len();
        let mut mixer = Mixer::with_capacity(capacity);
        for voice in voices {
            let index = mixer.add_input(voice, None, None);
            mixer.set_muted(index, true);
        }
        Self {
            mixer,
            slots: vec![SlotAssignment::default(); capacity],
            next_index: 0,
            steal_mode: StealMode::default(),
            active_limit: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn steal_mode(&self) -> StealMode {
        self.steal_mode
    }

    pub fn set_steal_mode(&mut self, mode: StealMode) {
        self.steal_mode = mode;
    }

    pub fn active_limit(&self) -> usize {
        self.active_limit
    }

    /// Clamped to [1, capacity].
    pub fn set_active_limit(&mut self, limit: usize) {
        self.active_limit = limit.clamp(1, self.capacity().max(1));
    }

    pub fn voice(&self, slot: usize) -> Option<&Voice<G>> {
        self.mixer.input(slot).and_then(|input| input.source.as_ref())
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice<G>> {
        self.mixer.inputs().iter().filter_map(|input| input.source.as_ref())
    }

    fn voice_mut(&mut self, slot: usize) -> Option<&mut Voice<G>> {
        self.mixer.input_mut(slot).and_then(|input| input.source.as_mut())
    }

    /// Key assigned to a slot (kept through the release).
    pub fn slot_key(&self, slot: usize) -> Option<u8> {
        self.slots.get(slot).and_then(|s| s.key)
    }

    pub fn slot_of(&self, key: u8) -> Option<usize> {
        self.slots.iter().position(|s| s.key == Some(key))
    }

    pub fn slot_state(&self, slot: usize) -> VoiceState {
        match self.slots.get(slot) {
            Some(SlotAssignment { key: Some(_), released: false, .. }) => VoiceState::Active,
            Some(SlotAssignment { key: Some(_), released: true, .. }) => VoiceState::Releasing,
            _ => VoiceState::Free,
        }
    }

    /// Slots holding a key.
    pub fn assigned_count(&self) -> usize {
        self.slots.iter().filter(|s| s.key.is_some()).count()
    }

    fn is_muted(&self, slot: usize) -> bool {
        self.mixer.input(slot).map_or(true, |input| input.muted)
    }

    pub fn note_on(&mut self, params: &mut ParamPool, key: u8, velocity: u8) -> Allocation {
        if let Some(slot) = self.slot_of(key) {
            self.start(params, slot, key, velocity);
            return Allocation::Retriggered(slot);
        }

        let limit = self.active_limit.min(self.capacity());
        let idle = (0..limit).find(|&slot| {
            self.voice(slot).is_some_and(|voice| voice.is_idle(params))
        });
        if let Some(slot) = idle {
            self.start(params, slot, key, velocity);
            return Allocation::Claimed(slot);
        }

        let victim = match self.steal_mode {
            StealMode::Oldest => (0..limit).min_by_key(|&slot| self.slots[slot].index),
            StealMode::Quietest => (0..limit).min_by(|&a, &b| {
                let level = |slot| self.voice(slot).map_or(0.0, |v| v.level(params));
                level(a).total_cmp(&level(b))
            }),
            StealMode::NoSteal => None,
        };
        match victim {
            Some(slot) => {
                let previous = self.slots[slot].key;
                if let Some(voice) = self.voice_mut(slot) {
                    voice.note_off(params);
                }
                self.start(params, slot, key, velocity);
                Allocation::Stolen { slot, previous }
            }
            None => Allocation::Dropped,
        }
    }

    fn start(&mut self, params: &mut ParamPool, slot: usize, key: u8, velocity: u8) {
        if let Some(voice) = self.voice_mut(slot) {
            voice.note_on(params, key, velocity);
        }
        self.next_index += 1;
        self.slots[slot] = SlotAssignment {
            key: Some(key),
            index: self.next_index,
            released: false,
        };
        self.mixer.set_muted(slot, false);
    }

    /// Release the voice holding `key`. Unknown keys are ignored.
    pub fn note_off(&mut self, params: &mut ParamPool, key: u8) {
        let Some(slot) = self
            .slots
            .iter()
            .position(|s| s.key == Some(key) && !s.released)
        else {
            return;
        };
        if let Some(voice) = self.voice_mut(slot) {
            voice.note_off(params);
        }
        self.slots[slot].released = true;
    }

    pub fn all_notes_off(&mut self, params: &mut ParamPool) {
        for slot in 0..self.capacity() {
            if self.slot_state(slot) == VoiceState::Active {
                if let Some(voice) = self.voice_mut(slot) {
                    voice.note_off(params);
                }
                self.slots[slot].released = true;
            }
        }
    }

    /// Free slots whose envelopes finished, and mute idle voices.
    pub fn sync(&mut self, params: &ParamPool) {
        for slot in 0..self.capacity() {
            let idle = self.voice(slot).map_or(true, |voice| voice.is_idle(params));
            if idle {
                self.slots[slot].key = None;
                self.slots[slot].released = false;
            }
            if idle != self.is_muted(slot) {
                self.mixer.set_muted(slot, idle);
            }
        }
    }
}

impl<G: Node> Node for PolyVoice<G> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        self.sync(ctx.params);
        self.mixer.process(ctx)
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        self.mixer.reset(params, hard);
    }
}
