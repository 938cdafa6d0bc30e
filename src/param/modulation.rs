#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ParamRef;

/// Modulation slots per param.
pub const MAX_MOD_INPUTS: usize = 8;

/// Shaping applied to a modulation source before it is scaled.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModMap {
    #[default]
    Identity,
    /// [-1, 1] → [0, 1]
    Unipolar,
    /// [0, 1] → [-1, 1]
    Bipolar,
    /// Sign-preserving square, for finer control near zero.
    Squared,
    /// 1 - x, e.g. an envelope that ducks instead of opens.
    Invert,
}

impl ModMap {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ModMap::Identity => x,
            ModMap::Unipolar => (x + 1.0) * 0.5,
            ModMap::Bipolar => x * 2.0 - 1.0,
            ModMap::Squared => x * x.abs(),
            ModMap::Invert => 1.0 - x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModInput {
    pub source: ParamRef,
    pub amount: f32,
    pub map: ModMap,
}

/// Fixed-capacity modulation list. Never allocates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModInputs {
    inputs: [Option<ModInput>; MAX_MOD_INPUTS],
    len: usize,
}

impl ModInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input. Returns its slot, or `None` when full.
    pub fn push(&mut self, input: ModInput) -> Option<usize> {
        if self.len == MAX_MOD_INPUTS {
            return None;
        }
        let slot = self.len;
        self.inputs[slot] = Some(input);
        self.len += 1;
        Some(slot)
    }

    pub fn get(&self, slot: usize) -> Option<&ModInput> {
        self.inputs.get(slot).and_then(Option::as_ref)
    }

    /// Change the depth of an existing input. Returns `false` for an empty slot.
    pub fn set_amount(&mut self, slot: usize, amount: f32) -> bool {
        match self.inputs.get_mut(slot).and_then(Option::as_mut) {
            Some(input) => {
                input.amount = amount;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModInput> {
        self.inputs[..self.len].iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_MOD_INPUTS
    }

    pub fn clear(&mut self) {
        self.inputs = [None; MAX_MOD_INPUTS];
        self.len = 0;
    }
}
