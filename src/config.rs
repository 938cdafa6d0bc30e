//! Synth construction settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest unison stack a voice can be built with.
pub const MAX_UNISON_VOICES: usize = 16;

/// Configuration for [`Polysynth`](crate::Polysynth).
///
/// Everything here sizes the graph, so it is fixed once the synth is built.
/// Musical settings (cutoff, ADSR, unison spread...) are parameters instead.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    /// Number of voice slots in the pool.
    pub polyphony: usize,
    /// Unison slots built per voice (upper bound for the unison voice count).
    pub max_unison: usize,
    /// Unison voices active at startup.
    pub unison_voices: usize,
    /// Longest delay time the feedback delay can reach.
    pub max_delay_seconds: f32,
    /// Capacity of the control message queue.
    pub queue_capacity: usize,
    /// Messages drained per block at most.
    pub max_messages_per_block: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            polyphony: 8,
            max_unison: 4,
            unison_voices: 1,
            max_delay_seconds: 2.0,
            queue_capacity: 256,
            max_messages_per_block: 64,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8_000.0..=384_000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.polyphony == 0 || self.polyphony > 128 {
            return Err(Error::InvalidConfig(format!(
                "polyphony {} out of range (1-128)",
                self.polyphony
            )));
        }
        if self.max_unison == 0 || self.max_unison > MAX_UNISON_VOICES {
            return Err(Error::InvalidConfig(format!(
                "max_unison {} out of range (1-{MAX_UNISON_VOICES})",
                self.max_unison
            )));
        }
        if self.unison_voices == 0 || self.unison_voices > self.max_unison {
            return Err(Error::InvalidConfig(format!(
                "unison_voices {} out of range (1-{})",
                self.unison_voices, self.max_unison
            )));
        }
        if !(self.max_delay_seconds > 0.0 && self.max_delay_seconds <= 10.0) {
            return Err(Error::InvalidConfig(format!(
                "max_delay_seconds {} out of range (0-10 s]",
                self.max_delay_seconds
            )));
        }
        if self.queue_capacity == 0 || self.max_messages_per_block == 0 {
            return Err(Error::InvalidConfig(
                "control queue needs a non-zero capacity and drain budget".into(),
            ));
        }
        Ok(())
    }
}
