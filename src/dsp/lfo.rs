//! Low Frequency Oscillator (LFO) concepts.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::{triangle, wrap_phase};

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio rates (~0.01 to ~20 Hz). It
isn't heard; it moves other parameters: vibrato on pitch, sweeps on cutoff.

    0.1 - 0.5 Hz    slow filter movement
    2 - 7 Hz        vibrato sweet spot
    > 15 Hz         approaching audio rate (FM/AM territory)

Output is bipolar, scaled by a depth signal:

    out = depth · wave(phase)         wave ∈ [-1, 1]

Depth is in the units of whatever the LFO drives: semitones when it feeds a
pitch tuner, Hz when it feeds a cutoff. A depth of zero makes the LFO a
silent source, so idle modulation routes cost one multiply.

The LFO lives in the param arena as a shared, free-running source. Every
voice reads the same buffer, so vibrato stays in phase across a chord.

No band-limiting here: aliasing is irrelevant at these rates.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl LfoShape {
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            LfoShape::Sine => (std::f32::consts::TAU * phase).sin(),
            LfoShape::Triangle => triangle(phase),
            LfoShape::Saw => 2.0 * phase - 1.0,
            LfoShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Highest rate an LFO runs at.
pub const MAX_LFO_RATE: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct Lfo {
    shape: LfoShape,
    phase: f32,
}

impl Lfo {
    pub fn new(shape: LfoShape) -> Self {
        Self { shape, phase: 0.0 }
    }

    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    /// Fill `out` with `depth[i] · wave`, advancing by `rate[i]` Hz per sample.
    pub fn render(&mut self, out: &mut [f32], rate: &[f32], depth: &[f32], sample_rate: f32) {
        for (i, sample) in out.iter_mut().enumerate() {
            let hz = crate::dsp::clamp_finite(rate.get(i).copied().unwrap_or(0.0), 0.0, MAX_LFO_RATE);
            let depth = depth.get(i).copied().unwrap_or(0.0);
            *sample = depth * self.shape.sample(self.phase);
            self.phase = wrap_phase(self.phase + hz / sample_rate);
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Calculate samples per LFO period.
///
/// # Example
/// ```
/// use blocksynth::dsp::lfo::samples_per_period;
/// let samples = samples_per_period(5.0, 48000.0);
/// assert_eq!(samples, 9600.0); // 5 Hz at 48kHz = 9600 samples
/// ```
#[inline]
pub fn samples_per_period(frequency_hz: f32, sample_rate: f32) -> f32 {
    sample_rate / frequency_hz
}
