use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::clamp_finite;

/*
Zero-Delay-Feedback State Variable Filter
=========================================

| mode              | output tap             | passes          | rejects      |
| ----------------- | ---------------------- | --------------- | ------------ |
| low-pass          | v2                     | below cutoff    | above cutoff |
| high-pass         | x - k·v1 - v2          | above cutoff    | below cutoff |
| band-pass         | v1                     | around cutoff   | outside      |
| notch / band-stop | x - k·v1               | outside         | around cutoff|

Two trapezoidal integrators in a loop, solved implicitly so the feedback
has no unit delay (Zavalishin / Simper). That's what keeps it stable when
the cutoff is swept every sample:

    g = tan(π · fc / sr)      prewarped integrator gain
    k = 1 / Q                 damping
    h = 1 / (1 + g·(g + k))

    v3 = x - ic2
    v1 = h · (ic1 + g·v3)
    v2 = ic2 + g·v1
    ic1 = 2·v1 - ic1
    ic2 = 2·v2 - ic2

Cutoff is clamped to [5 Hz, 0.49 · Nyquist] so `tan` never approaches its
pole, and Q to [0.3, 20].
*/

pub const MIN_CUTOFF_HZ: f32 = 5.0;
pub const MIN_Q: f32 = 0.3;
pub const MAX_Q: f32 = 20.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

impl FilterOutputs {
    #[inline]
    pub fn tap(&self, mode: FilterMode) -> f32 {
        match mode {
            FilterMode::LowPass => self.lowpass,
            FilterMode::HighPass => self.highpass,
            FilterMode::BandPass => self.bandpass,
            FilterMode::Notch => self.notch,
        }
    }
}

/// Prewarped gain `g` and damping `k` for a cutoff/Q pair, after clamping.
#[inline]
pub fn coefficients(cutoff_hz: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let max_cutoff = 0.49 * 0.5 * sample_rate;
    let cutoff = clamp_finite(cutoff_hz, MIN_CUTOFF_HZ, max_cutoff);
    let q = clamp_finite(q, MIN_Q, MAX_Q);
    let g = (PI * cutoff / sample_rate).tan();
    (g, 1.0 / q)
}

/// One channel of filter state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
}

impl SVFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    /// Filter a buffer in place at a fixed cutoff and Q.
    pub fn render(
        &mut self,
        buffer: &mut [f32],
        mode: FilterMode,
        cutoff_hz: f32,
        q: f32,
        sample_rate: f32,
    ) {
        let (g, k) = coefficients(cutoff_hz, q, sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, k, g).tap(mode);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
