use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/*
Oscillator Waveforms
====================

Phase is kept in turns: 0.0 is the start of a cycle, 1.0 the start of the
next. Each sample advances it by `freq / sample_rate`, so a 440 Hz tone at
48 kHz moves 0.00917 turns per sample. (Multiply by 2π for radians; we only
do that for the sine.)

    phase  0.0        0.25       0.5        0.75       1.0
           │──────────│──────────│──────────│──────────│
    sine   0    ↗     1    ↘     0    ↘    -1    ↗     0
    saw   -1  ──────────────────────────────────────→ +1 │ jump
    tri   -1    ↗     0    ↗     1    ↘     0    ↘    -1


Aliasing and PolyBLEP
---------------------

A naive sawtooth jumps from +1 to -1 in zero time. That step has energy at
every frequency, and everything above Nyquist folds back down as inharmonic
junk ("aliasing"), most obvious on high notes.

PolyBLEP (polynomial band-limited step) rounds off the corner: within one
sample of the discontinuity we subtract a 2-sample polynomial that
approximates a band-limited step. `dt` is the phase increment.

    t < dt           (just after the wrap)   x = t/dt        → 2x - x² - 1
    t > 1 - dt       (just before the wrap)  x = (t-1)/dt    → x² + 2x + 1
    otherwise                                                  0

A pulse is the difference of two saws offset by the pulse width `w`. Each
saw brings its own corrected edge, so both pulse edges are band-limited:

    pulse(p) = saw(frac(p - w)) - saw(p) + (2w - 1)

The triangle is left naive: its corners are in the slope, not the level, and
the harmonics fall off as 1/n² anyway.


Shape Registry
--------------

Oscillators don't own a waveform; they read a shape id from a param every
block and look it up here. Switching waveform is a parameter change, not a
graph rebuild. Ids that were never registered play a sine.

    id  0 Sine   1 Saw   2 Triangle   3 Square   4 Noise   5.. free

Wavetables are registered up front (that allocates) and referenced by index.
*/

/// Number of shape ids the registry can hold.
pub const MAX_SHAPES: usize = 16;

pub const SHAPE_SINE: u8 = 0;
pub const SHAPE_SAW: u8 = 1;
pub const SHAPE_TRIANGLE: u8 = 2;
pub const SHAPE_SQUARE: u8 = 3;
pub const SHAPE_NOISE: u8 = 4;

pub const MIN_PULSE_WIDTH: f32 = 0.01;
pub const MAX_PULSE_WIDTH: f32 = 0.99;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Triangle,
    Square,
    Noise,
    /// Single-cycle wavetable, by registration index.
    Table(u8),
}

/// Wrap a phase into `[0, 1)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    // -1e-9 floors to -1 and lands exactly on 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// PolyBLEP residual for a unit step at phase 0. `t` in turns, `dt` the
/// phase increment per sample.
#[inline]
pub fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

/// Band-limited rising sawtooth in [-1, 1].
#[inline]
pub fn blep_saw(phase: f32, dt: f32) -> f32 {
    2.0 * phase - 1.0 - poly_blep(phase, dt)
}

/// Band-limited pulse: high for `phase < width`, low after.
#[inline]
pub fn blep_square(phase: f32, dt: f32, width: f32) -> f32 {
    let width = crate::dsp::clamp_finite(width, MIN_PULSE_WIDTH, MAX_PULSE_WIDTH);
    blep_saw(wrap_phase(phase - width), dt) - blep_saw(phase, dt) + (2.0 * width - 1.0)
}

#[inline]
pub fn triangle(phase: f32) -> f32 {
    1.0 - 4.0 * (phase - 0.5).abs()
}

/// Marsaglia xorshift32. Cheap, allocation-free white noise.
#[derive(Debug, Clone, Copy)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        // zero is a fixed point of the generator
        let state = if seed == 0 { 0x9E37_79B9 } else { seed };
        Self { state }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next sample in [-1, 1].
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        (self.next_u32() as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Single-cycle waveform read with linear interpolation.
#[derive(Debug, Clone)]
pub struct Wavetable {
    samples: Box<[f32]>,
}

impl Wavetable {
    pub fn new(samples: Vec<f32>) -> Result<Self> {
        if samples.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "wavetable needs at least 2 samples, got {}",
                samples.len()
            )));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(Error::InvalidConfig("wavetable contains non-finite samples".into()));
        }
        Ok(Self {
            samples: samples.into_boxed_slice(),
        })
    }

    /// Build a table by sampling `f` over one cycle (`f` receives turns).
    pub fn from_fn(len: usize, f: impl Fn(f32) -> f32) -> Result<Self> {
        Self::new((0..len).map(|i| f(i as f32 / len as f32)).collect())
    }

    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        let pos = wrap_phase(phase) * len as f32;
        let index = (pos as usize).min(len - 1);
        let frac = pos - index as f32;
        let a = self.samples[index];
        let b = self.samples[(index + 1) % len];
        a + (b - a) * frac
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Maps shape ids to waveforms, and owns registered wavetables.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    shapes: [Option<Waveform>; MAX_SHAPES],
    tables: Vec<Wavetable>,
}

impl ShapeRegistry {
    /// Registry with the five built-in shapes at ids 0..=4.
    pub fn new() -> Self {
        let mut shapes = [None; MAX_SHAPES];
        shapes[SHAPE_SINE as usize] = Some(Waveform::Sine);
        shapes[SHAPE_SAW as usize] = Some(Waveform::Saw);
        shapes[SHAPE_TRIANGLE as usize] = Some(Waveform::Triangle);
        shapes[SHAPE_SQUARE as usize] = Some(Waveform::Square);
        shapes[SHAPE_NOISE as usize] = Some(Waveform::Noise);
        Self {
            shapes,
            tables: Vec::new(),
        }
    }

    pub fn register(&mut self, id: u8, waveform: Waveform) -> Result<()> {
        let slot = self
            .shapes
            .get_mut(id as usize)
            .ok_or_else(|| Error::InvalidConfig(format!("shape id {id} >= {MAX_SHAPES}")))?;
        *slot = Some(waveform);
        Ok(())
    }

    /// Store a wavetable and bind it to `id`. Returns the table index.
    pub fn register_table(&mut self, id: u8, table: Wavetable) -> Result<u8> {
        let index = u8::try_from(self.tables.len())
            .map_err(|_| Error::InvalidConfig("too many wavetables".into()))?;
        self.register(id, Waveform::Table(index))?;
        self.tables.push(table);
        tracing::debug!(id, index, len = self.tables[index as usize].len(), "registered wavetable");
        Ok(index)
    }

    /// Waveform for `id`. Unregistered ids and dangling tables play a sine.
    #[inline]
    pub fn resolve(&self, id: u8) -> Waveform {
        match self.shapes.get(id as usize).copied().flatten() {
            Some(Waveform::Table(index)) if (index as usize) >= self.tables.len() => Waveform::Sine,
            Some(waveform) => waveform,
            None => Waveform::Sine,
        }
    }

    pub fn table(&self, index: u8) -> Option<&Wavetable> {
        self.tables.get(index as usize)
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape ids travel through f32 params; round and saturate.
#[inline]
pub fn shape_id_from(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, u8::MAX as f32) as u8
}

/// Per-block inputs for [`OscillatorBlock::render`].
pub struct OscInputs<'a> {
    pub frequency: &'a [f32],
    /// Phase offset in turns, added per sample.
    pub phase_shift: Option<&'a [f32]>,
    /// Pulse width for `Square`.
    pub width: Option<&'a [f32]>,
}

/// Phase accumulator plus noise state; the waveform math for one oscillator.
#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    phase: f32,
    rng: XorShift32,
    seed: u32,
}

impl OscillatorBlock {
    pub fn new(seed: u32) -> Self {
        Self {
            phase: 0.0,
            rng: XorShift32::new(seed),
            seed,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_phase(phase);
    }

    /// Hard reset: phase back to zero, noise back to its seed.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.rng = XorShift32::new(self.seed);
    }

    pub fn render(
        &mut self,
        out: &mut [f32],
        waveform: Waveform,
        table: Option<&Wavetable>,
        inputs: &OscInputs<'_>,
        sample_rate: f32,
    ) {
        let inv_sr = 1.0 / sample_rate;

        for (i, sample) in out.iter_mut().enumerate() {
            let freq = inputs.frequency.get(i).copied().unwrap_or(0.0);
            let freq = if freq.is_finite() { freq } else { 0.0 };
            let increment = freq * inv_sr;
            let dt = increment.abs().min(0.5);

            let shift = inputs
                .phase_shift
                .and_then(|buf| buf.get(i).copied())
                .filter(|s| s.is_finite())
                .unwrap_or(0.0);
            let p = if shift == 0.0 {
                self.phase
            } else {
                wrap_phase(self.phase + shift)
            };

            *sample = match waveform {
                Waveform::Sine => (TAU * p).sin(),
                Waveform::Saw => blep_saw(p, dt),
                Waveform::Triangle => triangle(p),
                Waveform::Square => {
                    let width = inputs
                        .width
                        .and_then(|buf| buf.get(i).copied())
                        .unwrap_or(0.5);
                    blep_square(p, dt, width)
                }
                Waveform::Noise => self.rng.next_bipolar(),
                Waveform::Table(_) => match table {
                    Some(table) => table.sample(p),
                    None => (TAU * p).sin(),
                },
            };

            self.phase = wrap_phase(self.phase + increment);
        }
    }
}

impl Default for OscillatorBlock {
    fn default() -> Self {
        Self::new(0)
    }
}
