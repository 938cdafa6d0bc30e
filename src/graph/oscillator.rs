use crate::dsp::oscillator::{shape_id_from, OscInputs, OscillatorBlock, Waveform};
use crate::graph::node::{Node, RenderCtx};
use crate::param::{ParamPool, ParamRef};
use crate::{Block, CycleStamp};

/*
Audio Oscillator
================

An oscillator is the fundamental sound source in a synthesizer. It generates
a repeating waveform at a specific frequency (pitch), producing the raw
audio material that gets shaped by filters, envelopes, and effects.

Waveform Types and Their Character:
-----------------------------------

Sine: The purest tone - a single frequency with no harmonics.
Sawtooth: All harmonics, falling off as 1/n. Bright, buzzy, brassy.
Square: Odd harmonics only. Hollow, woody. Pulse width changes the mix.
Triangle: Odd harmonics falling off as 1/n². Soft, between sine and square.
Noise: Random samples - no pitch. Breath, percussion, texture.

Everything an oscillator reads is a param:

    frequency     Hz, usually a Tuner (note · detune · bend)
    shape         registry id, read once per block
    phase_shift   turns, added per sample (unison phase spread)
    width         pulse width for Square

The output is mono, written to both channels.

Example usage:
  let osc = Oscillator::new(pitch, saw_shape).with_width(width);

  // Typical subtractive voice: saw → filter → envelope
  let voice = osc.lowpass(cutoff, resonance).vca(amp_env);
*/

pub struct Oscillator {
    frequency: ParamRef,
    shape: ParamRef,
    phase_shift: Option<ParamRef>,
    width: Option<ParamRef>,
    core: OscillatorBlock,
    out: Block,
    stamp: CycleStamp,
    renders: u64,
}

impl Oscillator {
    pub fn new(frequency: ParamRef, shape: ParamRef) -> Self {
        Self {
            frequency,
            shape,
            phase_shift: None,
            width: None,
            core: OscillatorBlock::new(0),
            out: Block::new(),
            stamp: CycleStamp::new(),
            renders: 0,
        }
    }

    /// Offset the phase per sample, in turns.
    pub fn with_phase_shift(mut self, phase_shift: ParamRef) -> Self {
        self.phase_shift = Some(phase_shift);
        self
    }

    pub fn with_width(mut self, width: ParamRef) -> Self {
        self.width = Some(width);
        self
    }

    /// Noise seed. Give every noise source its own, or they play in unison.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.core = OscillatorBlock::new(seed);
        self
    }

    /// How many blocks this oscillator actually rendered.
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

impl Node for Oscillator {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        if !self.stamp.claim(ctx.cycle) {
            return &self.out;
        }
        self.renders += 1;

        let cycle = ctx.cycle;
        ctx.params.update(self.frequency, cycle);
        ctx.params.update(self.shape, cycle);
        if let Some(phase_shift) = self.phase_shift {
            ctx.params.update(phase_shift, cycle);
        }
        if let Some(width) = self.width {
            ctx.params.update(width, cycle);
        }

        let params = &*ctx.params;
        let waveform = ctx.shapes.resolve(shape_id_from(params.cached(self.shape)[0]));
        let table = match waveform {
            Waveform::Table(index) => ctx.shapes.table(index),
            _ => None,
        };
        let inputs = OscInputs {
            frequency: params.cached(self.frequency),
            phase_shift: self.phase_shift.map(|p| &params.cached(p)[..]),
            width: self.width.map(|p| &params.cached(p)[..]),
        };

        self.core
            .render(&mut self.out.left, waveform, table, &inputs, ctx.sample_rate);
        self.out.right = self.out.left;
        self.out.cycle = cycle;
        &self.out
    }

    fn reset(&mut self, _params: &mut ParamPool, hard: bool) {
        if hard {
            self.core.reset();
        }
    }
}
