use crate::dsp::filter::{coefficients, FilterMode, SVFilter};
use crate::graph::node::{Node, RenderCtx};
use crate::param::{ParamPool, ParamRef};
use crate::{Block, CycleStamp};

/*
State-Variable Filter (SVF)
===========================

A filter removes or attenuates certain frequencies from a signal. In subtractive
synthesis, you start with a harmonically rich waveform (like a sawtooth) and
filter out frequencies to sculpt the timbre.

Parameters:
-----------

Cutoff (Hz): The frequency where the filter takes effect.
  - 200 Hz:    Muffled, like through a wall
  - 1000 Hz:   Warm, round bass
  - 5000 Hz:   Present, clear

Resonance (Q): Emphasis at the cutoff frequency.
  - 0.5:   No peak (gentle rolloff)
  - 0.707: Flattest passband (Butterworth)
  - 5+:    Strong peak (aggressive, "squelchy")

Both are params, read per sample: an envelope or LFO sweeping the cutoff
moves it every sample, not once per block. The ZDF core stays stable under
that (see `dsp/filter.rs`).

Each channel has its own integrator state. A hard reset clears both, so a
retriggered voice doesn't start with the previous note's ringing.

Example usage:
  // Envelope-controlled filter (classic synth sound)
  let voice = osc.lowpass(cutoff, resonance).vca(amp_env);
*/

pub struct LowPass<S = Box<dyn Node>> {
    source: S,
    cutoff: ParamRef,
    resonance: ParamRef,
    mode: FilterMode,
    left: SVFilter,
    right: SVFilter,
    out: Block,
    stamp: CycleStamp,
}

impl<S: Node> LowPass<S> {
    pub fn new(source: S, cutoff: ParamRef, resonance: ParamRef) -> Self {
        Self {
            source,
            cutoff,
            resonance,
            mode: FilterMode::LowPass,
            left: SVFilter::new(),
            right: SVFilter::new(),
            out: Block::new(),
            stamp: CycleStamp::new(),
        }
    }

    /// Same core, other response (high-pass, band-pass, notch).
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: Node> Node for LowPass<S> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        if !self.stamp.claim(ctx.cycle) {
            return &self.out;
        }

        ctx.params.update(self.cutoff, ctx.cycle);
        ctx.params.update(self.resonance, ctx.cycle);
        let input = self.source.process(ctx);
        let cutoff = ctx.params.cached(self.cutoff);
        let resonance = ctx.params.cached(self.resonance);

        for i in 0..input.left.len() {
            let (g, k) = coefficients(cutoff[i], resonance[i], ctx.sample_rate);
            self.out.left[i] = self.left.next_sample(input.left[i], k, g).tap(self.mode);
            self.out.right[i] = self.right.next_sample(input.right[i], k, g).tap(self.mode);
        }
        self.out.cycle = ctx.cycle;
        &self.out
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        self.source.reset(params, hard);
        if hard {
            self.left.reset();
            self.right.reset();
        }
    }
}
