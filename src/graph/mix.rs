use crate::dsp::clamp_finite;
use crate::graph::node::{Node, RenderCtx};
use crate::param::{ParamPool, ParamRef};
use crate::{Block, CycleStamp};

/*
Parallel Signal Mixing
======================

The Mixer sums any number of inputs, each with its own gain and pan param.

How it works:
1. Zero the accumulators
2. For every input that is unmuted and has a source:
     pull its block, then add  sample × gain × pan_gain  to each channel
3. Apply the master gain (if any), then the soft clip (if enabled)

Pan Law:
--------
This implementation uses a LINEAR pan law:

    left  = 1 - 0.5·(pan + 1)
    right = 0.5·(pan + 1)

  - pan = -1.0 → 100% left
  - pan =  0.0 → 50% / 50%
  - pan = +1.0 → 100% right
  - Pro: left + right always sums to 1, so a mono fold-down stays flat
  - Con: a centered source is 6 dB quieter per side than a hard-panned one

A missing gain means unity; a missing pan means center.

Soft Clip:
----------
    y = x / (1 + |x|)

Never exceeds ±1, smooth everywhere. Off by default: it colours quiet
signals too.

Muting:
-------
A muted input is not pulled at all. That's how the voice pool keeps idle
voices from costing anything: they are muted, so their whole subgraph
sleeps until the next note.

The mixer is generic over its input type, so the owner keeps typed access
to the inputs (the voice pool needs its `Voice`s, not `dyn Node`s).
*/

pub struct MixerInput<N = Box<dyn Node>> {
    pub source: Option<N>,
    pub gain: Option<ParamRef>,
    pub pan: Option<ParamRef>,
    pub muted: bool,
}

impl<N> MixerInput<N> {
    pub fn new(source: N) -> Self {
        Self {
            source: Some(source),
            gain: None,
            pan: None,
            muted: false,
        }
    }
}

pub struct Mixer<N = Box<dyn Node>> {
    inputs: Vec<MixerInput<N>>,
    master: Option<ParamRef>,
    soft_clip: bool,
    out: Block,
    stamp: CycleStamp,
}

impl<N: Node> Mixer<N> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inputs: Vec::with_capacity(capacity),
            master: None,
            soft_clip: false,
            out: Block::new(),
            stamp: CycleStamp::new(),
        }
    }

    pub fn with_master(mut self, master: ParamRef) -> Self {
        self.master = Some(master);
        self
    }

    pub fn with_soft_clip(mut self, soft_clip: bool) -> Self {
        self.soft_clip = soft_clip;
        self
    }

    /// Append an input; returns its index.
    pub fn add_input(&mut self, source: N, gain: Option<ParamRef>, pan: Option<ParamRef>) -> usize {
        self.push(MixerInput {
            source: Some(source),
            gain,
            pan,
            muted: false,
        })
    }

    pub fn push(&mut self, input: MixerInput<N>) -> usize {
        self.inputs.push(input);
        self.inputs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn input(&self, index: usize) -> Option<&MixerInput<N>> {
        self.inputs.get(index)
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut MixerInput<N>> {
        self.inputs.get_mut(index)
    }

    pub fn inputs(&self) -> &[MixerInput<N>] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut [MixerInput<N>] {
        &mut self.inputs
    }

    pub fn set_muted(&mut self, index: usize, muted: bool) {
        if let Some(input) = self.inputs.get_mut(index) {
            input.muted = muted;
        }
    }

    pub fn master(&self) -> Option<ParamRef> {
        self.master
    }
}

impl<N: Node> Default for Mixer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Node for Mixer<N> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        if !self.stamp.claim(ctx.cycle) {
            return &self.out;
        }
        let cycle = ctx.cycle;
        self.out.clear();

        for input in self.inputs.iter_mut() {
            if input.muted {
                continue;
            }
            let Some(source) = input.source.as_mut() else {
                continue;
            };
            if let Some(gain) = input.gain {
                ctx.params.update(gain, cycle);
            }
            if let Some(pan) = input.pan {
                ctx.params.update(pan, cycle);
            }

            let block = source.process(ctx);
            let params = &*ctx.params;
            let gain = input.gain.map(|g| params.cached(g));
            let pan = input.pan.map(|p| params.cached(p));

            for i in 0..block.left.len() {
                let g = gain.map_or(1.0, |g| g[i]);
                let p = pan.map_or(0.0, |p| clamp_finite(p[i], -1.0, 1.0));
                let right_gain = 0.5 * (p + 1.0);
                let left_gain = 1.0 - right_gain;
                self.out.left[i] += block.left[i] * g * left_gain;
                self.out.right[i] += block.right[i] * g * right_gain;
            }
        }

        if let Some(master) = self.master {
            let master = ctx.params.resolve(master, cycle);
            for i in 0..master.len() {
                self.out.left[i] *= master[i];
                self.out.right[i] *= master[i];
            }
        }

        if self.soft_clip {
            for x in self.out.left.iter_mut().chain(self.out.right.iter_mut()) {
                *x /= 1.0 + x.abs();
            }
        }

        self.out.cycle = cycle;
        &self.out
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        for input in self.inputs.iter_mut() {
            if let Some(source) = input.source.as_mut() {
                source.reset(params, hard);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::ShapeRegistry;
    use crate::graph::node::test_nodes::Dc;

    fn render(mixer: &mut Mixer<Dc>, params: &mut ParamPool, cycle: u64) -> Block {
        let shapes = ShapeRegistry::new();
        mixer.process(&mut RenderCtx::new(cycle, params, &shapes)).clone()
    }

    #[test]
    fn test_three_centered_inputs_sum() {
        let mut params = ParamPool::new(48_000.0);
        let mut mixer = Mixer::new();
        for _ in 0..3 {
            mixer.add_input(Dc::new(1.0), None, None);
        }
        let block = render(&mut mixer, &mut params, 1);
        assert!(block.left.iter().all(|&x| x == 1.5));
        assert!(block.right.iter().all(|&x| x == 1.5));
    }

    #[test]
    fn test_pan_law() {
        let mut params = ParamPool::new(48_000.0);
        let hard_left = params.simple("pan", -1.0);
        let quarter = params.simple("pan", 0.5);
        let mut mixer = Mixer::new();
        mixer.add_input(Dc::new(1.0), None, Some(hard_left));
        let block = render(&mut mixer, &mut params, 1);
        assert_eq!((block.left[0], block.right[0]), (1.0, 0.0));

        let mut mixer = Mixer::new();
        mixer.add_input(Dc::new(1.0), None, Some(quarter));
        let block = render(&mut mixer, &mut params, 2);
        assert_eq!((block.left[0], block.right[0]), (0.25, 0.75));
    }

    #[test]
    fn test_muted_inputs_are_not_rendered() {
        let mut params = ParamPool::new(48_000.0);
        let gain = params.simple("gain", 2.0);
        let mut mixer = Mixer::new();
        mixer.add_input(Dc::new(1.0), Some(gain), None);
        mixer.add_input(Dc::new(1.0), None, None);
        mixer.set_muted(1, true);

        let block = render(&mut mixer, &mut params, 1);
        assert_eq!(block.left[0], 1.0);
        let muted = mixer.input(1).and_then(|i| i.source.as_ref()).unwrap();
        assert_eq!(muted.renders, 0);
    }

    #[test]
    fn test_master_and_soft_clip() {
        let mut params = ParamPool::new(48_000.0);
        let master = params.constant("master", 4.0);
        let mut mixer = Mixer::new().with_master(master).with_soft_clip(true);
        mixer.add_input(Dc::new(1.0), None, None);

        // 1.0 centered → 0.5, ×4 → 2.0, clipped → 2/3
        let block = render(&mut mixer, &mut params, 1);
        assert!((block.left[0] - 2.0 / 3.0).abs() < 1e-6);
        assert!(block.peak() < 1.0);
    }

    #[test]
    fn test_memoized_per_cycle() {
        let mut params = ParamPool::new(48_000.0);
        let mut mixer = Mixer::new();
        mixer.add_input(Dc::new(1.0), None, None);
        render(&mut mixer, &mut params, 5);
        render(&mut mixer, &mut params, 5);
        assert_eq!(mixer.input(0).and_then(|i| i.source.as_ref()).unwrap().renders, 1);
    }
}
