use crate::graph::node::{Node, RenderCtx};
use crate::param::{ParamPool, ParamRef};
use crate::{Block, CycleStamp};

/// Voltage-controlled amplifier: multiplies the source by a gain param,
/// per sample. Driven by an envelope it shapes a note; driven by a const it
/// is a plain level control.
pub struct Vca<S = Box<dyn Node>> {
    source: S,
    gain: ParamRef,
    out: Block,
    stamp: CycleStamp,
}

impl<S: Node> Vca<S> {
    pub fn new(source: S, gain: ParamRef) -> Self {
        Self {
            source,
            gain,
            out: Block::new(),
            stamp: CycleStamp::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: Node> Node for Vca<S> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        if !self.stamp.claim(ctx.cycle) {
            return &self.out;
        }

        ctx.params.update(self.gain, ctx.cycle);
        let input = self.source.process(ctx);
        let gain = ctx.params.cached(self.gain);

        for ((out, &x), &g) in self.out.left.iter_mut().zip(&input.left).zip(gain) {
            *out = x * g;
        }
        for ((out, &x), &g) in self.out.right.iter_mut().zip(&input.right).zip(gain) {
            *out = x * g;
        }
        self.out.cycle = ctx.cycle;
        &self.out
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        self.source.reset(params, hard);
    }
}
