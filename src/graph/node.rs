use crate::dsp::oscillator::ShapeRegistry;
use crate::param::ParamPool;
use crate::Block;

/// Context passed to graph nodes during rendering
///
/// Contains everything a node needs to produce its block:
/// - cycle: which block is being rendered (the memoization key)
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - params: the arena every param is resolved from
/// - shapes: waveform lookup for oscillators
pub struct RenderCtx<'a> {
    pub cycle: u64,
    pub sample_rate: f32,
    pub params: &'a mut ParamPool,
    pub shapes: &'a ShapeRegistry,
}

impl<'a> RenderCtx<'a> {
    pub fn new(cycle: u64, params: &'a mut ParamPool, shapes: &'a ShapeRegistry) -> Self {
        Self {
            cycle,
            sample_rate: params.sample_rate(),
            params,
            shapes,
        }
    }
}

/// Core trait for audio processing graph nodes
///
/// `process` renders at most once per cycle: asking again in the same cycle
/// hands back the same block without touching any state.
pub trait Node: Send {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block;

    /// Retrigger hook. `hard` clears state (phase, filter memory) for a note
    /// starting from silence; soft keeps it for legato.
    fn reset(&mut self, params: &mut ParamPool, hard: bool);
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl Node for Box<dyn Node> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        (**self).process(ctx)
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        (**self).reset(params, hard)
    }
}
