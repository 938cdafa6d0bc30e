use crate::graph::{
    delay::{DelayParams, FeedbackDelay},
    filter::LowPass,
    node::Node,
    vca::Vca,
};
use crate::param::ParamRef;

/// Fluent chaining for single-input processors:
///
/// ```ignore
/// let voice = unison.lowpass(cutoff, resonance).vca(amp_env).vca(velocity);
/// ```
pub trait NodeExt: Node + Sized {
    fn lowpass(self, cutoff: ParamRef, resonance: ParamRef) -> LowPass<Self> {
        LowPass::new(self, cutoff, resonance)
    }

    fn vca(self, gain: ParamRef) -> Vca<Self> {
        Vca::new(self, gain)
    }

    fn feedback_delay(self, params: DelayParams, max_seconds: f32, sample_rate: f32) -> FeedbackDelay<Self> {
        FeedbackDelay::new(self, params, max_seconds, sample_rate)
    }

    fn boxed(self) -> Box<dyn Node>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: Node> NodeExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::ShapeRegistry;
    use crate::graph::node::{test_nodes::Dc, RenderCtx};
    use crate::param::ParamPool;

    #[test]
    fn test_chain_renders() {
        let mut params = ParamPool::new(48_000.0);
        let shapes = ShapeRegistry::new();
        let cutoff = params.simple("cutoff", 20_000.0);
        let q = params.simple("q", 0.707);
        let half = params.constant("half", 0.5);

        let mut chain = Dc::new(1.0).lowpass(cutoff, q).vca(half).boxed();
        let mut last = 0.0;
        for cycle in 1..=4 {
            last = chain.process(&mut RenderCtx::new(cycle, &mut params, &shapes)).left[255];
        }
        assert!((last - 0.5).abs() < 1e-3);
    }
}
