use crate::dsp::clamp_finite;
use crate::dsp::delay::{DelayLine, ToneFilter, MAX_FEEDBACK};
use crate::graph::node::{Node, RenderCtx};
use crate::param::{ParamPool, ParamRef};
use crate::{Block, CycleStamp};

/*
Feedback Delay
==============

    input ──┬──────────────────────────────(1 - mix)──┐
            │                                          +──→ out
            └──→ (+) ──→ [ delay line ] ──┬──(mix)─────┘
                  ↑                       │
                  └── feedback ←─ tone ←──┘

The tap is fed back through an optional one-pole low-pass ("tone"), so each
repeat is a little darker than the last, like tape. Feedback is capped at
0.97: with the tone filter never adding gain, the loop always decays.

All four controls are params resolved once per block and read per sample.
Time is in seconds.
*/

#[derive(Debug, Clone, Copy)]
pub struct DelayParams {
    pub time: ParamRef,
    pub feedback: ParamRef,
    pub mix: ParamRef,
    /// Cutoff (Hz) of the feedback low-pass; `None` feeds back unfiltered.
    pub tone: Option<ParamRef>,
}

pub struct FeedbackDelay<S = Box<dyn Node>> {
    source: S,
    params: DelayParams,
    lines: [DelayLine; 2],
    tones: [ToneFilter; 2],
    out: Block,
    stamp: CycleStamp,
}

impl<S: Node> FeedbackDelay<S> {
    pub fn new(source: S, params: DelayParams, max_seconds: f32, sample_rate: f32) -> Self {
        Self {
            source,
            params,
            lines: [
                DelayLine::with_seconds(max_seconds, sample_rate),
                DelayLine::with_seconds(max_seconds, sample_rate),
            ],
            tones: [ToneFilter::default(); 2],
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

impl<S: Node> Node for FeedbackDelay<S> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        if !self.stamp.claim(ctx.cycle) {
            return &self.out;
        }

        let p = self.params;
        let cycle = ctx.cycle;
        ctx.params.update(p.time, cycle);
        ctx.params.update(p.feedback, cycle);
        ctx.params.update(p.mix, cycle);
        if let Some(tone) = p.tone {
            ctx.params.update(tone, cycle);
        }

        let input = self.source.process(ctx);
        let sample_rate = ctx.sample_rate;
        let params = &*ctx.params;
        let time = params.cached(p.time);
        let feedback = params.cached(p.feedback);
        let mix = params.cached(p.mix);
        let tone = p.tone.map(|t| params.cached(t));

        let channels = [
            (&input.left, &mut self.out.left),
            (&input.right, &mut self.out.right),
        ];
        for (((dry, wet), line), tone_filter) in channels
            .into_iter()
            .zip(self.lines.iter_mut())
            .zip(self.tones.iter_mut())
        {
            for i in 0..dry.len() {
                let tap = line.read(time[i] * sample_rate);
                let fed = match tone {
                    Some(cutoff) => {
                        tone_filter.next_sample(tap, ToneFilter::coefficient(cutoff[i], sample_rate))
                    }
                    None => tap,
                };
                let amount = clamp_finite(feedback[i], 0.0, MAX_FEEDBACK);
                line.write(dry[i] + amount * fed);

                let mix = clamp_finite(mix[i], 0.0, 1.0);
                wet[i] = dry[i] * (1.0 - mix) + tap * mix;
            }
        }
        self.out.cycle = cycle;
        &self.out
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        self.source.reset(params, hard);
        if hard {
            for line in &mut self.lines {
                line.reset();
            }
            for tone in &mut self.tones {
                tone.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::ShapeRegistry;
    use crate::BLOCK_SIZE;

    /// One impulse on the first block, silence after.
    struct Impulse {
        out: Block,
        stamp: CycleStamp,
    }

    impl Node for Impulse {
        fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
            if self.stamp.claim(ctx.cycle) {
                self.out.clear();
                if ctx.cycle == 1 {
                    self.out.left[0] = 1.0;
                    self.out.right[0] = 1.0;
                }
            }
            &self.out
        }

        fn reset(&mut self, _params: &mut ParamPool, _hard: bool) {}
    }

    fn setup(time: f32, feedback: f32, mix: f32) -> (ParamPool, FeedbackDelay<Impulse>) {
        let mut params = ParamPool::new(48_000.0);
        let delay_params = DelayParams {
            time: params.simple("time", time),
            feedback: params.simple("feedback", feedback),
            mix: params.simple("mix", mix),
            tone: None,
        };
        let source = Impulse {
            out: Block::new(),
            stamp: CycleStamp::new(),
        };
        let delay = FeedbackDelay::new(source, delay_params, 1.0, 48_000.0);
        (params, delay)
    }

    #[test]
    fn test_impulse_repeats_at_delay_time() {
        // 100 samples at 48 kHz
        let (mut params, mut delay) = setup(100.0 / 48_000.0, 0.5, 1.0);
        let shapes = ShapeRegistry::new();
        let block = delay.process(&mut RenderCtx::new(1, &mut params, &shapes));

        assert_eq!(block.left[0], 0.0, "fully wet: no dry impulse");
        assert!((block.left[100] - 1.0).abs() < 1e-4);
        assert!((block.left[200] - 0.5).abs() < 1e-4);
        assert!(block.left[150].abs() < 1e-6);
    }

    #[test]
    fn test_dry_mix_passes_input() {
        let (mut params, mut delay) = setup(0.01, 0.9, 0.0);
        let shapes = ShapeRegistry::new();
        let block = delay.process(&mut RenderCtx::new(1, &mut params, &shapes));
        assert_eq!(block.left[0], 1.0);
        assert_eq!(block.left[1..].iter().fold(0.0f32, |a, &x| a.max(x.abs())), 0.0);
    }

    #[test]
    fn test_feedback_is_capped() {
        // feedback 5.0 must behave like 0.97
        let (mut params, mut delay) = setup(BLOCK_SIZE as f32 / 48_000.0 / 4.0, 5.0, 1.0);
        let shapes = ShapeRegistry::new();
        let mut peak = 0.0f32;
        for cycle in 1..=400 {
            peak = delay.process(&mut RenderCtx::new(cycle, &mut params, &shapes)).peak();
        }
        assert!(peak < 0.1, "loop must decay, peak {peak}");
    }
}
