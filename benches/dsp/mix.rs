//! Benchmarks for the mixer node.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::dsp::oscillator::{ShapeRegistry, SHAPE_SAW};
use blocksynth::graph::{Mixer, Node, Oscillator, RenderCtx};
use blocksynth::ParamPool;

use crate::SAMPLE_RATE;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");
    let shapes = ShapeRegistry::new();

    for inputs in [2usize, 8, 32] {
        let mut params = ParamPool::new(SAMPLE_RATE);
        let shape = params.constant("shape", SHAPE_SAW as f32);
        let mut mixer: Mixer<Oscillator> = Mixer::with_capacity(inputs);
        for i in 0..inputs {
            let freq = params.simple("freq", 110.0 * (i + 1) as f32);
            let gain = params.smoothed("gain", 0.5, 0.01);
            let pan = params.simple("pan", -1.0 + 2.0 * i as f32 / inputs as f32);
            mixer.add_input(Oscillator::new(freq, shape), Some(gain), Some(pan));
        }

        // Every block is a new cycle, so every input renders
        let mut cycle = 0;
        group.bench_with_input(BenchmarkId::new("inputs", inputs), &inputs, |b, _| {
            b.iter(|| {
                cycle += 1;
                black_box(mixer.process(&mut RenderCtx::new(cycle, &mut params, &shapes)));
            })
        });
    }

    group.finish();
}
