//! Benchmarks for complete voice chains.
//!
//! From a bare oscillator through filter and envelope up to a full unison
//! stack, one block per iteration.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::dsp::oscillator::{ShapeRegistry, SHAPE_SAW};
use blocksynth::graph::{Node, NodeExt, Oscillator, RenderCtx, Unison, UnisonControls, UnisonSlotParams};
use blocksynth::param::{EnvelopeParams, ModMap};
use blocksynth::synth::Voice;
use blocksynth::ParamPool;

use crate::SAMPLE_RATE;

fn envelope(params: &mut ParamPool) -> EnvelopeParams {
    EnvelopeParams {
        attack: params.simple("attack", 0.01),
        decay: params.simple("decay", 0.1),
        sustain: params.simple("sustain", 0.6),
        release: params.simple("release", 0.2),
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let shapes = ShapeRegistry::new();

    // === SIMPLE VOICE ===
    // saw → filter → envelope
    // This is a baseline for what a typical voice costs
    {
        let mut params = ParamPool::new(SAMPLE_RATE);
        let freq = params.smoothed("freq", 110.0, 0.0);
        let shape = params.constant("shape", SHAPE_SAW as f32);
        let cutoff = params.simple("cutoff", 2_500.0);
        let q = params.simple("q", 0.707);
        let stages = envelope(&mut params);
        let amp = params.envelope("amp", stages);
        let graph = Oscillator::new(freq, shape).lowpass(cutoff, q).vca(amp);
        let mut voice = Voice::new(graph, freq).with_envelope(amp);
        voice.note_on(&mut params, 45, 100);

        let mut cycle = 0;
        group.bench_function("lead", |b| {
            b.iter(|| {
                cycle += 1;
                black_box(voice.process(&mut RenderCtx::new(cycle, &mut params, &shapes)));
            })
        });
    }

    // === FILTER ENVELOPE ===
    // cutoff modulated per sample by a second envelope
    {
        let mut params = ParamPool::new(SAMPLE_RATE);
        let freq = params.smoothed("freq", 110.0, 0.0);
        let shape = params.constant("shape", SHAPE_SAW as f32);
        let stages = envelope(&mut params);
        let amp = params.envelope("amp", stages);
        let filter_env = params.envelope("filter_env", stages);
        let cutoff = params.simple("cutoff", 300.0);
        params.add_mod(cutoff, filter_env, 4_000.0, ModMap::Identity);
        let q = params.simple("q", 4.0);
        let graph = Oscillator::new(freq, shape).lowpass(cutoff, q).vca(amp);
        let mut voice = Voice::new(graph, freq)
            .with_envelope(amp)
            .with_envelope(filter_env);
        voice.note_on(&mut params, 45, 100);

        let mut cycle = 0;
        group.bench_function("filter_env", |b| {
            b.iter(|| {
                cycle += 1;
                black_box(voice.process(&mut RenderCtx::new(cycle, &mut params, &shapes)));
            })
        });
    }

    // === UNISON STACK ===
    // N detuned saws, each with its own tuner param
    for voices in [1usize, 4, 8] {
        let mut params = ParamPool::new(SAMPLE_RATE);
        let freq = params.smoothed("freq", 110.0, 0.0);
        let shape = params.constant("shape", SHAPE_SAW as f32);
        let controls = UnisonControls {
            voices: None,
            detune: params.simple("detune", 0.2),
            phase: params.simple("phase", 0.1),
            pan: params.simple("pan", 1.0),
            curve: params.simple("curve", 1.0),
        };
        let mut factory = |params: &mut ParamPool, slot: &UnisonSlotParams| {
            let pitch = params.tuner("pitch", freq, slot.detune);
            Oscillator::new(pitch, shape).with_phase_shift(slot.phase)
        };
        let mut unison = Unison::new(&mut params, voices, voices, controls, &mut factory);

        let mut cycle = 0;
        group.bench_with_input(BenchmarkId::new("unison", voices), &voices, |b, _| {
            b.iter(|| {
                cycle += 1;
                black_box(unison.process(&mut RenderCtx::new(cycle, &mut params, &shapes)));
            })
        });
    }

    group.finish();
}
