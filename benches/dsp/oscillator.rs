//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::dsp::oscillator::{OscInputs, OscillatorBlock, Waveform, Wavetable};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let table = Wavetable::from_fn(2048, |phase| (std::f32::consts::TAU * phase).sin()).unwrap();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let frequency = vec![440.0f32; size];
        let width = vec![0.3f32; size];
        let inputs = OscInputs {
            frequency: &frequency,
            phase_shift: None,
            width: Some(&width),
        };

        // Sine - uses sin() transcendental function
        // Saw / Square - polyBLEP correction near each step
        // Noise - xorshift, no phase at all
        for (name, waveform) in [
            ("sine", Waveform::Sine),
            ("saw", Waveform::Saw),
            ("triangle", Waveform::Triangle),
            ("square", Waveform::Square),
            ("noise", Waveform::Noise),
        ] {
            let mut osc = OscillatorBlock::new(1);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer), waveform, None, black_box(&inputs), SAMPLE_RATE);
                })
            });
        }

        // Wavetable - linear interpolation between table points
        let mut osc = OscillatorBlock::new(1);
        group.bench_with_input(BenchmarkId::new("wavetable", size), &size, |b, _| {
            b.iter(|| {
                osc.render(
                    black_box(&mut buffer),
                    Waveform::Table(0),
                    Some(&table),
                    black_box(&inputs),
                    SAMPLE_RATE,
                );
            })
        });
    }

    group.finish();
}
