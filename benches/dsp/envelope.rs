//! Benchmarks for ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::dsp::envelope::{Adsr, AdsrTimes};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn times(attack: f32, decay: f32, sustain: f32, release: f32) -> AdsrTimes {
    AdsrTimes {
        attack,
        decay,
        sustain,
        release,
    }
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let slow = times(10.0, 0.1, 0.7, 0.3);
        let mut env = Adsr::new();
        env.note_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), slow, SAMPLE_RATE);
            })
        });

        // Sustain phase (holding steady)
        let fast = times(0.001, 0.001, 0.7, 0.3);
        let mut env = Adsr::new();
        env.note_on();
        let mut warmup = [0.0; 1024];
        env.render(&mut warmup, fast, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), fast, SAMPLE_RATE);
            })
        });

        // Release phase (ramping down), retriggered so it never goes idle
        let release = times(0.001, 0.001, 0.7, 10.0);
        let mut env = Adsr::new();
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                env.render(&mut warmup[..200], release, SAMPLE_RATE);
                env.note_off();
                env.render(black_box(&mut buffer), release, SAMPLE_RATE);
            })
        });

        // Stage times changing every block (coefficients recomputed)
        let mut env = Adsr::new();
        env.note_on();
        let mut attack = 0.5;
        group.bench_with_input(BenchmarkId::new("retimed", size), &size, |b, _| {
            b.iter(|| {
                attack = if attack > 0.5 { 0.4 } else { 0.6 };
                env.render(black_box(&mut buffer), times(attack, 0.1, 0.7, 0.3), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
