//! Benchmarks for state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::dsp::filter::{coefficients, FilterMode, SVFilter};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for (name, mode) in [
            ("lowpass", FilterMode::LowPass),
            ("highpass", FilterMode::HighPass),
            ("bandpass", FilterMode::BandPass),
            ("notch", FilterMode::Notch),
        ] {
            let mut filter = SVFilter::new();
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer), mode, 1_000.0, 0.707, SAMPLE_RATE);
                })
            });
        }

        // Swept cutoff - coefficients recomputed every sample, as the graph
        // node does when an envelope drives the cutoff
        let mut filter = SVFilter::new();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("swept", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let (g, k) = coefficients(200.0 + 20.0 * i as f32, 4.0, SAMPLE_RATE);
                    *sample = filter.next_sample(black_box(*sample), k, g).lowpass;
                }
            })
        });
    }

    group.finish();
}
