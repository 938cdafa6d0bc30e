//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::dsp::delay::{DelayLine, ToneFilter};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Test with different delay times (in samples)
    let delay_times: &[f32] = &[
        480.0,    // 10ms at 48kHz
        4_800.0,  // 100ms at 48kHz
        48_000.0, // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        // Generate a test signal
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 * 0.1).sin())
            .collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples / 48.0;

            // Feedback loop, fractional read
            let mut delay = DelayLine::with_seconds(2.0, SAMPLE_RATE);
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("feedback_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        for sample in buffer.iter_mut() {
                            let wet = delay.read(black_box(delay_samples + 0.5));
                            delay.write(*sample + 0.5 * wet);
                            *sample = 0.5 * (*sample + wet);
                        }
                    })
                },
            );
        }

        // Same loop with the tone filter in the feedback path
        let mut delay = DelayLine::with_seconds(2.0, SAMPLE_RATE);
        let mut tone = ToneFilter::default();
        let coef = ToneFilter::coefficient(3_000.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("feedback_tone", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for sample in buffer.iter_mut() {
                    let wet = delay.read(black_box(14_400.0));
                    delay.write(*sample + 0.6 * tone.next_sample(wet, coef));
                    *sample = 0.5 * (*sample + wet);
                }
            })
        });
    }

    group.finish();
}
