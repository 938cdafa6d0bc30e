//! Benchmarks for the full synth: every voice, the delay and master gain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use blocksynth::{Block, ParamId, Polysynth, SynthConfig};

pub fn bench_polysynth(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/polysynth");

    for notes in [1u8, 4, 8] {
        for unison in [1.0, 4.0] {
            let mut synth = Polysynth::new(SynthConfig::default()).unwrap();
            synth.set_param(ParamId::UnisonVoices, unison);
            synth.set_param(ParamId::DelayMix, 0.3);
            synth.set_param(ParamId::AmpRelease, 10.0);
            for note in 0..notes {
                synth.note_on(48 + 3 * note, 100);
            }
            let mut out = Block::new();

            let id = format!("{notes}notes_{unison}unison");
            group.bench_with_input(BenchmarkId::new("block", id), &notes, |b, _| {
                b.iter(|| {
                    synth.process(black_box(&mut out));
                })
            });
        }
    }

    group.finish();
}
