//! Real-world scenario benchmarks.
//!
//! Complete voice chains and the full synth, rendered one block at a time
//! the way an audio callback drives them.

mod polysynth;
mod voices;

pub use polysynth::bench_polysynth;
pub use voices::bench_voices;
