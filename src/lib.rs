pub mod block; // Fixed-size stereo blocks and cycle stamps
pub mod config;
pub mod dsp;
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io;
pub mod param; // Block-rate control signals and modulation
pub mod synth; // Voice management and polyphony

pub use block::{Block, CycleStamp};
pub use config::SynthConfig;
pub use error::{Error, Result};
pub use graph::node::{Node, RenderCtx};
pub use param::{ParamId, ParamPool, ParamRef};
pub use synth::polysynth::Polysynth;

/// Samples per channel in every [`Block`].
pub const BLOCK_SIZE: usize = 256;
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
