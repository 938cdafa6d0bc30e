//! blocksynth - plays a short chord progression on the default output device
//!
//! Run with: cargo run --release

mod app;

use app::Demo;
use blocksynth::{ParamId, SynthConfig};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    // Cm - Ab - Eb - Bb
    let progression: [&[u8]; 4] = [
        &[48, 60, 63, 67],
        &[44, 60, 63, 68],
        &[51, 58, 63, 67],
        &[46, 58, 62, 65],
    ];

    Demo::new(SynthConfig::default())
        .param(ParamId::UnisonVoices, 3.0)
        .param(ParamId::UnisonDetune, 0.2)
        .param(ParamId::FilterCutoff, 900.0)
        .param(ParamId::FilterEnvAmount, 2_500.0)
        .param(ParamId::AmpRelease, 0.6)
        .param(ParamId::DelayMix, 0.25)
        .param(ParamId::LfoCutoffDepth, 300.0)
        .chord_seconds(1.5)
        .run(&progression, 2)
}
