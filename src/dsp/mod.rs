//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside nodes and params. They intentionally stay focused on
//! the signal-processing math so the graph layer can handle caching,
//! parameter resolution and routing.

/// Fractional delay line for feedback effects.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Table-driven exponentials for per-sample pitch and coefficient math.
pub mod fastmath;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Sub-audio oscillators used as modulation sources.
pub mod lfo;
/// Oscillator waveforms, band-limiting and noise sources.
pub mod oscillator;

pub use envelope::EnvelopeState;

/// Clamp `x` into `[lo, hi]`, mapping NaN to `lo`.
///
/// Automation can produce anything; a NaN that reaches a filter or phase
/// accumulator would poison its state forever.
#[inline]
pub fn clamp_finite(x: f32, lo: f32, hi: f32) -> f32 {
    if x.is_nan() {
        lo
    } else {
        x.clamp(lo, hi)
    }
}

/// One-pole coefficient for a time constant: `1 - exp(-1 / (time * sr))`.
///
/// Non-positive (or non-finite) times return 0.0, which callers treat as
/// "already arrived" and jump straight to their target.
#[inline]
pub fn coef_from_time(time: f32, sample_rate: f32) -> f32 {
    if !(time > 0.0) || !time.is_finite() || sample_rate <= 0.0 {
        return 0.0;
    }
    // expm1 keeps precision for long times, where the coefficient is tiny
    -(-1.0 / (time as f64 * sample_rate as f64)).exp_m1() as f32
}
