//! Error types for blocksynth.

use thiserror::Error;

/// Result type alias for blocksynth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving the synth.
///
/// Everything here is either a configuration problem caught before the
/// audio thread starts, or a misuse of the graph-building API. Out-of-range
/// automation is never an error; it is clamped where it is used.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The param does not accept modulation inputs (const, envelope).
    #[error("param `{name}` does not accept modulation inputs")]
    NotModulatable { name: &'static str },

    /// Every modulation slot of the param is taken.
    #[error("param `{name}` has no free modulation slot")]
    ModInputsFull { name: &'static str },

    /// A gate event was sent to a param that is not an envelope.
    #[error("param `{name}` is not an envelope")]
    NotAnEnvelope { name: &'static str },

    /// Raw parameter id outside the registered id space.
    #[error("unknown parameter id {0}")]
    UnknownParamId(u8),

    /// Named preset lookup failed.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}
