#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Raw id meaning "not bound to any parameter" (e.g. an unmapped MIDI CC).
pub const NO_BINDING: u8 = 255;

/// How a registered parameter is stored in the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Storage {
    /// Read every block, no smoothing.
    Simple,
    /// Smoothed with the given time constant (seconds).
    Smoothed(f32),
    /// A setting: only changes on `set_param`, never modulated.
    Const,
}

const PARAM_SMOOTHING: f32 = 0.01;

/// Every parameter the synth exposes to presets and the control queue.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ParamId {
    Osc1Shape = 0,
    Osc1Detune,
    Osc1Gain,
    Osc1Phase,
    Osc1Width,
    Osc2Shape,
    Osc2Detune,
    Osc2Gain,
    Osc2Phase,
    Osc2Width,
    NoiseGain,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    FilterCutoff,
    FilterResonance,
    FilterEnvAmount,
    LfoRate,
    LfoPitchDepth,
    LfoCutoffDepth,
    UnisonVoices,
    UnisonDetune,
    UnisonPhaseSpread,
    UnisonPanSpread,
    UnisonCurve,
    DelayTime,
    DelayFeedback,
    DelayTone,
    DelayMix,
    VoiceStealMode,
    VoiceActiveCount,
    PitchGlide,
    MasterGain,
}

impl ParamId {
    pub const COUNT: usize = 38;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::Osc1Shape,
        ParamId::Osc1Detune,
        ParamId::Osc1Gain,
        ParamId::Osc1Phase,
        ParamId::Osc1Width,
        ParamId::Osc2Shape,
        ParamId::Osc2Detune,
        ParamId::Osc2Gain,
        ParamId::Osc2Phase,
        ParamId::Osc2Width,
        ParamId::NoiseGain,
        ParamId::AmpAttack,
        ParamId::AmpDecay,
        ParamId::AmpSustain,
        ParamId::AmpRelease,
        ParamId::FilterAttack,
        ParamId::FilterDecay,
        ParamId::FilterSustain,
        ParamId::FilterRelease,
        ParamId::FilterCutoff,
        ParamId::FilterResonance,
        ParamId::FilterEnvAmount,
        ParamId::LfoRate,
        ParamId::LfoPitchDepth,
        ParamId::LfoCutoffDepth,
        ParamId::UnisonVoices,
        ParamId::UnisonDetune,
        ParamId::UnisonPhaseSpread,
        ParamId::UnisonPanSpread,
        ParamId::UnisonCurve,
        ParamId::DelayTime,
        ParamId::DelayFeedback,
        ParamId::DelayTone,
        ParamId::DelayMix,
        ParamId::VoiceStealMode,
        ParamId::VoiceActiveCount,
        ParamId::PitchGlide,
        ParamId::MasterGain,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamId::Osc1Shape => "osc1_shape",
            ParamId::Osc1Detune => "osc1_detune",
            ParamId::Osc1Gain => "osc1_gain",
            ParamId::Osc1Phase => "osc1_phase",
            ParamId::Osc1Width => "osc1_width",
            ParamId::Osc2Shape => "osc2_shape",
            ParamId::Osc2Detune => "osc2_detune",
            ParamId::Osc2Gain => "osc2_gain",
            ParamId::Osc2Phase => "osc2_phase",
            ParamId::Osc2Width => "osc2_width",
            ParamId::NoiseGain => "noise_gain",
            ParamId::AmpAttack => "amp_attack",
            ParamId::AmpDecay => "amp_decay",
            ParamId::AmpSustain => "amp_sustain",
            ParamId::AmpRelease => "amp_release",
            ParamId::FilterAttack => "filter_attack",
            ParamId::FilterDecay => "filter_decay",
            ParamId::FilterSustain => "filter_sustain",
            ParamId::FilterRelease => "filter_release",
            ParamId::FilterCutoff => "filter_cutoff",
            ParamId::FilterResonance => "filter_resonance",
            ParamId::FilterEnvAmount => "filter_env_amount",
            ParamId::LfoRate => "lfo_rate",
            ParamId::LfoPitchDepth => "lfo_pitch_depth",
            ParamId::LfoCutoffDepth => "lfo_cutoff_depth",
            ParamId::UnisonVoices => "unison_voices",
            ParamId::UnisonDetune => "unison_detune",
            ParamId::UnisonPhaseSpread => "unison_phase_spread",
            ParamId::UnisonPanSpread => "unison_pan_spread",
            ParamId::UnisonCurve => "unison_curve",
            ParamId::DelayTime => "delay_time",
            ParamId::DelayFeedback => "delay_feedback",
            ParamId::DelayTone => "delay_tone",
            ParamId::DelayMix => "delay_mix",
            ParamId::VoiceStealMode => "voice_steal_mode",
            ParamId::VoiceActiveCount => "voice_active_count",
            ParamId::PitchGlide => "pitch_glide",
            ParamId::MasterGain => "master_gain",
        }
    }

    /// Initial value. Units: seconds for times, Hz for cutoff/rate/tone,
    /// semitones for detune and pitch depth, turns for phase.
    pub fn default_value(self) -> f32 {
        match self {
            ParamId::Osc1Shape => 1.0, // saw
            ParamId::Osc1Detune => 0.0,
            ParamId::Osc1Gain => 1.0,
            ParamId::Osc1Phase => 0.0,
            ParamId::Osc1Width => 0.5,
            ParamId::Osc2Shape => 3.0, // square
            ParamId::Osc2Detune => 0.07,
            ParamId::Osc2Gain => 0.5,
            ParamId::Osc2Phase => 0.0,
            ParamId::Osc2Width => 0.5,
            ParamId::NoiseGain => 0.0,
            ParamId::AmpAttack => 0.005,
            ParamId::AmpDecay => 0.2,
            ParamId::AmpSustain => 0.8,
            ParamId::AmpRelease => 0.3,
            ParamId::FilterAttack => 0.01,
            ParamId::FilterDecay => 0.3,
            ParamId::FilterSustain => 0.3,
            ParamId::FilterRelease => 0.4,
            ParamId::FilterCutoff => 2_000.0,
            ParamId::FilterResonance => 0.707,
            ParamId::FilterEnvAmount => 2_000.0,
            ParamId::LfoRate => 5.0,
            ParamId::LfoPitchDepth => 0.0,
            ParamId::LfoCutoffDepth => 0.0,
            ParamId::UnisonVoices => 1.0,
            ParamId::UnisonDetune => 0.15,
            ParamId::UnisonPhaseSpread => 0.0,
            ParamId::UnisonPanSpread => 0.5,
            ParamId::UnisonCurve => 1.0,
            ParamId::DelayTime => 0.3,
            ParamId::DelayFeedback => 0.35,
            ParamId::DelayTone => 4_000.0,
            ParamId::DelayMix => 0.0,
            ParamId::VoiceStealMode => 0.0, // oldest
            ParamId::VoiceActiveCount => 8.0,
            ParamId::PitchGlide => 0.0,
            ParamId::MasterGain => 0.8,
        }
    }

    pub fn storage(self) -> Storage {
        match self {
            ParamId::Osc1Shape
            | ParamId::Osc2Shape
            | ParamId::FilterEnvAmount
            | ParamId::LfoPitchDepth
            | ParamId::LfoCutoffDepth
            | ParamId::UnisonVoices
            | ParamId::VoiceStealMode
            | ParamId::VoiceActiveCount
            | ParamId::PitchGlide => Storage::Const,

            ParamId::Osc1Detune
            | ParamId::Osc1Gain
            | ParamId::Osc1Phase
            | ParamId::Osc1Width
            | ParamId::Osc2Detune
            | ParamId::Osc2Gain
            | ParamId::Osc2Phase
            | ParamId::Osc2Width
            | ParamId::NoiseGain
            | ParamId::FilterCutoff
            | ParamId::FilterResonance
            | ParamId::DelayTime
            | ParamId::DelayMix
            | ParamId::MasterGain => Storage::Smoothed(PARAM_SMOOTHING),

            _ => Storage::Simple,
        }
    }
}

impl TryFrom<u8> for ParamId {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        ParamId::ALL
            .get(raw as usize)
            .copied()
            .ok_or(Error::UnknownParamId(raw))
    }
}

impl From<ParamId> for u8 {
    fn from(id: ParamId) -> u8 {
        id as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_round_trip() {
        for (i, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ParamId::try_from(i as u8).unwrap(), *id);
            assert_eq!(u8::from(*id), i as u8);
        }
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert!(matches!(
            ParamId::try_from(ParamId::COUNT as u8),
            Err(Error::UnknownParamId(38))
        ));
        assert!(ParamId::try_from(NO_BINDING).is_err());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = ParamId::ALL.iter().map(|id| id.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ParamId::COUNT);
    }
}
