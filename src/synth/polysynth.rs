use crate::config::SynthConfig;
use crate::dsp::fastmath;
use crate::dsp::lfo::LfoShape;
use crate::dsp::oscillator::{ShapeRegistry, SHAPE_NOISE};
use crate::graph::delay::{DelayParams, FeedbackDelay};
use crate::graph::extensions::NodeExt;
use crate::graph::mix::Mixer;
use crate::graph::node::{Node, RenderCtx};
use crate::graph::unison::{Unison, UnisonControls, UnisonSlotParams};
use crate::graph::vca::Vca;
use crate::param::{EnvelopeParams, ModMap, ParamId, ParamPool, ParamRef, Storage};
use crate::synth::message::{MessageReceiver, SynthMessage};
use crate::synth::poly::{Allocation, PolyVoice, StealMode};
use crate::synth::preset::Preset;
use crate::synth::voice::Voice;
use crate::{Block, Result};

#[cfg(feature = "rtrb")]
use crate::synth::message::{control_queue, ControlReceiver, ControlSender};

/*
Polysynth
=========

The whole instrument, built once from a `SynthConfig`:

  per unison slot (oscillator bank):
      osc1 ─┐
      osc2 ─┼─→ Mixer
      noise ┘

  per voice:
      Unison(bank × N) → LowPass → Vca(amp env) → Vca(velocity)

  root:
      PolyVoice(voices) → FeedbackDelay → Vca(master gain)

Pitch, per voice:

    note ─→ frequency (smoothed by the glide time)
              └─→ Tuner(+ pitch bend + LFO) ─→ pitch
                    └─→ Tuner(+ slot detune + osc detune) ─→ oscillator

Cutoff, per voice:

    cutoff = filter_cutoff + env_amount · filter_env + lfo_cutoff

Every ParamId maps to one param in the pool (the registry). Most are read
directly by the graph; a few are settings with a side effect when set
(steal mode, active voice count, glide time, filter env amount).

Control messages are drained at the top of `process`, so a message sent
before a block is heard in that block.
*/

/// Modulation slot of the filter envelope on each voice's cutoff param.
const FILTER_ENV_SLOT: usize = 1;
/// Largest pitch bend accepted, in semitones either way.
const MAX_BEND: f32 = 48.0;

struct VoiceParams {
    frequency: ParamRef,
    cutoff: ParamRef,
}

type Root = Vca<FeedbackDelay<PolyVoice>>;

pub struct Polysynth {
    config: SynthConfig,
    params: ParamPool,
    shapes: ShapeRegistry,
    root: Root,
    registry: [ParamRef; ParamId::COUNT],
    bend: ParamRef,
    voice_params: Vec<VoiceParams>,
    cycle: u64,
    #[cfg(feature = "rtrb")]
    controls: Option<ControlReceiver>,
}

impl Polysynth {
    pub fn new(config: SynthConfig) -> Result<Self> {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "rejected synth config");
            return Err(err);
        }
        fastmath::warm_up();

        let sample_rate = config.sample_rate;
        let mut params = ParamPool::new(sample_rate);
        let registry = build_registry(&mut params, &config);
        let reg = |id: ParamId| registry[id.index()];

        let bend = params.simple("pitch_bend", 0.0);
        let lfo_pitch = reg(ParamId::LfoPitchDepth);
        let lfo_cutoff = reg(ParamId::LfoCutoffDepth);
        let glide = params.base(reg(ParamId::PitchGlide));
        let env_amount = params.base(reg(ParamId::FilterEnvAmount));

        let amp_stages = EnvelopeParams {
            attack: reg(ParamId::AmpAttack),
            decay: reg(ParamId::AmpDecay),
            sustain: reg(ParamId::AmpSustain),
            release: reg(ParamId::AmpRelease),
        };
        let filter_stages = EnvelopeParams {
            attack: reg(ParamId::FilterAttack),
            decay: reg(ParamId::FilterDecay),
            sustain: reg(ParamId::FilterSustain),
            release: reg(ParamId::FilterRelease),
        };
        let unison_controls = UnisonControls {
            voices: Some(reg(ParamId::UnisonVoices)),
            detune: reg(ParamId::UnisonDetune),
            phase: reg(ParamId::UnisonPhaseSpread),
            pan: reg(ParamId::UnisonPanSpread),
            curve: reg(ParamId::UnisonCurve),
        };

        let mut seed: u32 = 0x9E37_79B9;
        let mut voices = Vec::with_capacity(config.polyphony);
        let mut voice_params = Vec::with_capacity(config.polyphony);

        for _ in 0..config.polyphony {
            let frequency = params.smoothed("voice_frequency", 440.0, glide);
            let pitch = params.tuner("voice_pitch", frequency, bend);
            params.add_mod(pitch, lfo_pitch, 1.0, ModMap::Identity);

            let amp_env = params.envelope("amp_env", amp_stages);
            let filter_env = params.envelope("filter_env", filter_stages);
            let velocity = params.constant("velocity", 1.0);

            let cutoff = params.simple("voice_cutoff", 0.0);
            params.add_mod(cutoff, reg(ParamId::FilterCutoff), 1.0, ModMap::Identity);
            let env_slot = params.add_mod(cutoff, filter_env, env_amount, ModMap::Identity);
            debug_assert_eq!(env_slot, FILTER_ENV_SLOT);
            params.add_mod(cutoff, lfo_cutoff, 1.0, ModMap::Identity);

            let mut bank = |params: &mut ParamPool, slot: &UnisonSlotParams| {
                seed = seed.wrapping_mul(0x0101_0101).wrapping_add(0x1234_5677);
                oscillator_bank(params, &registry, pitch, slot, seed)
            };
            let unison = Unison::new(
                &mut params,
                config.max_unison,
                config.unison_voices,
                unison_controls,
                &mut bank,
            );

            let graph = unison
                .lowpass(cutoff, reg(ParamId::FilterResonance))
                .vca(amp_env)
                .vca(velocity)
                .boxed();
            voices.push(
                Voice::new(graph, frequency)
                    .with_envelope(amp_env)
                    .with_envelope(filter_env)
                    .with_velocity(velocity),
            );
            voice_params.push(VoiceParams { frequency, cutoff });
        }

        let mut poly = PolyVoice::new(voices);
        poly.set_steal_mode(StealMode::from_value(params.base(reg(ParamId::VoiceStealMode))));
        poly.set_active_limit(params.base(reg(ParamId::VoiceActiveCount)) as usize);

        let delay = DelayParams {
            time: reg(ParamId::DelayTime),
            feedback: reg(ParamId::DelayFeedback),
            mix: reg(ParamId::DelayMix),
            tone: Some(reg(ParamId::DelayTone)),
        };
        let root = poly
            .feedback_delay(delay, config.max_delay_seconds, sample_rate)
            .vca(reg(ParamId::MasterGain));

        tracing::info!(
            sample_rate,
            polyphony = config.polyphony,
            max_unison = config.max_unison,
            params = params.len(),
            "built polysynth"
        );

        Ok(Self {
            config,
            params,
            shapes: ShapeRegistry::new(),
            root,
            registry,
            bend,
            voice_params,
            cycle: 0,
            #[cfg(feature = "rtrb")]
            controls: None,
        })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    /// Blocks rendered so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn params(&self) -> &ParamPool {
        &self.params
    }

    /// Pool param behind a registered id.
    pub fn param_ref(&self, id: ParamId) -> ParamRef {
        self.registry[id.index()]
    }

    /// Current value of a registered param.
    pub fn param(&self, id: ParamId) -> f32 {
        self.params.base(self.param_ref(id))
    }

    /// Register extra waveforms (wavetables) before playing.
    pub fn shapes_mut(&mut self) -> &mut ShapeRegistry {
        &mut self.shapes
    }

    pub fn voices(&self) -> &PolyVoice {
        self.root.source().source()
    }

    fn voices_mut(&mut self) -> &mut PolyVoice {
        self.root.source_mut().source_mut()
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> Allocation {
        let Self { root, params, .. } = self;
        root.source_mut().source_mut().note_on(params, note.min(127), velocity)
    }

    pub fn note_off(&mut self, note: u8) {
        let Self { root, params, .. } = self;
        root.source_mut().source_mut().note_off(params, note);
    }

    pub fn all_notes_off(&mut self) {
        let Self { root, params, .. } = self;
        root.source_mut().source_mut().all_notes_off(params);
    }

    /// Bend every voice by `semitones`, clamped to ±48.
    pub fn pitch_bend(&mut self, semitones: f32) {
        let semitones = crate::dsp::clamp_finite(semitones, -MAX_BEND, MAX_BEND);
        self.params.set_base(self.bend, semitones);
    }

    /// Set a registered param. Non-finite values are ignored.
    pub fn set_param(&mut self, id: ParamId, value: f32) {
        if !value.is_finite() {
            return;
        }
        self.params.set_base(self.param_ref(id), value);

        match id {
            ParamId::FilterEnvAmount => {
                for voice in &self.voice_params {
                    if let Ok(mods) = self.params.try_mod_inputs(voice.cutoff) {
                        mods.set_amount(FILTER_ENV_SLOT, value);
                    }
                }
            }
            ParamId::PitchGlide => {
                for voice in &self.voice_params {
                    self.params.set_smoothing(voice.frequency, value.max(0.0));
                }
            }
            ParamId::VoiceStealMode => {
                self.voices_mut().set_steal_mode(StealMode::from_value(value));
            }
            ParamId::VoiceActiveCount => {
                let limit = value.round().max(1.0) as usize;
                self.voices_mut().set_active_limit(limit);
            }
            _ => {}
        }
    }

    /// Every registered param's current value.
    pub fn get_preset(&self) -> Preset {
        ParamId::ALL.iter().map(|&id| (id, self.param(id))).collect()
    }

    pub fn load_preset(&mut self, preset: &Preset) {
        tracing::debug!(params = preset.len(), "loading preset");
        for (id, value) in preset.iter() {
            self.set_param(id, value);
        }
    }

    /// Apply one control message.
    pub fn handle(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn { note, velocity: 0 } => self.note_off(note),
            SynthMessage::NoteOn { note, velocity } => {
                self.note_on(note, velocity);
            }
            SynthMessage::NoteOff { note } => self.note_off(note),
            SynthMessage::ParamUpdate { id, value } => self.set_param(id, value),
            SynthMessage::PitchBend { semitones } => self.pitch_bend(semitones),
            SynthMessage::AllNotesOff => self.all_notes_off(),
        }
    }

    /// Apply up to `max_messages_per_block` messages from `receiver`.
    /// Returns how many were applied.
    pub fn drain<R: MessageReceiver + ?Sized>(&mut self, receiver: &mut R) -> usize {
        let mut applied = 0;
        while applied < self.config.max_messages_per_block {
            let Some(message) = receiver.pop() else {
                break;
            };
            self.handle(message);
            applied += 1;
        }
        applied
    }

    /// Create the control queue; `process` drains it from now on.
    /// Replaces any previous queue.
    #[cfg(feature = "rtrb")]
    pub fn control_sender(&mut self) -> ControlSender {
        let (sender, receiver) = control_queue(self.config.queue_capacity);
        self.controls = Some(receiver);
        sender
    }

    #[cfg(feature = "rtrb")]
    fn drain_controls(&mut self) {
        if let Some(mut receiver) = self.controls.take() {
            self.drain(&mut receiver);
            self.controls = Some(receiver);
        }
    }

    #[cfg(not(feature = "rtrb"))]
    fn drain_controls(&mut self) {}

    /// Render the next block into `out`.
    pub fn process(&mut self, out: &mut Block) {
        self.drain_controls();
        self.cycle += 1;

        let Self {
            params,
            shapes,
            root,
            cycle,
            ..
        } = self;
        let block = root.process(&mut RenderCtx::new(*cycle, params, shapes));
        out.copy_from(block);
    }
}

/// One param per id, stored the way the id asks for.
fn build_registry(params: &mut ParamPool, config: &SynthConfig) -> [ParamRef; ParamId::COUNT] {
    let mut registry = [ParamRef::from_index(0); ParamId::COUNT];
    for id in ParamId::ALL {
        let value = match id {
            ParamId::UnisonVoices => config.unison_voices as f32,
            ParamId::VoiceActiveCount => config.polyphony as f32,
            _ => id.default_value(),
        };
        registry[id.index()] = match (id, id.storage()) {
            // the LFO depth ids are the LFO outputs: their base is the depth
            (ParamId::LfoPitchDepth | ParamId::LfoCutoffDepth, _) => {
                let rate = registry[ParamId::LfoRate.index()];
                params.lfo(id.name(), LfoShape::Sine, rate, value)
            }
            (_, Storage::Simple) => params.simple(id.name(), value),
            (_, Storage::Smoothed(time)) => params.smoothed(id.name(), value, time),
            (_, Storage::Const) => params.constant(id.name(), value),
        };
    }
    registry
}

/// osc1 + osc2 + noise for one unison slot.
fn oscillator_bank(
    params: &mut ParamPool,
    registry: &[ParamRef; ParamId::COUNT],
    pitch: ParamRef,
    slot: &UnisonSlotParams,
    seed: u32,
) -> Box<dyn Node> {
    let reg = |id: ParamId| registry[id.index()];
    let mut bank: Mixer<Box<dyn Node>> = Mixer::with_capacity(3);

    let oscillators = [
        (ParamId::Osc1Shape, ParamId::Osc1Detune, ParamId::Osc1Phase, ParamId::Osc1Width, ParamId::Osc1Gain),
        (ParamId::Osc2Shape, ParamId::Osc2Detune, ParamId::Osc2Phase, ParamId::Osc2Width, ParamId::Osc2Gain),
    ];
    for (n, (shape, detune, phase, width, gain)) in oscillators.into_iter().enumerate() {
        let frequency = params.tuner("osc_frequency", pitch, slot.detune);
        params.add_mod(frequency, reg(detune), 1.0, ModMap::Identity);

        let phase_shift = params.simple("osc_phase", 0.0);
        params.add_mod(phase_shift, slot.phase, 1.0, ModMap::Identity);
        params.add_mod(phase_shift, reg(phase), 1.0, ModMap::Identity);

        let osc = crate::graph::oscillator::Oscillator::new(frequency, reg(shape))
            .with_phase_shift(phase_shift)
            .with_width(reg(width))
            .with_seed(seed.wrapping_add(n as u32));
        bank.add_input(osc.boxed(), Some(reg(gain)), None);
    }

    let noise_shape = params.constant("noise_shape", SHAPE_NOISE as f32);
    let noise = crate::graph::oscillator::Oscillator::new(pitch, noise_shape).with_seed(seed ^ 0xA5A5_A5A5);
    bank.add_input(noise.boxed(), Some(reg(ParamId::NoiseGain)), None);

    bank.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::voice::VoiceState;

    fn synth() -> Polysynth {
        Polysynth::new(SynthConfig {
            polyphony: 4,
            max_unison: 3,
            ..SynthConfig::default()
        })
        .unwrap()
    }

    fn render(synth: &mut Polysynth, blocks: usize) -> f32 {
        let mut out = Block::new();
        let mut peak: f32 = 0.0;
        for _ in 0..blocks {
            synth.process(&mut out);
            peak = peak.max(out.peak());
        }
        peak
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad = SynthConfig {
            polyphony: 0,
            ..SynthConfig::default()
        };
        assert!(matches!(Polysynth::new(bad), Err(crate::Error::InvalidConfig(_))));
    }

    #[test]
    fn test_silent_until_note() {
        let mut synth = synth();
        assert_eq!(render(&mut synth, 4), 0.0);

        synth.note_on(60, 100);
        assert!(render(&mut synth, 8) > 0.01);
        assert_eq!(synth.cycle(), 12);
    }

    #[test]
    fn test_note_off_decays_to_silence() {
        let mut synth = synth();
        synth.set_param(ParamId::AmpRelease, 0.01);
        synth.set_param(ParamId::FilterRelease, 0.01);
        synth.note_on(60, 100);
        render(&mut synth, 8);
        synth.note_off(60);
        render(&mut synth, 20);
        assert_eq!(synth.voices().slot_state(0), VoiceState::Free);
    }

    #[test]
    fn test_registry_uses_config() {
        let synth = synth();
        assert_eq!(synth.param(ParamId::VoiceActiveCount), 4.0);
        assert_eq!(synth.param(ParamId::UnisonVoices), 1.0);
        assert_eq!(synth.param(ParamId::FilterCutoff), ParamId::FilterCutoff.default_value());
    }

    #[test]
    fn test_side_effect_params() {
        let mut synth = synth();
        synth.set_param(ParamId::VoiceStealMode, 2.0);
        assert_eq!(synth.voices().steal_mode(), StealMode::NoSteal);

        synth.set_param(ParamId::VoiceActiveCount, 1.0);
        assert_eq!(synth.voices().active_limit(), 1);

        synth.set_param(ParamId::FilterEnvAmount, 500.0);
        let cutoff = synth.voice_params[0].cutoff;
        let mods = synth.params.try_mod_inputs(cutoff).unwrap();
        assert_eq!(mods.get(FILTER_ENV_SLOT).unwrap().amount, 500.0);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut synth = synth();
        synth.set_param(ParamId::FilterCutoff, f32::NAN);
        assert_eq!(synth.param(ParamId::FilterCutoff), ParamId::FilterCutoff.default_value());

        synth.note_on(60, 100);
        synth.set_param(ParamId::FilterResonance, 1_000.0);
        synth.pitch_bend(f32::INFINITY);
        let mut out = Block::new();
        for _ in 0..16 {
            synth.process(&mut out);
            assert!(out.left.iter().chain(&out.right).all(|x| x.is_finite()));
        }
    }

    #[test]
    fn test_velocity_zero_is_note_off() {
        let mut synth = synth();
        synth.handle(SynthMessage::NoteOn { note: 64, velocity: 100 });
        assert_eq!(synth.voices().slot_of(64), Some(0));
        synth.handle(SynthMessage::NoteOn { note: 64, velocity: 0 });
        assert_eq!(synth.voices().slot_state(0), VoiceState::Releasing);
    }

    #[test]
    fn test_drain_is_capped() {
        struct Endless;
        impl MessageReceiver for Endless {
            fn pop(&mut self) -> Option<SynthMessage> {
                Some(SynthMessage::PitchBend { semitones: 1.0 })
            }
        }

        let mut synth = Polysynth::new(SynthConfig {
            max_messages_per_block: 5,
            ..SynthConfig::default()
        })
        .unwrap();
        assert_eq!(synth.drain(&mut Endless), 5);
    }
}
