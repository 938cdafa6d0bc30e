use approx::assert_relative_eq;
use blocksynth::dsp::filter::{coefficients, SVFilter};
use blocksynth::dsp::oscillator::{ShapeRegistry, XorShift32};
use blocksynth::graph::{DelayParams, FeedbackDelay, Node, RenderCtx};
use blocksynth::synth::{Allocation, Preset, StealMode, SynthMessage, VoiceState};
use blocksynth::{Block, ParamId, ParamPool, Polysynth, SynthConfig, BLOCK_SIZE};
use proptest::prelude::*;

fn synth(polyphony: usize) -> Polysynth {
    Polysynth::new(SynthConfig {
        polyphony,
        max_unison: 2,
        ..SynthConfig::default()
    })
    .unwrap()
}

#[test]
fn oldest_note_is_stolen() {
    let mut synth = synth(4);
    for key in [60, 62, 64, 65] {
        assert!(matches!(synth.note_on(key, 100), Allocation::Claimed(_)));
    }
    let slot = synth.voices().slot_of(60).unwrap();

    let outcome = synth.note_on(67, 100);
    assert_eq!(
        outcome,
        Allocation::Stolen {
            slot,
            previous: Some(60)
        }
    );
    assert_eq!(synth.voices().slot_key(slot), Some(67));
    assert_eq!(synth.voices().assigned_count(), 4);
    for key in [62, 64, 65, 67] {
        assert!(synth.voices().slot_of(key).is_some());
    }
}

#[test]
fn mono_mode_reuses_one_slot() {
    let mut synth = synth(4);
    synth.set_param(ParamId::VoiceActiveCount, 1.0);
    synth.set_param(ParamId::PitchGlide, 0.05);
    synth.note_on(60, 100);
    let outcome = synth.note_on(67, 100);
    assert_eq!(outcome.slot(), Some(0));
    assert_eq!(synth.voices().assigned_count(), 1);
}

#[test]
fn no_steal_drops_excess_notes() {
    let mut synth = synth(2);
    synth.set_param(ParamId::VoiceStealMode, 2.0);
    synth.note_on(60, 100);
    synth.note_on(64, 100);
    assert_eq!(synth.note_on(67, 100), Allocation::Dropped);
    assert_eq!(synth.voices().slot_of(67), None);
}

#[test]
fn queued_messages_apply_to_the_next_block() {
    let mut synth = synth(4);
    let mut controls = synth.control_sender();
    let mut out = Block::new();

    assert!(controls.try_send(SynthMessage::NoteOn { note: 60, velocity: 110 }));
    assert!(controls.try_send(SynthMessage::ParamUpdate {
        id: ParamId::MasterGain,
        value: 0.5,
    }));
    synth.process(&mut out);
    assert_eq!(synth.voices().slot_of(60), Some(0));
    assert_eq!(synth.param(ParamId::MasterGain), 0.5);

    controls.try_send(SynthMessage::AllNotesOff);
    synth.process(&mut out);
    assert_eq!(synth.voices().slot_state(0), VoiceState::Releasing);
    assert_eq!(controls.dropped(), 0);
}

#[test]
fn shared_params_resolve_once_per_block() {
    let mut synth = synth(4);
    for key in [60, 64, 67] {
        synth.note_on(key, 100);
    }
    let cutoff = synth.param_ref(ParamId::FilterCutoff);
    let lfo = synth.param_ref(ParamId::LfoPitchDepth);
    let mut out = Block::new();

    synth.process(&mut out);
    let cutoff_before = synth.params().computations(cutoff);
    let lfo_before = synth.params().computations(lfo);
    for _ in 0..10 {
        synth.process(&mut out);
    }
    // three voices read them, each block computes them once
    assert_eq!(synth.params().computations(cutoff) - cutoff_before, 10);
    assert_eq!(synth.params().computations(lfo) - lfo_before, 10);
}

#[test]
fn preset_round_trip() {
    let mut source = synth(4);
    let changes = [
        (ParamId::Osc1Shape, 2.0),
        (ParamId::FilterCutoff, 750.0),
        (ParamId::FilterEnvAmount, 3_200.0),
        (ParamId::UnisonVoices, 2.0),
        (ParamId::VoiceStealMode, 1.0),
        (ParamId::VoiceActiveCount, 3.0),
        (ParamId::LfoCutoffDepth, 120.0),
        (ParamId::DelayMix, 0.4),
    ];
    for (id, value) in changes {
        source.set_param(id, value);
    }

    let preset = source.get_preset();
    assert_eq!(preset.len(), ParamId::COUNT);

    let mut target = synth(4);
    target.load_preset(&preset);
    assert_eq!(target.get_preset(), preset);
    assert_eq!(target.voices().steal_mode(), StealMode::Quietest);
    assert_eq!(target.voices().active_limit(), 3);

    let raw = Preset::from_raw(preset.to_raw()).unwrap();
    assert_eq!(raw, preset);
    for (id, value) in changes {
        assert_relative_eq!(raw.get(id).unwrap(), value);
    }
}

#[test]
fn output_stays_finite_under_extreme_settings() {
    let mut synth = synth(4);
    synth.set_param(ParamId::FilterResonance, 50.0);
    synth.set_param(ParamId::FilterCutoff, 1e9);
    synth.set_param(ParamId::DelayFeedback, 4.0);
    synth.set_param(ParamId::DelayMix, 1.0);
    synth.set_param(ParamId::DelayTime, -3.0);
    synth.set_param(ParamId::Osc1Width, 7.0);
    synth.set_param(ParamId::UnisonCurve, 0.0);
    synth.set_param(ParamId::LfoRate, 1e6);
    synth.set_param(ParamId::LfoPitchDepth, 3.0);
    for key in [36, 60, 96, 127] {
        synth.note_on(key, 127);
    }

    let mut out = Block::new();
    for _ in 0..200 {
        synth.process(&mut out);
        assert!(out.left.iter().chain(&out.right).all(|x| x.is_finite()));
    }
}

/// One impulse on the first block, silence after.
struct Impulse {
    out: Block,
}

impl Node for Impulse {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        self.out.clear();
        if ctx.cycle == 1 {
            self.out.left[0] = 1.0;
            self.out.right[0] = 1.0;
        }
        &self.out
    }

    fn reset(&mut self, _params: &mut ParamPool, _hard: bool) {}
}

#[test]
fn delay_energy_decays() {
    let mut params = ParamPool::new(48_000.0);
    let shapes = ShapeRegistry::new();
    let delay = DelayParams {
        time: params.simple("time", 0.01),
        feedback: params.simple("feedback", 5.0), // capped at 0.97
        mix: params.simple("mix", 1.0),
        tone: None,
    };
    let mut node = FeedbackDelay::new(Impulse { out: Block::new() }, delay, 0.1, 48_000.0);

    let blocks = 100_000 / BLOCK_SIZE as u64 + 1;
    let mut energies = Vec::new();
    for cycle in 1..=blocks {
        let block = node.process(&mut RenderCtx::new(cycle, &mut params, &shapes));
        assert!(block.peak() <= 1.0 + 1e-6);
        energies.push(block.left.iter().map(|x| x * x).sum::<f32>());
    }
    let early: f32 = energies[..20].iter().sum();
    let late: f32 = energies[energies.len() - 20..].iter().sum();
    assert!(early > 0.0);
    assert!(late < 0.01 * early, "late {late}, early {early}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn voice_pool_never_exceeds_capacity(
        events in prop::collection::vec((any::<bool>(), 48u8..72, 0u8..4), 1..120),
    ) {
        let mut synth = synth(4);
        let mut out = Block::new();
        for (on, key, render) in events {
            if on {
                synth.note_on(key, 100);
            } else {
                synth.note_off(key);
            }
            for _ in 0..render {
                synth.process(&mut out);
            }

            let pool = synth.voices();
            prop_assert!(pool.assigned_count() <= pool.capacity());
            let mut keys: Vec<u8> = (0..pool.capacity()).filter_map(|s| pool.slot_key(s)).collect();
            let assigned = keys.len();
            keys.sort_unstable();
            keys.dedup();
            prop_assert_eq!(keys.len(), assigned, "a key is held by two slots");
        }
    }

    #[test]
    fn filter_is_stable_under_modulation(
        settings in prop::collection::vec((-1_000.0f32..1e6, 0.0f32..100.0), 8..32),
        seed in 1u32..u32::MAX,
    ) {
        let mut filter = SVFilter::new();
        let mut noise = XorShift32::new(seed);
        let per_setting = 10_000 / settings.len() + 1;
        let mut count = 0;
        for &(cutoff, q) in &settings {
            let (g, k) = coefficients(cutoff, q, 48_000.0);
            for _ in 0..per_setting {
                let out = filter.next_sample(noise.next_bipolar(), k, g);
                prop_assert!(out.lowpass.is_finite() && out.lowpass.abs() < 1_000.0);
                prop_assert!(out.bandpass.is_finite() && out.highpass.is_finite());
                count += 1;
            }
        }
        prop_assert!(count >= 10_000);
    }
}
