use crate::graph::mix::Mixer;
use crate::graph::node::{Node, RenderCtx};
use crate::param::{ParamPool, ParamRef};
use crate::synth::factory::VoiceFactory;
use crate::{Block, CycleStamp};

/*
Unison
======

Stack N copies of a sound, each slightly detuned, phase-shifted and panned,
for the "supersaw" width. Every copy (slot) sits at a position on a line:

    N = 1     x:           0
    N = 3     x:   -1      0      +1
    N = 4     x:   -1   -1/3  +1/3   +1

and gets

    detune = warp(x) · detune_spread     (semitones)
    phase  = warp(x) · phase_spread      (turns)
    pan    = warp(x) · pan_spread

where warp is a signed power curve:

    centered_power(x, γ) = sign(x) · |x|^γ

    γ = 1   linear spread
    γ > 1   slots bunch towards the center (thick core, few outliers)
    γ < 1   slots pushed to the edges (wide, hollow)

The mix is scaled by 1/√N so more voices don't get louder, only wider
(uncorrelated detuned copies add in power, not amplitude).

Slots are built up front for the largest N, so changing the count never
allocates. A count change is held back until the next `reset`, i.e. the
next note, so a ringing note never loses half its stack mid-release.
*/

/// Time constant for per-slot phase/detune changes.
pub const UNISON_SMOOTHING: f32 = 0.02;

/// Shared spread controls, read once per block.
#[derive(Debug, Clone, Copy)]
pub struct UnisonControls {
    /// Voice count; changes are deferred to the next reset.
    pub voices: Option<ParamRef>,
    pub detune: ParamRef,
    pub phase: ParamRef,
    pub pan: ParamRef,
    pub curve: ParamRef,
}

/// What a factory gets to build one unison slot.
#[derive(Debug, Clone, Copy)]
pub struct UnisonSlotParams {
    pub index: usize,
    /// Phase offset in turns (smoothed).
    pub phase: ParamRef,
    /// Detune in semitones (smoothed).
    pub detune: ParamRef,
}

/// Signed power-law warp of a position in [-1, 1].
#[inline]
pub fn centered_power(x: f32, gamma: f32) -> f32 {
    if x == 0.0 {
        return 0.0;
    }
    x.signum() * x.abs().powf(gamma)
}

/// Position of slot `index` among `voices`, in [-1, 1].
#[inline]
pub fn slot_position(index: usize, voices: usize) -> f32 {
    if voices <= 1 {
        0.0
    } else {
        -1.0 + 2.0 * index as f32 / (voices - 1) as f32
    }
}

struct UnisonSlot {
    params: UnisonSlotParams,
    pan: ParamRef,
    position: f32,
}

pub struct Unison<N = Box<dyn Node>> {
    mixer: Mixer<N>,
    slots: Vec<UnisonSlot>,
    controls: UnisonControls,
    gain: ParamRef,
    active: usize,
    pending: Option<usize>,
    stamp: CycleStamp,
}

impl<N: Node> Unison<N> {
    /// Build `max_voices` slots through `factory`, with `voices` active.
    pub fn new<F>(
        params: &mut ParamPool,
        max_voices: usize,
        voices: usize,
        controls: UnisonControls,
        factory: &mut F,
    ) -> Self
    where
        F: VoiceFactory<N> + ?Sized,
    {
        let max_voices = max_voices.max(1);
        let gain = params.constant("unison_gain", 1.0);
        let mut mixer = Mixer::with_capacity(max_voices).with_master(gain);
        let mut slots = Vec::with_capacity(max_voices);

        for index in 0..max_voices {
            let slot = UnisonSlotParams {
                index,
                phase: params.smoothed("unison_slot_phase", 0.0, UNISON_SMOOTHING),
                detune: params.smoothed("unison_slot_detune", 0.0, UNISON_SMOOTHING),
            };
            let pan = params.simple("unison_slot_pan", 0.0);
            let node = factory.build(params, &slot);
            mixer.add_input(node, None, Some(pan));
            slots.push(UnisonSlot {
                params: slot,
                pan,
                position: 0.0,
            });
        }

        let mut unison = Self {
            mixer,
            slots,
            controls,
            gain,
            active: 0,
            pending: None,
            stamp: CycleStamp::new(),
        };
        unison.apply_voices(params, voices);
        unison
    }

    pub fn max_voices(&self) -> usize {
        self.slots.len()
    }

    /// Voices currently sounding.
    pub fn voices(&self) -> usize {
        self.active
    }

    /// Voice count waiting for the next reset.
    pub fn pending_voices(&self) -> Option<usize> {
        self.pending
    }

    /// Request a new voice count; applied on the next `reset`.
    pub fn set_voices(&mut self, voices: usize) {
        let voices = voices.clamp(1, self.slots.len());
        self.pending = (voices != self.active).then_some(voices);
    }

    fn request_from(&mut self, value: f32) {
        let voices = crate::dsp::clamp_finite(value.round(), 1.0, self.slots.len() as f32);
        self.set_voices(voices as usize);
    }

    pub fn mixer(&self) -> &Mixer<N> {
        &self.mixer
    }

    pub fn slot_params(&self, index: usize) -> Option<UnisonSlotParams> {
        self.slots.get(index).map(|slot| slot.params)
    }

    fn apply_voices(&mut self, params: &mut ParamPool, voices: usize) {
        let voices = voices.clamp(1, self.slots.len());
        self.active = voices;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.position = slot_position(index, voices);
            self.mixer.set_muted(index, index >= voices);
        }
        params.set_base(self.gain, 1.0 / (voices as f32).sqrt());
    }

    /// Push spread settings into the active slots' params.
    fn spread(&mut self, ctx: &mut RenderCtx<'_>) {
        let cycle = ctx.cycle;
        let c = self.controls;
        let detune = ctx.params.resolve(c.detune, cycle)[0];
        let phase = ctx.params.resolve(c.phase, cycle)[0];
        let pan = ctx.params.resolve(c.pan, cycle)[0];
        let curve = crate::dsp::clamp_finite(ctx.params.resolve(c.curve, cycle)[0], 0.05, 8.0);

        for slot in &self.slots[..self.active] {
            let warped = centered_power(slot.position, curve);
            ctx.params.set_base(slot.params.detune, warped * detune);
            ctx.params.set_base(slot.params.phase, warped * phase);
            ctx.params.set_base(slot.pan, warped * pan);
        }
    }
}

impl<N: Node> Node for Unison<N> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        if self.stamp.claim(ctx.cycle) {
            if let Some(voices) = self.controls.voices {
                let requested = ctx.params.resolve(voices, ctx.cycle)[0];
                self.request_from(requested);
            }
            self.spread(ctx);
        }
        self.mixer.process(ctx)
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        // a muted stack never ran process, so pick up the count here too
        if let Some(voices) = self.controls.voices {
            self.request_from(params.base(voices));
        }
        if let Some(voices) = self.pending.take() {
            self.apply_voices(params, voices);
        }
        if hard {
            // new slots come in at their spread position, no glide
            for slot in &self.slots {
                params.snap(slot.params.phase);
                params.snap(slot.params.detune);
            }
        }
        self.mixer.reset(params, hard);
    }
}
