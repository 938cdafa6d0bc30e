use crate::dsp::EnvelopeState;
use crate::graph::node::{Node, RenderCtx};
use crate::io::converter::midi_note_to_freq;
use crate::param::{ParamPool, ParamRef};
use crate::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// A node graph plus the envelopes that gate it.
///
/// The first envelope is the amplitude envelope: its level decides how loud
/// the voice is when the pool looks for one to steal.
pub struct Voice<G = Box<dyn Node>> {
    graph: G,
    frequency: ParamRef,
    velocity: Option<ParamRef>,
    envelopes: Vec<ParamRef>,
    note: Option<u8>,
}

impl<G: Node> Voice<G> {
    /// `frequency` is the param note-on retunes (Hz).
    pub fn new(graph: G, frequency: ParamRef) -> Self {
        Self {
            graph,
            frequency,
            velocity: None,
            envelopes: Vec::new(),
            note: None,
        }
    }

    pub fn with_envelope(mut self, envelope: ParamRef) -> Self {
        self.envelopes.push(envelope);
        self
    }

    /// Param that receives `velocity / 127` on note-on.
    pub fn with_velocity(mut self, velocity: ParamRef) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn frequency(&self) -> ParamRef {
        self.frequency
    }

    pub fn envelopes(&self) -> &[ParamRef] {
        &self.envelopes
    }

    /// Last note started on this voice.
    pub fn note(&self) -> Option<u8> {
        self.note
    }

    /// Retune, reset and retrigger.
    ///
    /// A voice that is still sounding gets a soft reset and glides to the
    /// new pitch (legato); an idle one is hard reset and snaps.
    pub fn note_on(&mut self, params: &mut ParamPool, note: u8, velocity: u8) {
        let was_idle = self.is_idle(params);

        params.set_base(self.frequency, midi_note_to_freq(note));
        if let Some(v) = self.velocity {
            params.set_base(v, velocity.min(127) as f32 / 127.0);
        }
        if was_idle {
            params.snap(self.frequency);
        }
        self.graph.reset(params, was_idle);

        for &envelope in &self.envelopes {
            params.note_on(envelope);
        }
        self.note = Some(note);
    }

    pub fn note_off(&mut self, params: &mut ParamPool) {
        for &envelope in &self.envelopes {
            params.note_off(envelope);
        }
    }

    /// Idle once every envelope is idle.
    pub fn is_idle(&self, params: &ParamPool) -> bool {
        self.envelopes
            .iter()
            .all(|&e| matches!(params.envelope_state(e), Some(EnvelopeState::Idle) | None))
    }

    /// Loudness proxy: the amplitude envelope's last level.
    pub fn level(&self, params: &ParamPool) -> f32 {
        self.envelopes
            .first()
            .and_then(|&e| params.envelope_level(e))
            .unwrap_or(0.0)
    }

    pub fn state(&self, params: &ParamPool) -> VoiceState {
        match self.envelopes.first().and_then(|&e| params.envelope_state(e)) {
            None | Some(EnvelopeState::Idle) => VoiceState::Free,
            Some(EnvelopeState::Release) => VoiceState::Releasing,
            Some(_) => VoiceState::Active,
        }
    }
}

impl<G: Node> Node for Voice<G> {
    fn process(&mut self, ctx: &mut RenderCtx<'_>) -> &Block {
        self.graph.process(ctx)
    }

    fn reset(&mut self, params: &mut ParamPool, hard: bool) {
        self.graph.reset(params, hard);
    }
}
