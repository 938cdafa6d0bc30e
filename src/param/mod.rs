//! Block-rate control signals and modulation.

use crate::block::CycleStamp;
use crate::dsp::envelope::{Adsr, AdsrTimes, EnvelopeState};
use crate::dsp::lfo::{Lfo, LfoShape};
use crate::{Error, Result, BLOCK_SIZE};

pub mod id;
pub mod modulation;
pub mod smooth;
pub mod tuner;

pub use id::{ParamId, Storage, NO_BINDING};
pub use modulation::{ModInput, ModInputs, ModMap, MAX_MOD_INPUTS};
pub use smooth::Smoother;

/*
Parameters as Signals
=====================

Every control in the synth (cutoff, detune, an envelope, an LFO) is a
param: a block of `BLOCK_SIZE` values, recomputed at most once per cycle.

    resolved[i] = base + Σ amount · map(source[i])     (up to 8 sources)

followed by whatever the kind does with it:

    Simple     nothing
    Smoothed   one-pole glide towards the modulated value
    Const      base only, filled when set; never modulated
    Tuner      frequency[i] · 2^((semitones[i] + resolved[i]) / 12)
    Envelope   ADSR level, stage times read from four other params
    Lfo        resolved[i] (depth) · wave


Ownership
---------

All params live in one arena, the `ParamPool`, and are named by a copyable
`ParamRef`. A pitch-bend param feeding eight voices is one slot with eight
readers; nobody holds a lock or a refcount.

    ParamPool
      slots    [ name | kind | base | mods | stamp ]   one per param
      buffers  [ f32; BLOCK_SIZE ]                     one per param

Sources are resolved before the param that reads them (depth first). Each
slot is stamped with the cycle before its sources are visited, so a cycle
in the routing terminates, and a param that reads itself sees the buffer
from the previous block.
*/

pub type ParamBuffer = [f32; BLOCK_SIZE];

/// Handle to a param in a [`ParamPool`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamRef(u32);

impl ParamRef {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The four stage controls of an envelope param.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: ParamRef,
    pub decay: ParamRef,
    pub sustain: ParamRef,
    pub release: ParamRef,
}

#[derive(Debug, Clone)]
pub enum ParamKind {
    Simple,
    Smoothed(Smoother),
    Const,
    Tuner {
        frequency: ParamRef,
        semitones: ParamRef,
    },
    Envelope {
        adsr: Adsr,
        stages: EnvelopeParams,
    },
    Lfo {
        lfo: Lfo,
        rate: ParamRef,
    },
}

impl ParamKind {
    /// Params this kind reads besides its modulation inputs.
    fn dependencies(&self) -> [Option<ParamRef>; 4] {
        match self {
            ParamKind::Tuner {
                frequency,
                semitones,
            } => [Some(*frequency), Some(*semitones), None, None],
            ParamKind::Envelope { stages, .. } => [
                Some(stages.attack),
                Some(stages.decay),
                Some(stages.sustain),
                Some(stages.release),
            ],
            ParamKind::Lfo { rate, .. } => [Some(*rate), None, None, None],
            ParamKind::Simple | ParamKind::Smoothed(_) | ParamKind::Const => [None; 4],
        }
    }

    fn accepts_modulation(&self) -> bool {
        !matches!(self, ParamKind::Const | ParamKind::Envelope { .. })
    }
}

#[derive(Debug, Clone)]
struct ParamSlot {
    name: &'static str,
    kind: ParamKind,
    base: f32,
    mods: ModInputs,
    stamp: CycleStamp,
    computations: u64,
}

/// Arena owning every param of a synth, and their per-block buffers.
#[derive(Debug, Clone)]
pub struct ParamPool {
    sample_rate: f32,
    slots: Vec<ParamSlot>,
    buffers: Vec<ParamBuffer>,
    scratch: ParamBuffer,
    aux: ParamBuffer,
}

impl ParamPool {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            slots: Vec::new(),
            buffers: Vec::new(),
            scratch: [0.0; BLOCK_SIZE],
            aux: [0.0; BLOCK_SIZE],
        }
    }

    pub fn with_capacity(sample_rate: f32, capacity: usize) -> Self {
        let mut pool = Self::new(sample_rate);
        pool.slots.reserve(capacity);
        pool.buffers.reserve(capacity);
        pool
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn push(&mut self, name: &'static str, kind: ParamKind, base: f32) -> ParamRef {
        let param = ParamRef::from_index(self.slots.len());
        let initial = match kind {
            ParamKind::Envelope { .. } | ParamKind::Lfo { .. } | ParamKind::Tuner { .. } => 0.0,
            _ => base,
        };
        self.slots.push(ParamSlot {
            name,
            kind,
            base,
            mods: ModInputs::new(),
            stamp: CycleStamp::new(),
            computations: 0,
        });
        self.buffers.push([initial; BLOCK_SIZE]);
        param
    }

    // Construction. These allocate; call them while building the graph.

    pub fn simple(&mut self, name: &'static str, base: f32) -> ParamRef {
        self.push(name, ParamKind::Simple, base)
    }

    pub fn smoothed(&mut self, name: &'static str, base: f32, time: f32) -> ParamRef {
        let smoother = Smoother::new(time, self.sample_rate);
        self.push(name, ParamKind::Smoothed(smoother), base)
    }

    pub fn constant(&mut self, name: &'static str, value: f32) -> ParamRef {
        self.push(name, ParamKind::Const, value)
    }

    /// `frequency · 2^(semitones / 12)`; the tuner's own base and modulation
    /// add further semitones.
    pub fn tuner(&mut self, name: &'static str, frequency: ParamRef, semitones: ParamRef) -> ParamRef {
        self.push(
            name,
            ParamKind::Tuner {
                frequency,
                semitones,
            },
            0.0,
        )
    }

    pub fn envelope(&mut self, name: &'static str, stages: EnvelopeParams) -> ParamRef {
        self.push(
            name,
            ParamKind::Envelope {
                adsr: Adsr::new(),
                stages,
            },
            0.0,
        )
    }

    /// Free-running LFO; `depth` is its base and can be modulated.
    pub fn lfo(&mut self, name: &'static str, shape: LfoShape, rate: ParamRef, depth: f32) -> ParamRef {
        self.push(
            name,
            ParamKind::Lfo {
                lfo: Lfo::new(shape),
                rate,
            },
            depth,
        )
    }

    // Control plane.

    pub fn name(&self, param: ParamRef) -> &'static str {
        self.slots[param.index()].name
    }

    pub fn kind(&self, param: ParamRef) -> &ParamKind {
        &self.slots[param.index()].kind
    }

    pub fn base(&self, param: ParamRef) -> f32 {
        self.slots[param.index()].base
    }

    /// Set the base value. Visible from the next resolve; const params
    /// refill their buffer immediately.
    pub fn set_base(&mut self, param: ParamRef, value: f32) {
        let slot = &mut self.slots[param.index()];
        slot.base = value;
        if matches!(slot.kind, ParamKind::Const) {
            self.buffers[param.index()].fill(value);
        }
    }

    pub fn try_mod_inputs(&mut self, param: ParamRef) -> Result<&mut ModInputs> {
        let slot = &mut self.slots[param.index()];
        if !slot.kind.accepts_modulation() {
            return Err(Error::NotModulatable { name: slot.name });
        }
        Ok(&mut slot.mods)
    }

    /// # Panics
    /// If the param is const or an envelope.
    #[track_caller]
    pub fn mod_inputs(&mut self, param: ParamRef) -> &mut ModInputs {
        match self.try_mod_inputs(param) {
            Ok(mods) => mods,
            Err(err) => panic!("{err}"),
        }
    }

    /// Route `source` into `param`. Returns the modulation slot used.
    pub fn try_add_mod(
        &mut self,
        param: ParamRef,
        source: ParamRef,
        amount: f32,
        map: ModMap,
    ) -> Result<usize> {
        let name = self.name(param);
        self.try_mod_inputs(param)?
            .push(ModInput {
                source,
                amount,
                map,
            })
            .ok_or(Error::ModInputsFull { name })
    }

    /// # Panics
    /// If the param does not accept modulation or all slots are taken.
    #[track_caller]
    pub fn add_mod(&mut self, param: ParamRef, source: ParamRef, amount: f32, map: ModMap) -> usize {
        match self.try_add_mod(param, source, amount, map) {
            Ok(slot) => slot,
            Err(err) => panic!("{err}"),
        }
    }

    /// Change a smoothed param's time constant. Returns `false` for other kinds.
    pub fn set_smoothing(&mut self, param: ParamRef, time: f32) -> bool {
        let sample_rate = self.sample_rate;
        match &mut self.slots[param.index()].kind {
            ParamKind::Smoothed(smoother) => {
                smoother.set_time(time, sample_rate);
                true
            }
            _ => false,
        }
    }

    /// Make a smoothed param jump to its target on the next resolve.
    pub fn snap(&mut self, param: ParamRef) {
        if let ParamKind::Smoothed(smoother) = &mut self.slots[param.index()].kind {
            smoother.snap();
        }
    }

    fn adsr_mut(&mut self, param: ParamRef) -> Result<&mut Adsr> {
        let slot = &mut self.slots[param.index()];
        match &mut slot.kind {
            ParamKind::Envelope { adsr, .. } => Ok(adsr),
            _ => Err(Error::NotAnEnvelope { name: slot.name }),
        }
    }

    fn adsr(&self, param: ParamRef) -> Option<&Adsr> {
        match &self.slots[param.index()].kind {
            ParamKind::Envelope { adsr, .. } => Some(adsr),
            _ => None,
        }
    }

    pub fn try_note_on(&mut self, param: ParamRef) -> Result<()> {
        self.adsr_mut(param)?.note_on();
        Ok(())
    }

    pub fn try_note_off(&mut self, param: ParamRef) -> Result<()> {
        self.adsr_mut(param)?.note_off();
        Ok(())
    }

    /// # Panics
    /// If the param is not an envelope.
    #[track_caller]
    pub fn note_on(&mut self, param: ParamRef) {
        if let Err(err) = self.try_note_on(param) {
            panic!("{err}");
        }
    }

    /// # Panics
    /// If the param is not an envelope.
    #[track_caller]
    pub fn note_off(&mut self, param: ParamRef) {
        if let Err(err) = self.try_note_off(param) {
            panic!("{err}");
        }
    }

    /// Force an envelope back to Idle at zero. No-op for other kinds.
    pub fn reset_envelope(&mut self, param: ParamRef) {
        if let Ok(adsr) = self.adsr_mut(param) {
            adsr.reset();
        }
    }

    pub fn envelope_state(&self, param: ParamRef) -> Option<EnvelopeState> {
        self.adsr(param).map(Adsr::state)
    }

    /// Level after the last resolved sample.
    pub fn envelope_level(&self, param: ParamRef) -> Option<f32> {
        self.adsr(param).map(Adsr::level)
    }

    // Audio thread.

    /// Compute `param` (and everything it reads) for `cycle`, unless done already.
    pub fn update(&mut self, param: ParamRef, cycle: u64) {
        let index = param.index();
        let slot = &mut self.slots[index];
        if matches!(slot.kind, ParamKind::Const) || !slot.stamp.claim(cycle) {
            return;
        }

        let mods = slot.mods;
        let dependencies = slot.kind.dependencies();
        for input in mods.iter() {
            self.update(input.source, cycle);
        }
        for dependency in dependencies.into_iter().flatten() {
            self.update(dependency, cycle);
        }

        self.compute(index);
    }

    fn compute(&mut self, index: usize) {
        let sample_rate = self.sample_rate;
        let Self {
            slots,
            buffers,
            scratch,
            aux,
            ..
        } = self;
        let slot = &mut slots[index];
        slot.computations += 1;

        scratch.fill(slot.base);
        for input in slot.mods.iter() {
            let source = &buffers[input.source.index()];
            for (out, &x) in scratch.iter_mut().zip(source.iter()) {
                *out += input.amount * input.map.apply(x);
            }
        }

        match &mut slot.kind {
            ParamKind::Simple | ParamKind::Const => {}
            ParamKind::Smoothed(smoother) => smoother.process(&mut scratch[..]),
            ParamKind::Tuner {
                frequency,
                semitones,
            } => tuner::tune_block(
                &mut scratch[..],
                &buffers[frequency.index()],
                &buffers[semitones.index()],
            ),
            ParamKind::Envelope { adsr, stages } => {
                // stage controls are read at block rate
                let times = AdsrTimes {
                    attack: buffers[stages.attack.index()][0],
                    decay: buffers[stages.decay.index()][0],
                    sustain: buffers[stages.sustain.index()][0],
                    release: buffers[stages.release.index()][0],
                };
                adsr.render(&mut scratch[..], times, sample_rate);
            }
            ParamKind::Lfo { lfo, rate } => {
                lfo.render(&mut aux[..], &buffers[rate.index()], &scratch[..], sample_rate);
                scratch.copy_from_slice(&aux[..]);
            }
        }

        buffers[index].copy_from_slice(&scratch[..]);
    }

    /// Compute if needed, then borrow the buffer for `cycle`.
    #[inline]
    pub fn resolve(&mut self, param: ParamRef, cycle: u64) -> &ParamBuffer {
        self.update(param, cycle);
        &self.buffers[param.index()]
    }

    /// Last computed buffer, without computing anything.
    #[inline]
    pub fn cached(&self, param: ParamRef) -> &ParamBuffer {
        &self.buffers[param.index()]
    }

    /// How many times the param has been computed.
    pub fn computations(&self, param: ParamRef) -> u64 {
        self.slots[param.index()].computations
    }
}
