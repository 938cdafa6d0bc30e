use crate::dsp::coef_from_time;

/*
ADSR Envelope Implementation
============================

This module implements an exponential ADSR envelope generator: the
workhorse of synthesizer amplitude and filter control.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Idle, Attack, Decay, Sustain or Release. A state machine
              governs transitions.

  gate        The note on/off signal. Gate high (note_on) forces Attack.
              Gate low (note_off) forces Release from wherever we are.

  coef        One-pole smoothing coefficient for the current stage. Each
              sample does: level += coef * (target - level)


The Shape: One-Pole Curves
--------------------------

  Level
    1.0 ┐    ╭╮
        │   ╱  ╲___________
    S   │  │               ╲
        │  │                ╲_
    0.0 └──┴──────────────────`──→ Time
        Attack Decay  Sustain  Release

Every stage is a one-pole filter chasing a target, which gives the
exponential curves acoustic sounds have. The coefficient comes from the
stage time:

    coef = 1 - exp(-1 / (time * sample_rate))

After `time * sample_rate` samples a one-pole has covered 1 - e^-1 (63%) of
the way to its target, and it never actually arrives. So each stage aims
PAST its real destination, by a factor of 1 / (1 - e^-1) of the distance:

    attack target   = start + (1 - start) * OVERSHOOT
    decay target    = sustain - (start - sustain) * (OVERSHOOT - 1)
    release target  = start - start * OVERSHOOT

That way the curve crosses the real destination exactly at `time`. The
stage ends as soon as the completion check passes and the level snaps to
the destination:

    attack    level > 0.999
    decay     level within 1e-6 of sustain
    release   level < 0.001

A zero stage time gives coef = 0, which means "already there": the level
jumps and the stage ends on the same sample.


The State Machine
-----------------

    ┌──────┐  note_on   ┌────────┐  done   ┌───────┐  done   ┌─────────┐
    │ Idle │ ─────────→ │ Attack │ ──────→ │ Decay │ ──────→ │ Sustain │
    └──────┘            └────────┘         └───────┘         └─────────┘
        ↑                    │ note_off        │ note_off         │
        │                    ↓                 ↓                  │
        │    done       ┌─────────┐ ←──────────┴──────────────────┘
        └────────────── │ Release │         note_off
                        └─────────┘

note_on from Release restarts Attack from the current level (no click).
note_off while Idle does nothing.


Implementation Notes
--------------------

Coefficients only change when a stage time changes, so we cache them and
recompute on `need_recalc`. The level itself runs in f64: a long attack at
a high sample rate takes hundreds of thousands of tiny steps.
*/

pub const ATTACK_DONE: f64 = 0.999;
pub const DECAY_EPSILON: f64 = 1e-6;
pub const RELEASE_DONE: f64 = 0.001;

/// 1 / (1 - e^-1): how far past its destination each stage aims.
const OVERSHOOT: f64 = 1.581_976_706_869_326_4;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Gate just went high, rising to 1.0
    Decay,   // Reached peak, falling to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, falling to 0
}

/// Stage settings for one block: times in seconds, sustain as a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrTimes {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for AdsrTimes {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StageCoefs {
    attack: f64,
    decay: f64,
    release: f64,
}

#[derive(Debug, Clone)]
pub struct Adsr {
    stage: EnvelopeState,
    level: f64,
    stage_start: f64, // level when the current stage began

    times: AdsrTimes,
    sample_rate: f32,
    coefs: StageCoefs,
    need_recalc: bool,
}

impl Adsr {
    pub fn new() -> Self {
        Self {
            stage: EnvelopeState::Idle,
            level: 0.0,
            stage_start: 0.0,
            times: AdsrTimes::default(),
            sample_rate: 0.0,
            coefs: StageCoefs::default(),
            need_recalc: true,
        }
    }

    /// Gate high: (re)start the attack from the current level.
    pub fn note_on(&mut self) {
        self.stage_start = self.level;
        self.stage = EnvelopeState::Attack;
    }

    /// Gate low: start the release from the current level.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeState::Idle {
            return;
        }
        self.stage_start = self.level;
        self.stage = EnvelopeState::Release;
    }

    /// Apply stage settings; coefficients are rebuilt only if they changed.
    pub fn set_times(&mut self, times: AdsrTimes, sample_rate: f32) {
        let timing_changed = times.attack != self.times.attack
            || times.decay != self.times.decay
            || times.release != self.times.release
            || sample_rate != self.sample_rate;
        if timing_changed {
            self.need_recalc = true;
        }
        self.times = times;
        self.sample_rate = sample_rate;

        if self.need_recalc {
            self.coefs = StageCoefs {
                attack: coef_from_time(times.attack, sample_rate) as f64,
                decay: coef_from_time(times.decay, sample_rate) as f64,
                release: coef_from_time(times.release, sample_rate) as f64,
            };
            self.need_recalc = false;
        }
    }

    fn sustain_level(&self) -> f64 {
        crate::dsp::clamp_finite(self.times.sustain, 0.0, 1.0) as f64
    }

    fn enter(&mut self, stage: EnvelopeState) {
        self.stage = stage;
        self.stage_start = self.level;
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                let coef = self.coefs.attack;
                let target = self.stage_start + (1.0 - self.stage_start) * OVERSHOOT;
                if coef > 0.0 {
                    self.level += coef * (target - self.level);
                }
                if coef <= 0.0 || self.level > ATTACK_DONE {
                    self.level = 1.0;
                    self.enter(EnvelopeState::Decay);
                }
            }

            EnvelopeState::Decay => {
                let coef = self.coefs.decay;
                let sustain = self.sustain_level();
                let target = sustain - (self.stage_start - sustain) * (OVERSHOOT - 1.0);
                if coef > 0.0 {
                    self.level += coef * (target - self.level);
                }
                if coef <= 0.0 || self.level - sustain <= DECAY_EPSILON {
                    self.level = sustain;
                    self.enter(EnvelopeState::Sustain);
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level();
            }

            EnvelopeState::Release => {
                let coef = self.coefs.release;
                let target = self.stage_start - self.stage_start * OVERSHOOT;
                if coef > 0.0 {
                    self.level += coef * (target - self.level);
                }
                if coef <= 0.0 || self.level < RELEASE_DONE {
                    self.level = 0.0;
                    self.enter(EnvelopeState::Idle);
                }
            }
        }

        self.level as f32
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, out: &mut [f32], times: AdsrTimes, sample_rate: f32) {
        self.set_times(times, sample_rate);
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Only the Idle stage counts; a releasing envelope is still sounding.
    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeState::Idle
    }

    /// Force back to Idle at zero.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.stage_start = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level as f32
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new()
    }
}
