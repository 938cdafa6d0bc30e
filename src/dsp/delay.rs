use crate::dsp::clamp_finite;

/*
Fractional Delay Line
=====================

A circular buffer with one write head and one read head trailing it by
`delay` samples. Delay times from a param are rarely whole samples, so the
read blends the two neighbours linearly:

    buffer  ... [n-3] [n-2] [n-1] [ n ]  ← write
                       ↑─────↑
                   read at write - 1.4  →  0.4·[n-2] + 0.6·[n-1]

The buffer is sized once at construction (max delay plus a small margin)
and never grows; the readable delay is clamped to [1, len - 2].
*/

/// Extra slots beyond the longest delay, so the interpolation never reads the
/// sample being written.
const MARGIN: usize = 4;

/// Largest feedback the delay accepts.
pub const MAX_FEEDBACK: f32 = 0.97;

#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Box<[f32]>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples + MARGIN].into_boxed_slice(),
            write_pos: 0,
        }
    }

    pub fn with_seconds(max_seconds: f32, sample_rate: f32) -> Self {
        Self::new((max_seconds.max(0.0) * sample_rate).ceil() as usize)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Longest delay that can be read, in samples.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 2) as f32
    }

    /// Read `delay_samples` behind the next write position.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = clamp_finite(delay_samples, 1.0, self.max_delay());
        let whole = delay.floor();
        let frac = delay - whole;

        let newer = (self.write_pos + len - whole as usize) % len;
        let older = (newer + len - 1) % len;
        let a = self.buffer[newer];
        let b = self.buffer[older];
        a + (b - a) * frac
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// One-pole low-pass used to darken the feedback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneFilter {
    state: f32,
}

impl ToneFilter {
    /// Smoothing coefficient for a cutoff: `1 - e^(-2π·fc/sr)`.
    #[inline]
    pub fn coefficient(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let cutoff = clamp_finite(cutoff_hz, 1.0, 0.5 * sample_rate);
        1.0 - crate::dsp::fastmath::fast_exp(-std::f32::consts::TAU * cutoff / sample_rate)
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32, coef: f32) -> f32 {
        self.state += coef * (input - self.state);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}
