use crate::dsp::coef_from_time;

/// One-pole low-pass for zipper-free parameter changes and glide.
///
/// The first block after construction (or after [`snap`](Smoother::snap))
/// starts at its input instead of sliding up from zero.
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    time: f32,
    coef: f32,
    value: f32,
    primed: bool,
}

impl Smoother {
    pub fn new(time: f32, sample_rate: f32) -> Self {
        Self {
            time,
            coef: coef_from_time(time, sample_rate),
            value: 0.0,
            primed: false,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32, sample_rate: f32) {
        if time != self.time {
            self.time = time;
            self.coef = coef_from_time(time, sample_rate);
        }
    }

    /// Jump straight to the target on the next block.
    pub fn snap(&mut self) {
        self.primed = false;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Smooth `buffer` in place.
    #[inline]
    pub fn process(&mut self, buffer: &mut [f32]) {
        let Some(&first) = buffer.first() else {
            return;
        };
        if !self.primed || !self.value.is_finite() {
            self.value = first;
            self.primed = true;
        }
        // zero coefficient: no smoothing at all
        let alpha = if self.coef > 0.0 { self.coef } else { 1.0 };
        for sample in buffer.iter_mut() {
            self.value += alpha * (*sample - self.value);
            *sample = self.value;
        }
    }
}
