use crate::dsp::fastmath::fast_exp_semi;

/// Offsets flatter than this are treated as constant across the block.
pub const FLAT_TOLERANCE: f32 = 1e-9;

/// `out[i] = frequency[i] · 2^((semitones[i] + out[i]) / 12)`.
///
/// `out` comes in holding the tuner's own modulation sum (extra semitones).
/// When the total offset is flat the ratio is computed once for the block.
#[inline]
pub fn tune_block(out: &mut [f32], frequency: &[f32], semitones: &[f32]) {
    let Some((&first_extra, &first_semis)) = out.first().zip(semitones.first()) else {
        return;
    };
    let first = first_semis + first_extra;
    let flat = out
        .iter()
        .zip(semitones)
        .all(|(&extra, &semis)| (semis + extra - first).abs() <= FLAT_TOLERANCE);

    if flat {
        let ratio = fast_exp_semi(first);
        for (o, &f) in out.iter_mut().zip(frequency) {
            *o = f * ratio;
        }
    } else {
        tune_per_sample(out, frequency, semitones);
    }
}

/// Per-sample path of [`tune_block`].
#[inline]
pub fn tune_per_sample(out: &mut [f32], frequency: &[f32], semitones: &[f32]) {
    for ((o, &f), &semis) in out.iter_mut().zip(frequency).zip(semitones) {
        *o = f * fast_exp_semi(semis + *o);
    }
}
