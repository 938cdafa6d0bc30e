use std::sync::OnceLock;

/*
Table-Driven Exponentials
=========================

Pitch math is exponential: every semitone multiplies frequency by 2^(1/12).
Evaluating `powf` per sample for every oscillator in every unison slot of
every voice adds up, so we split the exponent instead:

    2^x = 2^floor(x) * 2^frac(x)

The integer part is exact: we build the float's exponent bits directly. The
fractional part comes from a 1024-entry table of 2^(k/1024), linearly
interpolated. Relative error stays below 1e-7, well under anything audible.

The table is built on first use. `warm_up()` forces that from a control
thread so the audio thread never pays for it.
*/

const TABLE_BITS: u32 = 10;
const TABLE_SIZE: usize = 1 << TABLE_BITS;

fn exp2_table() -> &'static [f32; TABLE_SIZE + 1] {
    static TABLE: OnceLock<[f32; TABLE_SIZE + 1]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0f32; TABLE_SIZE + 1];
        for (i, value) in table.iter_mut().enumerate() {
            *value = (i as f64 / TABLE_SIZE as f64).exp2() as f32;
        }
        table
    })
}

/// Build the lookup table ahead of time.
pub fn warm_up() {
    let _ = exp2_table();
}

/// Fast `2^x`. NaN maps to 1.0, the exponent is clamped to ±126.
#[inline]
pub fn fast_exp2(x: f32) -> f32 {
    let x = if x.is_nan() { 0.0 } else { x.clamp(-126.0, 126.0) };
    let whole = x.floor();
    let pos = (x - whole) * TABLE_SIZE as f32;
    let index = (pos as usize).min(TABLE_SIZE - 1);
    let t = pos - index as f32;

    let table = exp2_table();
    let mantissa = table[index] + (table[index + 1] - table[index]) * t;
    let scale = f32::from_bits(((whole as i32 + 127) as u32) << 23);
    mantissa * scale
}

/// Frequency ratio for a semitone offset: `2^(semitones / 12)`.
#[inline]
pub fn fast_exp_semi(semitones: f32) -> f32 {
    fast_exp2(semitones * (1.0 / 12.0))
}

/// Fast `e^x`.
#[inline]
pub fn fast_exp(x: f32) -> f32 {
    fast_exp2(x * std::f32::consts::LOG2_E)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exp2_matches_std_across_range() {
        let mut x = -40.0f32;
        while x < 40.0 {
            assert_relative_eq!(fast_exp2(x), x.exp2(), max_relative = 1e-6);
            x += 0.173;
        }
    }

    #[test]
    fn octave_and_semitone_ratios() {
        assert_relative_eq!(fast_exp_semi(12.0), 2.0, max_relative = 1e-6);
        assert_relative_eq!(fast_exp_semi(-12.0), 0.5, max_relative = 1e-6);
        assert_relative_eq!(fast_exp_semi(7.0), 1.498_307, max_relative = 1e-5);
        assert_eq!(fast_exp_semi(0.0), 1.0);
    }

    #[test]
    fn exp_matches_std_for_coefficients() {
        for &x in &[-0.001f32, -0.05, -0.5, -1.0, -3.0] {
            assert_relative_eq!(fast_exp(x), x.exp(), max_relative = 1e-5);
        }
    }

    #[test]
    fn nan_is_neutral() {
        assert_eq!(fast_exp2(f32::NAN), 1.0);
    }
}
