//! Math utilities: z-plane mapping, decibel conversions and range mapping.
use nalgebra::Complex;
use numeric_literals::replace_float_literals;

use crate::Scalar;

mod range;

pub use range::LogRange;

/// Lowest frequency shown on the frequency axis, in Hz.
pub const MIN_FREQUENCY: f64 = 20.0;
/// Highest frequency shown on the frequency axis, in Hz.
pub const MAX_FREQUENCY: f64 = 20e3;

/// Position on the unit circle corresponding to frequency `f` at the given sample rate.
pub fn freq_to_z<T: Scalar>(samplerate: T, f: T) -> Complex<T> {
    let w = T::two_pi() * f / samplerate;
    let (s, c) = w.sin_cos();
    Complex::new(c, s)
}

/// Convert a linear gain into decibels. Values whose decibel value falls below `floor_db`
/// (including zero and negative gains) return `floor_db`.
#[replace_float_literals(T::cast_f64(literal))]
pub fn gain_to_db<T: Scalar>(gain: T, floor_db: T) -> T {
    if gain <= 0.0 {
        return floor_db;
    }
    (20.0 * gain.log10()).max(floor_db)
}

/// Convert decibels into a linear gain.
#[replace_float_literals(T::cast_f64(literal))]
pub fn db_to_gain<T: Scalar>(db: T) -> T {
    10.0.powf(db / 20.0)
}

/// Linearly map `value` from the `from` range onto the `to` range. Either range may be reversed.
pub fn remap<T: Scalar>(value: T, from: (T, T), to: (T, T)) -> T {
    let t = (value - from.0) / (from.1 - from.0);
    to.0 + t * (to.1 - to.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::ComplexField;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, 0.0)]
    #[case(0.5, -6.0206)]
    #[case(10.0, 20.0)]
    #[case(0.0, -48.0)]
    #[case(-1.0, -48.0)]
    #[case(1e-6, -48.0)]
    fn test_gain_to_db(#[case] gain: f64, #[case] expected: f64) {
        let actual = gain_to_db(gain, -48.0);
        assert!((expected - actual).abs() < 1e-3, "{expected} != {actual}");
    }

    #[rstest]
    fn test_db_roundtrip(#[values(-40.0, -6.0, 0.0, 3.0, 24.0)] db: f64) {
        let actual = gain_to_db(db_to_gain(db), -100.0);
        assert!((db - actual).abs() < 1e-9);
    }

    #[test]
    fn test_remap_reversed() {
        assert_eq!(100.0, remap(-48.0, (-48.0, 0.0), (100.0, 0.0)));
        assert_eq!(0.0, remap(0.0, (-48.0, 0.0), (100.0, 0.0)));
        assert_eq!(50.0, remap(-24.0, (-48.0, 0.0), (100.0, 0.0)));
    }

    #[test]
    fn test_freq_to_z_on_unit_circle() {
        let z = freq_to_z(48e3, 12e3);
        assert!((z.modulus() - 1.0).abs() < 1e-12);
        assert!(z.re.abs() < 1e-12);
        assert!((z.im - 1.0).abs() < 1e-12);
    }
}
