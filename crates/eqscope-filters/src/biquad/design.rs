//! Higher-order designs factored into cascades of [`Biquad`] sections.
use numeric_literals::replace_float_literals;

use eqscope_core::Scalar;

use super::Biquad;

/// Quality factors of the second-order sections making up a Butterworth filter of order
/// `2 * sections`.
///
/// The poles of an order `N` Butterworth filter sit at angles `(2k + 1) π / 2N` from the
/// negative real axis; each conjugate pair makes up one section with `Q = 1 / (2 cos θ)`.
#[replace_float_literals(T::cast_f64(literal))]
pub fn butterworth_q<T: Scalar>(sections: usize) -> impl Iterator<Item = T> {
    let order = T::cast_f64((2 * sections) as f64);
    (0..sections).map(move |k| {
        let k = T::cast_f64(k as f64);
        let theta = (2. * k + 1.) * T::pi() / (2. * order);
        1. / (2. * theta.cos())
    })
}

/// Butterworth lowpass of order `2 * sections`, as a cascade of biquads.
///
/// # Arguments
///
/// * `fc`: Cutoff frequency, normalized where 1 == samplerate
/// * `sections`: Number of second-order sections
pub fn butterworth_lowpass<T: Scalar>(fc: T, sections: usize) -> impl Iterator<Item = Biquad<T>> {
    butterworth_q(sections).map(move |q| Biquad::lowpass(fc, q))
}

/// Butterworth highpass of order `2 * sections`, as a cascade of biquads.
///
/// # Arguments
///
/// * `fc`: Cutoff frequency, normalized where 1 == samplerate
/// * `sections`: Number of second-order sections
pub fn butterworth_highpass<T: Scalar>(fc: T, sections: usize) -> impl Iterator<Item = Biquad<T>> {
    butterworth_q(sections).map(move |q| Biquad::highpass(fc, q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqscope_core::dsp::analysis::{DspAnalysis, Series};
    use eqscope_core::math::gain_to_db;
    use rstest::rstest;

    #[rstest]
    #[case(1, &[0.7071])]
    #[case(2, &[0.5412, 1.3066])]
    #[case(3, &[0.5176, 0.7071, 1.9319])]
    #[case(4, &[0.5098, 0.6013, 0.9000, 2.5629])]
    fn test_butterworth_q(#[case] sections: usize, #[case] expected: &[f64]) {
        let actual = butterworth_q::<f64>(sections).collect::<Vec<_>>();
        assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(&actual) {
            assert!((e - a).abs() < 1e-4, "{expected:?} != {actual:?}");
        }
    }

    #[rstest]
    fn test_cascade_is_3db_down_at_cutoff(#[values(1, 2, 3, 4)] sections: usize) {
        const SAMPLERATE: f64 = 48e3;
        let lp = butterworth_lowpass(1e3 / SAMPLERATE, sections).collect::<Vec<_>>();
        let hp = butterworth_highpass(1e3 / SAMPLERATE, sections).collect::<Vec<_>>();
        let lp_db = gain_to_db(Series(&lp[..]).magnitude(SAMPLERATE, 1e3), -200.0);
        let hp_db = gain_to_db(Series(&hp[..]).magnitude(SAMPLERATE, 1e3), -200.0);
        assert!((lp_db + 3.0103).abs() < 1e-2, "lowpass: {lp_db}");
        assert!((hp_db + 3.0103).abs() < 1e-2, "highpass: {hp_db}");
    }

    #[rstest]
    fn test_slope_per_octave(#[values(1, 2, 3, 4)] sections: usize) {
        const SAMPLERATE: f64 = 192e3;
        let hp = butterworth_highpass(1e3 / SAMPLERATE, sections).collect::<Vec<_>>();
        let series = Series(&hp[..]);
        let a = gain_to_db(series.magnitude(SAMPLERATE, 62.5), -400.0);
        let b = gain_to_db(series.magnitude(SAMPLERATE, 125.0), -400.0);
        let expected = 12.0 * sections as f64;
        assert!((b - a - expected).abs() < 0.5, "{} dB/oct", b - a);
    }
}
