//! Biquad coefficient sets, following the RBJ Audio EQ Cookbook designs.
//!
//! Only the coefficients and their transfer function live here; running them over a signal is the
//! business of whoever reads the published chain.
//!
//! # Usage
//!
//! ```rust
//! use eqscope_core::dsp::analysis::DspAnalysis;
//! use eqscope_filters::biquad::Biquad;
//! let peak = Biquad::<f64>::peaking(1e3 / 48e3 /* normalized frequency */, 1.0 /* Q */, 2.0 /* amp */);
//! let magnitude = peak.magnitude(48e3, 1e3);
//! assert!((magnitude - 4.0).abs() < 1e-9);
//! ```

use eqscope_core::dsp::analysis::DspAnalysis;
use eqscope_core::Scalar;
use nalgebra::Complex;
use num_traits::{One, Zero};
use numeric_literals::replace_float_literals;

pub mod design;

/// Lowest normalized frequency accepted by the designs.
pub const MIN_NORMALIZED_FREQUENCY: f64 = 1e-6;
/// Highest normalized frequency accepted by the designs, just under Nyquist.
pub const MAX_NORMALIZED_FREQUENCY: f64 = 0.49;
/// Lowest accepted resonance factor.
pub const MIN_Q: f64 = 0.025;
/// Highest accepted resonance factor.
pub const MAX_Q: f64 = 1e3;
/// Lowest accepted linear amplitude for gain-bearing designs.
pub const MIN_AMP: f64 = 1e-6;

/// Clamp a normalized frequency (where 1 == samplerate) into the range the designs are stable in.
/// NaN maps to the lowest frequency.
pub fn clamp_normalized_frequency<T: Scalar>(fc: T) -> T {
    let min = T::cast_f64(MIN_NORMALIZED_FREQUENCY);
    let max = T::cast_f64(MAX_NORMALIZED_FREQUENCY);
    if fc.is_finite() {
        fc.clamp(min, max)
    } else if fc > T::zero() {
        max
    } else {
        min
    }
}

/// Clamp a resonance factor into `MIN_Q..=MAX_Q`. NaN maps to the lowest Q.
pub fn clamp_q<T: Scalar>(q: T) -> T {
    let min = T::cast_f64(MIN_Q);
    let max = T::cast_f64(MAX_Q);
    if q.is_finite() {
        q.clamp(min, max)
    } else if q > T::zero() {
        max
    } else {
        min
    }
}

fn clamp_amp<T: Scalar>(amp: T) -> T {
    if amp.is_finite() {
        amp.max(T::cast_f64(MIN_AMP))
    } else {
        T::one()
    }
}

/// Second-order section coefficients, normalized so that `a0 == 1`.
///
/// The transfer function is `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Biquad<T> {
    b: [T; 3],
    a: [T; 2],
}

impl<T: Scalar> Default for Biquad<T> {
    fn default() -> Self {
        Self::identity()
    }
}

#[profiling::all_functions]
impl<T: Scalar> Biquad<T> {
    /// Create a new instance of a Biquad with the provided zeros and poles coefficients.
    #[profiling::skip]
    pub fn new(b: [T; 3], a: [T; 2]) -> Self {
        Self { b, a }
    }

    /// Biquad passing the signal through unchanged.
    pub fn identity() -> Self {
        Self::new([T::one(), T::zero(), T::zero()], [T::zero(); 2])
    }

    /// Create a lowpass with the provided frequency cutoff coefficient (normalized where 1 == samplerate) and resonance factor.
    #[replace_float_literals(T::cast_f64(literal))]
    pub fn lowpass(fc: T, q: T) -> Self {
        let w0 = T::two_pi() * clamp_normalized_frequency(fc);
        let (sw0, cw0) = w0.sin_cos();
        let b1 = 1. - cw0;
        let b0 = b1 / 2.;
        let b2 = b0;

        let alpha = sw0 / (2. * clamp_q(q));
        let a0 = 1. + alpha;
        let a1 = -2. * cw0;
        let a2 = 1. - alpha;

        Self::new([b0, b1, b2].map(|b| b / a0), [a1, a2].map(|a| a / a0))
    }

    /// Create a highpass with the provided frequency cutoff coefficient (normalized where 1 == samplerate) and resonance factor.
    #[replace_float_literals(T::cast_f64(literal))]
    pub fn highpass(fc: T, q: T) -> Self {
        let w0 = T::two_pi() * clamp_normalized_frequency(fc);
        let (sw0, cw0) = w0.sin_cos();
        let b1 = -(1. + cw0);
        let b0 = -b1 / 2.;
        let b2 = b0;

        let alpha = sw0 / (2. * clamp_q(q));
        let a0 = 1. + alpha;
        let a1 = -2. * cw0;
        let a2 = 1. - alpha;

        Self::new([b0, b1, b2].map(|b| b / a0), [a1, a2].map(|a| a / a0))
    }

    /// Create a peaking (bell) filter with the provided frequency cutoff coefficient (normalized
    /// where 1 == samplerate), resonance factor and amplitude. The amplitude is the square root of
    /// the linear gain at the center frequency, that is `10^(dB / 40)`.
    #[replace_float_literals(T::cast_f64(literal))]
    pub fn peaking(fc: T, q: T, amp: T) -> Self {
        let w0 = T::two_pi() * clamp_normalized_frequency(fc);
        let (sw0, cw0) = w0.sin_cos();
        let alpha = sw0 / (2. * clamp_q(q));
        let amp = clamp_amp(amp);

        let b0 = 1. + alpha * amp;
        let b1 = -2. * cw0;
        let b2 = 1. - alpha * amp;

        let a0 = 1. + alpha / amp;
        let a1 = b1;
        let a2 = 1. - alpha / amp;

        Self::new([b0, b1, b2].map(|b| b / a0), [a1, a2].map(|a| a / a0))
    }

    /// The five coefficients, as `[b0, b1, b2, a1, a2]`.
    pub fn coefficients(&self) -> [T; 5] {
        let [b0, b1, b2] = self.b;
        let [a1, a2] = self.a;
        [b0, b1, b2, a1, a2]
    }
}

impl<T: Scalar> DspAnalysis for Biquad<T> {
    type Sample = T;

    fn h_z(&self, z: Complex<Self::Sample>) -> Complex<Self::Sample> {
        let z1 = z.powi(-1);
        let z2 = z.powi(-2);
        let num = z1.scale(self.b[1]) + z2.scale(self.b[2]) + self.b[0];
        let den = z1.scale(self.a[0]) + z2.scale(self.a[1]) + T::one();
        num / den
    }
}
