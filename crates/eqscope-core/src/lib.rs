//! # `eqscope_core`
//!
//! Provides the basic definitions for all of `eqscope`. Contains the scalar abstraction, frequency
//! response analysis, decibel and log-scale math, drawing geometry and thread-safe parameter
//! storage.
#![warn(missing_docs)]

use nalgebra::RealField;

pub mod dsp;
pub mod geom;
pub mod math;
pub mod util;

/// Scalar trait. All of `eqscope` uses this trait as bound for values used in coefficient design
/// and response evaluation.
///
/// It is implemented for `f32` and `f64`; coefficient sets shared with an audio path are usually
/// computed in `f64`, while display data is stored as `f32`.
pub trait Scalar: Copy + RealField {
    /// Create a new [`Scalar`] from a single `f64` value.
    fn cast_f64(value: f64) -> Self;

    /// Convert this [`Scalar`] back into an `f64`. Values which cannot be represented come back
    /// as NaN.
    fn to_f64(self) -> f64;

    /// Convert this [`Scalar`] into an `f32`.
    fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }
}

impl<T: Copy + RealField> Scalar for T {
    fn cast_f64(value: f64) -> Self {
        nalgebra::convert(value)
    }

    fn to_f64(self) -> f64 {
        nalgebra::try_convert(self).unwrap_or(f64::NAN)
    }
}
