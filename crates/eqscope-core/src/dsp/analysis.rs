//! Frequency response analysis of linear filters.
use nalgebra::{Complex, ComplexField};
use num_traits::{One, Zero};

use crate::math::freq_to_z;
use crate::Scalar;

/// Trait for processes whose transfer function can be evaluated on the z-plane.
///
/// Implementors only have to provide [`DspAnalysis::h_z`]; the frequency and magnitude responses
/// are derived from it by evaluating on the unit circle.
pub trait DspAnalysis {
    /// Type of the values the transfer function is evaluated with.
    type Sample: Scalar;

    /// Evaluate the transfer function at the given z-plane position.
    fn h_z(&self, z: Complex<Self::Sample>) -> Complex<Self::Sample>;

    /// Evaluate the complex frequency response at frequency `f`, for a process running at
    /// `samplerate`. Both values are in Hz.
    fn freq_response(&self, samplerate: Self::Sample, f: Self::Sample) -> Complex<Self::Sample> {
        self.h_z(freq_to_z(samplerate, f))
    }

    /// Linear magnitude of the frequency response at frequency `f`.
    fn magnitude(&self, samplerate: Self::Sample, f: Self::Sample) -> Self::Sample {
        self.freq_response(samplerate, f).modulus()
    }
}

impl<P: DspAnalysis> DspAnalysis for &P {
    type Sample = P::Sample;

    fn h_z(&self, z: Complex<Self::Sample>) -> Complex<Self::Sample> {
        P::h_z(self, z)
    }
}

/// Series connection of processes; the transfer function is the product of the inner transfer
/// functions. An empty series is the identity.
#[derive(Debug, Copy, Clone)]
pub struct Series<C>(pub C);

impl<P: DspAnalysis> DspAnalysis for Series<&[P]> {
    type Sample = P::Sample;

    fn h_z(&self, z: Complex<Self::Sample>) -> Complex<Self::Sample> {
        self.0
            .iter()
            .fold(Complex::new(P::Sample::one(), P::Sample::zero()), |acc, p| {
                acc * p.h_z(z)
            })
    }
}
