//! The equalizer's filter chain: a low-cut stage, a peak stage and a high-cut stage.
//!
//! A [`FilterChain`] is an immutable value computed in one go from a [`ChainSettings`] snapshot.
//! It is never edited in place: a [`ChainPublisher`] hands complete chains over to any number of
//! [`ChainReader`]s, each of which sees either the previous chain or the new one in full.
use nalgebra::Complex;
use num_traits::{One, Zero};
use triple_buffer::TripleBuffer;

use eqscope_core::dsp::analysis::DspAnalysis;
use eqscope_core::Scalar;

use crate::biquad::design::{butterworth_highpass, butterworth_lowpass};
use crate::biquad::Biquad;

/// Maximum number of second-order sections in a cut stage.
pub const MAX_CUT_SECTIONS: usize = 4;

/// Lowest frequency, in Hz, any stage is designed at.
pub const MIN_DESIGN_FREQUENCY: f64 = 1.0;
/// Lowest sample rate, in Hz, coefficients are designed for.
pub const MIN_SAMPLERATE: f64 = 1.0;

/// Steepness of a cut stage.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Slope {
    /// 12 dB/octave, one section
    #[default]
    Db12,
    /// 24 dB/octave, two sections
    Db24,
    /// 36 dB/octave, three sections
    Db36,
    /// 48 dB/octave, four sections
    Db48,
}

impl Slope {
    /// All slopes, in increasing steepness.
    pub const ALL: [Self; 4] = [Self::Db12, Self::Db24, Self::Db36, Self::Db48];

    /// Slope from its index in [`Self::ALL`]. Out-of-range and non-finite values are clamped.
    pub fn from_index(index: f32) -> Self {
        if !index.is_finite() {
            return Self::default();
        }
        let i = index.round().clamp(0.0, (Self::ALL.len() - 1) as f32) as usize;
        Self::ALL[i]
    }

    /// Index of this slope in [`Self::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Number of active second-order sections.
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    /// Rolloff, in dB per octave.
    pub fn db_per_octave(self) -> u32 {
        12 * self.sections() as u32
    }
}

/// Immutable snapshot of the parameter values a chain is built from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChainSettings {
    /// Peak center frequency, in Hz
    pub peak_freq: f32,
    /// Peak gain, in dB
    pub peak_gain_db: f32,
    /// Peak resonance
    pub peak_q: f32,
    /// Low-cut frequency, in Hz
    pub low_cut_freq: f32,
    /// Low-cut steepness
    pub low_cut_slope: Slope,
    /// High-cut frequency, in Hz
    pub high_cut_freq: f32,
    /// High-cut steepness
    pub high_cut_slope: Slope,
    /// Whether the low-cut stage is bypassed
    pub low_cut_bypassed: bool,
    /// Whether the peak stage is bypassed
    pub peak_bypassed: bool,
    /// Whether the high-cut stage is bypassed
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_q: 1.0,
            low_cut_freq: 20.0,
            low_cut_slope: Slope::Db12,
            high_cut_freq: 20e3,
            high_cut_slope: Slope::Db12,
            low_cut_bypassed: false,
            peak_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}

/// A biquad section, along with its bypass flag.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Section<T> {
    /// Coefficients of the section
    pub biquad: Biquad<T>,
    /// Bypassed sections do not contribute to the chain
    pub bypassed: bool,
}

impl<T: Scalar> Section<T> {
    fn active(biquad: Biquad<T>) -> Self {
        Self {
            biquad,
            bypassed: false,
        }
    }

    fn inactive() -> Self {
        Self {
            biquad: Biquad::identity(),
            bypassed: true,
        }
    }
}

/// A stage of `N` sections, which can be bypassed as a whole.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stage<T, const N: usize> {
    sections: [Section<T>; N],
    bypassed: bool,
}

impl<T: Scalar, const N: usize> Stage<T, N> {
    /// Build a stage from at most `N` designed sections. The remaining sections are bypassed.
    pub fn from_sections(designed: impl IntoIterator<Item = Biquad<T>>, bypassed: bool) -> Self {
        let mut sections = [Section::inactive(); N];
        for (section, biquad) in sections.iter_mut().zip(designed) {
            *section = Section::active(biquad);
        }
        Self { sections, bypassed }
    }

    /// Whether the whole stage is bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// All sections, bypassed or not.
    pub fn sections(&self) -> &[Section<T>; N] {
        &self.sections
    }

    /// Sections taking part in processing. Empty when the whole stage is bypassed.
    pub fn active_sections(&self) -> impl Iterator<Item = &Biquad<T>> {
        let bypassed = self.bypassed;
        self.sections
            .iter()
            .filter(move |s| !bypassed && !s.bypassed)
            .map(|s| &s.biquad)
    }
}

impl<T: Scalar, const N: usize> DspAnalysis for Stage<T, N> {
    type Sample = T;

    fn h_z(&self, z: Complex<Self::Sample>) -> Complex<Self::Sample> {
        self.active_sections()
            .fold(Complex::new(T::one(), T::zero()), |acc, s| acc * s.h_z(z))
    }
}

/// Complete filter chain, in processing order: low-cut, peak, high-cut.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FilterChain<T> {
    /// Low-cut (highpass) stage
    pub low_cut: Stage<T, MAX_CUT_SECTIONS>,
    /// Peak (bell) stage
    pub peak: Stage<T, 1>,
    /// High-cut (lowpass) stage
    pub high_cut: Stage<T, MAX_CUT_SECTIONS>,
    samplerate: T,
    generation: u64,
}

#[profiling::all_functions]
impl<T: Scalar> FilterChain<T> {
    /// Compute all coefficients of the chain from the given settings, for the given sample rate.
    ///
    /// Degenerate values (non-positive or non-finite frequencies, Q or sample rate) are clamped
    /// before design; this never fails.
    pub fn from_settings(settings: &ChainSettings, samplerate: f64) -> Self {
        let samplerate = if samplerate.is_finite() {
            samplerate.max(MIN_SAMPLERATE)
        } else {
            MIN_SAMPLERATE
        };
        // Upper bound is applied by the designs themselves, at 0.49 * samplerate
        let normalize = |freq: f32| {
            let freq = freq as f64;
            let freq = if freq.is_nan() {
                MIN_DESIGN_FREQUENCY
            } else {
                freq.max(MIN_DESIGN_FREQUENCY)
            };
            T::cast_f64(freq / samplerate)
        };

        let amp = T::cast_f64(10f64.powf(settings.peak_gain_db as f64 / 40.0));
        let peak = Biquad::peaking(
            normalize(settings.peak_freq),
            T::cast_f64(settings.peak_q as f64),
            amp,
        );
        let low_cut = butterworth_highpass(
            normalize(settings.low_cut_freq),
            settings.low_cut_slope.sections(),
        );
        let high_cut = butterworth_lowpass(
            normalize(settings.high_cut_freq),
            settings.high_cut_slope.sections(),
        );

        Self {
            low_cut: Stage::from_sections(low_cut, settings.low_cut_bypassed),
            peak: Stage::from_sections([peak], settings.peak_bypassed),
            high_cut: Stage::from_sections(high_cut, settings.high_cut_bypassed),
            samplerate: T::cast_f64(samplerate),
            generation: 0,
        }
    }

    /// Sample rate the coefficients were designed for.
    pub fn samplerate(&self) -> T {
        self.samplerate
    }

    /// Publication number of this chain; 0 for chains which were never published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Magnitude response of the chain at frequency `f` (in Hz), as a linear gain.
    pub fn magnitude_at(&self, f: T) -> T {
        self.magnitude(self.samplerate, f)
    }
}

impl<T: Scalar> Default for FilterChain<T> {
    fn default() -> Self {
        Self::from_settings(&ChainSettings::default(), 44.1e3)
    }
}

impl<T: Scalar> DspAnalysis for FilterChain<T> {
    type Sample = T;

    fn h_z(&self, z: Complex<Self::Sample>) -> Complex<Self::Sample> {
        // Bypassed stages contribute no sections, so they drop out of the product
        self.low_cut.h_z(z) * self.peak.h_z(z) * self.high_cut.h_z(z)
    }
}

/// Single writer of filter chains, publishing to any number of [`ChainReader`]s.
pub struct ChainPublisher<T: Send> {
    current: FilterChain<T>,
    inputs: Vec<triple_buffer::Input<FilterChain<T>>>,
}

impl<T: Scalar + Send> ChainPublisher<T> {
    /// Create a new publisher, with `initial` as the chain readers start out with.
    pub fn new(initial: FilterChain<T>) -> Self {
        Self {
            current: initial,
            inputs: Vec::new(),
        }
    }

    /// Create a new reader, starting out with the last published chain.
    pub fn reader(&mut self) -> ChainReader<T> {
        let (input, output) = TripleBuffer::new(&self.current).split();
        self.inputs.push(input);
        ChainReader { output }
    }

    /// Publish a new chain to every reader, returning its generation number.
    pub fn publish(&mut self, mut chain: FilterChain<T>) -> u64 {
        chain.generation = self.current.generation + 1;
        for input in &mut self.inputs {
            input.write(chain);
        }
        self.current = chain;
        chain.generation
    }

    /// The last published chain.
    pub fn current(&self) -> &FilterChain<T> {
        &self.current
    }
}

/// Read side of a [`ChainPublisher`]. Reading never blocks nor allocates, and always returns a
/// complete chain.
pub struct ChainReader<T: Send> {
    output: triple_buffer::Output<FilterChain<T>>,
}

impl<T: Scalar + Send> ChainReader<T> {
    /// Fetch the latest published chain.
    pub fn read(&mut self) -> &FilterChain<T> {
        self.output.read()
    }

    /// Returns true if a chain was published since the last read.
    pub fn updated(&self) -> bool {
        self.output.updated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqscope_core::math::gain_to_db;
    use rstest::rstest;
    use std::thread;

    const SAMPLERATE: f64 = 48e3;

    fn db(chain: &FilterChain<f64>, f: f64) -> f64 {
        gain_to_db(chain.magnitude_at(f), -400.0)
    }

    #[rstest]
    fn test_rebuild_is_deterministic(
        #[values(Slope::Db12, Slope::Db48)] slope: Slope,
        #[values(-24.0, 0.0, 12.5)] gain: f32,
    ) {
        let settings = ChainSettings {
            peak_gain_db: gain,
            low_cut_slope: slope,
            high_cut_slope: slope,
            low_cut_freq: 80.0,
            high_cut_freq: 12e3,
            ..Default::default()
        };
        let a = FilterChain::<f64>::from_settings(&settings, SAMPLERATE);
        let b = FilterChain::<f64>::from_settings(&settings, SAMPLERATE);
        assert_eq!(a, b);
    }

    #[rstest]
    fn test_sections_beyond_slope_are_bypassed(
        #[values(Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48)] slope: Slope,
    ) {
        let settings = ChainSettings {
            low_cut_slope: slope,
            ..Default::default()
        };
        let chain = FilterChain::<f64>::from_settings(&settings, SAMPLERATE);
        let bypassed = chain
            .low_cut
            .sections()
            .iter()
            .map(|s| s.bypassed)
            .collect::<Vec<_>>();
        let expected = (0..MAX_CUT_SECTIONS)
            .map(|i| i >= slope.sections())
            .collect::<Vec<_>>();
        assert_eq!(expected, bypassed);
        assert_eq!(slope.sections(), chain.low_cut.active_sections().count());
    }

    #[test]
    fn test_all_bypassed_is_flat() {
        let settings = ChainSettings {
            peak_gain_db: 18.0,
            low_cut_freq: 2e3,
            high_cut_freq: 3e3,
            low_cut_slope: Slope::Db48,
            low_cut_bypassed: true,
            peak_bypassed: true,
            high_cut_bypassed: true,
            ..Default::default()
        };
        let chain = FilterChain::<f64>::from_settings(&settings, SAMPLERATE);
        assert!(chain.low_cut.is_bypassed());
        assert!(chain.peak.is_bypassed());
        assert!(chain.high_cut.is_bypassed());
        for f in [20.0, 100.0, 1e3, 2e3, 3e3, 19e3] {
            assert_eq!(0.0, db(&chain, f));
        }
    }

    #[test]
    fn test_low_cut_attenuation() {
        let fc = 1e3;
        let settings = ChainSettings {
            low_cut_freq: fc as f32,
            low_cut_slope: Slope::Db24,
            peak_bypassed: true,
            high_cut_bypassed: true,
            ..Default::default()
        };
        let chain = FilterChain::<f64>::from_settings(&settings, SAMPLERATE);
        assert!(db(&chain, 0.1 * fc) <= db(&chain, 10.0 * fc) - 20.0);
    }

    #[test]
    fn test_peak_gain_at_center() {
        let settings = ChainSettings {
            peak_freq: 2e3,
            peak_gain_db: -9.0,
            peak_q: 2.0,
            low_cut_bypassed: true,
            high_cut_bypassed: true,
            ..Default::default()
        };
        let chain = FilterChain::<f64>::from_settings(&settings, SAMPLERATE);
        assert!((db(&chain, 2e3) + 9.0).abs() < 1e-4);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(-100.0, f32::NAN, -5.0)]
    #[case(f32::INFINITY, 1.0, 1e9)]
    fn test_degenerate_settings_produce_finite_chain(
        #[case] freq: f32,
        #[case] q: f32,
        #[case] samplerate: f64,
    ) {
        let settings = ChainSettings {
            peak_freq: freq,
            peak_q: q,
            low_cut_freq: freq,
            high_cut_freq: freq,
            ..Default::default()
        };
        let chain = FilterChain::<f64>::from_settings(&settings, samplerate);
        let sections = chain
            .low_cut
            .sections()
            .iter()
            .chain(chain.peak.sections())
            .chain(chain.high_cut.sections());
        for section in sections {
            assert!(section.biquad.coefficients().iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_slope_from_index() {
        assert_eq!(Slope::Db12, Slope::from_index(-3.0));
        assert_eq!(Slope::Db36, Slope::from_index(2.2));
        assert_eq!(Slope::Db48, Slope::from_index(17.0));
        assert_eq!(Slope::Db12, Slope::from_index(f32::NAN));
        assert_eq!(48, Slope::Db48.db_per_octave());
    }

    #[test]
    fn test_publish_reaches_every_reader() {
        let mut publisher = ChainPublisher::new(FilterChain::<f64>::default());
        let mut audio = publisher.reader();
        let mut display = publisher.reader();
        assert_eq!(0, audio.read().generation());

        let settings = ChainSettings {
            peak_gain_db: 6.0,
            ..Default::default()
        };
        let generation = publisher.publish(FilterChain::from_settings(&settings, SAMPLERATE));
        assert_eq!(1, generation);
        assert!(audio.updated());
        assert_eq!(publisher.current(), audio.read());
        assert_eq!(publisher.current(), display.read());
        assert!(!audio.updated());
    }

    #[test]
    fn test_readers_never_observe_mixed_chains() {
        let old = ChainSettings {
            peak_gain_db: -12.0,
            low_cut_slope: Slope::Db12,
            ..Default::default()
        };
        let new = ChainSettings {
            peak_gain_db: 12.0,
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let old_chain = FilterChain::<f64>::from_settings(&old, SAMPLERATE);
        let new_chain = FilterChain::<f64>::from_settings(&new, SAMPLERATE);

        let mut publisher = ChainPublisher::new(old_chain);
        let mut reader = publisher.reader();
        let handle = thread::spawn(move || {
            for _ in 0..10_000 {
                let chain = reader.read();
                let peak_is_new = chain.peak.sections()[0] == new_chain.peak.sections()[0];
                let cut_is_new = chain.low_cut.sections() == new_chain.low_cut.sections();
                assert_eq!(peak_is_new, cut_is_new);
            }
        });
        for i in 0..1000 {
            let chain = if i % 2 == 0 { new_chain } else { old_chain };
            publisher.publish(chain);
        }
        handle.join().unwrap();
    }
}
