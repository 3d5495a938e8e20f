//! Windowed FFT analysis of a rolling mono buffer.
use std::fmt::{self, Formatter};
use std::sync::Arc;

use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use eqscope_core::math::{db_to_gain, gain_to_db};
use eqscope_core::util::shift_in;

use crate::queue::{BoundedQueue, OverflowPolicy};
use crate::window::{multiply_with_window, WindowKind};
use crate::Error;

/// Supported transform sizes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FftOrder {
    /// 2048 points
    Order2048,
    /// 4096 points
    Order4096,
    /// 8192 points
    Order8192,
}

impl FftOrder {
    /// Number of points of the transform.
    pub fn size(self) -> usize {
        match self {
            Self::Order2048 => 2048,
            Self::Order4096 => 4096,
            Self::Order8192 => 8192,
        }
    }
}

impl TryFrom<usize> for FftOrder {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            2048 => Ok(Self::Order2048),
            4096 => Ok(Self::Order4096),
            8192 => Ok(Self::Order8192),
            _ => Err(Error::UnsupportedFftSize(value)),
        }
    }
}

/// Spectral analyzer configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Transform size, one of 2048, 4096 or 8192
    pub fft_size: usize,
    /// Window applied before the transform
    pub window: WindowKind,
    /// Magnitudes are clamped to this level, in dB, before conversion. Also the bottom edge of
    /// the drawn spectrum.
    pub decibel_floor: f32,
    /// Number of frames and paths kept between two refreshes
    pub queue_capacity: usize,
    /// What happens to frames and paths when their queue is full
    pub queue_overflow: OverflowPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            window: WindowKind::BlackmanHarris,
            decibel_floor: -48.0,
            queue_capacity: 5,
            queue_overflow: OverflowPolicy::DropOldest,
        }
    }
}

impl AnalyzerConfig {
    /// Check that an analyzer can be built from this configuration.
    pub fn validate(&self) -> Result<FftOrder, Error> {
        let order = FftOrder::try_from(self.fft_size)?;
        if !(self.decibel_floor.is_finite() && self.decibel_floor < 0.0) {
            return Err(Error::InvalidDecibelFloor(self.decibel_floor));
        }
        if self.queue_capacity == 0 {
            return Err(Error::ZeroQueueCapacity);
        }
        Ok(order)
    }
}

/// Decibel magnitudes of one analysis pass, one value per bin (`fft_size / 2` bins).
#[derive(Clone, PartialEq)]
pub struct SpectrumFrame {
    decibels: Box<[f32]>,
}

impl SpectrumFrame {
    /// Decibel magnitude per bin, starting at DC.
    pub fn decibels(&self) -> &[f32] {
        &self.decibels
    }
}

impl fmt::Debug for SpectrumFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumFrame")
            .field("bins", &self.decibels.len())
            .finish_non_exhaustive()
    }
}

/// Spectral analyzer over a rolling mono buffer.
///
/// Every pushed block is shifted into the buffer, and the whole buffer is analyzed anew, producing
/// one [`SpectrumFrame`]. Frames are queued until popped; on overflow the queue policy applies.
pub struct SpectralAnalyzer {
    order: FftOrder,
    buffer: Box<[f32]>,
    window: Box<[f32]>,
    plan: Arc<dyn RealToComplex<f32>>,
    fft_input: Vec<f32>,
    fft_output: Vec<Complex32>,
    fft_scratch: Vec<Complex32>,
    floor_db: f32,
    floor_gain: f32,
    frames: BoundedQueue<SpectrumFrame>,
}

impl SpectralAnalyzer {
    /// Create a new analyzer from its configuration.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, Error> {
        let order = config.validate()?;
        let size = order.size();
        let window = config.window.generate(size);
        // Unity-gain sine reads 0 dB: compensates both the window energy and the one-sided
        // spectrum
        let compensation = 2.0 / window.iter().sum::<f32>();
        let plan = RealFftPlanner::new().plan_fft_forward(size);
        Ok(Self {
            order,
            buffer: vec![0.0; size].into_boxed_slice(),
            window: window.into_iter().map(|w| w * compensation).collect(),
            fft_input: plan.make_input_vec(),
            fft_output: plan.make_output_vec(),
            fft_scratch: plan.make_scratch_vec(),
            plan,
            floor_db: config.decibel_floor,
            floor_gain: db_to_gain(config.decibel_floor),
            frames: BoundedQueue::new(config.queue_capacity, config.queue_overflow),
        })
    }

    /// Transform size.
    pub fn fft_size(&self) -> usize {
        self.order.size()
    }

    /// Frequency span of one bin, in Hz, at the given sample rate.
    pub fn bin_width(&self, samplerate: f32) -> f32 {
        samplerate / self.fft_size() as f32
    }

    /// Decibel floor of the produced frames.
    pub fn decibel_floor(&self) -> f32 {
        self.floor_db
    }

    /// Shift a new block into the rolling buffer, and analyze the result.
    #[profiling::function]
    pub fn push_block(&mut self, block: &[f32]) {
        shift_in(&mut self.buffer, block);
        if let Some(frame) = self.analyze() {
            self.frames.push(frame);
        }
    }

    /// Pop the oldest queued frame.
    pub fn pop_frame(&mut self) -> Option<SpectrumFrame> {
        self.frames.pop()
    }

    /// Drain the queued frames, returning the most recent one.
    pub fn latest_frame(&mut self) -> Option<SpectrumFrame> {
        self.frames.latest()
    }

    /// Number of queued frames.
    pub fn frames_available(&self) -> usize {
        self.frames.len()
    }

    /// Zero the rolling buffer and drop all queued frames.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.frames.clear();
    }

    fn analyze(&mut self) -> Option<SpectrumFrame> {
        self.fft_input.copy_from_slice(&self.buffer);
        multiply_with_window(&mut self.fft_input, &self.window);
        if let Err(err) = self.plan.process_with_scratch(
            &mut self.fft_input,
            &mut self.fft_output,
            &mut self.fft_scratch,
        ) {
            log::error!("Spectrum analysis failed: {err}");
            return None;
        }

        let bins = self.fft_size() / 2;
        let decibels = self.fft_output[..bins]
            .iter()
            .map(|bin| gain_to_db(bin.norm().max(self.floor_gain), self.floor_db))
            .collect();
        Some(SpectrumFrame { decibels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f32::consts::TAU;

    fn sine(freq: f32, samplerate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / samplerate).sin())
            .collect()
    }

    fn analyze(config: &AnalyzerConfig, signal: &[f32], block_size: usize) -> SpectrumFrame {
        let mut analyzer = SpectralAnalyzer::new(config).unwrap();
        for block in signal.chunks(block_size) {
            analyzer.push_block(block);
        }
        analyzer.latest_frame().unwrap()
    }

    #[rstest]
    #[case(Error::UnsupportedFftSize(1000), AnalyzerConfig { fft_size: 1000, ..Default::default() })]
    #[case(Error::InvalidDecibelFloor(0.0), AnalyzerConfig { decibel_floor: 0.0, ..Default::default() })]
    #[case(Error::ZeroQueueCapacity, AnalyzerConfig { queue_capacity: 0, ..Default::default() })]
    fn test_invalid_config(#[case] expected: Error, #[case] config: AnalyzerConfig) {
        assert_eq!(Some(expected), SpectralAnalyzer::new(&config).err());
    }

    #[rstest]
    fn test_sine_peak_bin(
        #[values(2048, 4096, 8192)] fft_size: usize,
        #[values(100.0, 1e3, 7.5e3)] freq: f32,
        #[values(WindowKind::Hann, WindowKind::BlackmanHarris)] window: WindowKind,
    ) {
        const SAMPLERATE: f32 = 48e3;
        let config = AnalyzerConfig {
            fft_size,
            window,
            ..Default::default()
        };
        let frame = analyze(&config, &sine(freq, SAMPLERATE, fft_size), 512);
        assert_eq!(fft_size / 2, frame.decibels().len());

        let peak = frame
            .decibels()
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap();
        let expected = (freq / (SAMPLERATE / fft_size as f32)).round() as usize;
        assert!(peak.abs_diff(expected) <= 1, "peak at {peak}, expected {expected}");
        // Full-scale sine reads close to 0 dB
        assert!(frame.decibels()[peak] > -3.0 && frame.decibels()[peak] < 0.5);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let config = AnalyzerConfig::default();
        let signal = sine(440.0, 44.1e3, 4096)
            .into_iter()
            .zip(sine(3520.0, 44.1e3, 4096))
            .map(|(a, b)| 0.5 * a + 0.25 * b)
            .collect::<Vec<_>>();
        assert_eq!(analyze(&config, &signal, 256), analyze(&config, &signal, 256));
    }

    #[test]
    fn test_silence_sits_at_floor() {
        let config = AnalyzerConfig {
            decibel_floor: -60.0,
            ..Default::default()
        };
        let frame = analyze(&config, &[0.0; 512], 512);
        assert!(frame.decibels().iter().all(|&db| (db + 60.0).abs() < 1e-3));
    }

    #[test]
    fn test_one_frame_per_block_bounded_by_queue() {
        let config = AnalyzerConfig {
            queue_capacity: 3,
            ..Default::default()
        };
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();
        assert!(analyzer.pop_frame().is_none());
        analyzer.push_block(&[0.1; 128]);
        analyzer.push_block(&[0.2; 128]);
        assert_eq!(2, analyzer.frames_available());
        for _ in 0..5 {
            analyzer.push_block(&[0.3; 128]);
        }
        assert_eq!(3, analyzer.frames_available());
        assert!(analyzer.latest_frame().is_some());
        assert_eq!(0, analyzer.frames_available());
    }
}
