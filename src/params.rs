//! Equalizer parameters, and the interface the scheduler reads them through.
use std::borrow::Cow;

use eqscope_core::dsp::parameter::{ChangeFlag, ParamId, ParamName, ParamStore, Samplerate};
use eqscope_core::math::{MAX_FREQUENCY, MIN_FREQUENCY};
use eqscope_filters::chain::{ChainSettings, Slope};

/// Source of parameter values read by the scheduler.
///
/// Notifications of parameter changes only ever raise the [`ChangeFlag`]; values are pulled as a
/// whole through [`ParameterSource::chain_settings`] when the scheduler decides to rebuild.
pub trait ParameterSource: Send + Sync {
    /// Snapshot of the current filter chain parameters.
    fn chain_settings(&self) -> ChainSettings;

    /// Whether the spectrum analyzer is running.
    fn analyzer_enabled(&self) -> bool;

    /// Shared sample rate of the audio stream.
    fn samplerate(&self) -> &Samplerate;

    /// Flag raised whenever a parameter value changes.
    fn change_flag(&self) -> &ChangeFlag;
}

/// Parameters of the equalizer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EqParam {
    /// Peak center frequency, in Hz
    PeakFreq,
    /// Peak gain, in dB
    PeakGain,
    /// Peak resonance
    PeakQ,
    /// Low-cut frequency, in Hz
    LowCutFreq,
    /// Low-cut slope, as an index into [`Slope::ALL`]
    LowCutSlope,
    /// High-cut frequency, in Hz
    HighCutFreq,
    /// High-cut slope, as an index into [`Slope::ALL`]
    HighCutSlope,
    /// Low-cut stage bypass
    LowCutBypass,
    /// Peak stage bypass
    PeakBypass,
    /// High-cut stage bypass
    HighCutBypass,
    /// Spectrum analyzer toggle
    AnalyzerEnabled,
}

impl EqParam {
    const ALL: [Self; 11] = [
        Self::PeakFreq,
        Self::PeakGain,
        Self::PeakQ,
        Self::LowCutFreq,
        Self::LowCutSlope,
        Self::HighCutFreq,
        Self::HighCutSlope,
        Self::LowCutBypass,
        Self::PeakBypass,
        Self::HighCutBypass,
        Self::AnalyzerEnabled,
    ];

    /// Inclusive range of accepted values.
    pub fn range(self) -> (f32, f32) {
        let freq = (MIN_FREQUENCY as f32, MAX_FREQUENCY as f32);
        match self {
            Self::PeakFreq | Self::LowCutFreq | Self::HighCutFreq => freq,
            Self::PeakGain => (-24.0, 24.0),
            Self::PeakQ => (0.1, 10.0),
            Self::LowCutSlope | Self::HighCutSlope => (0.0, (Slope::ALL.len() - 1) as f32),
            Self::LowCutBypass | Self::PeakBypass | Self::HighCutBypass | Self::AnalyzerEnabled => {
                (0.0, 1.0)
            }
        }
    }

    /// Value the parameter starts out with.
    pub fn default_value(self) -> f32 {
        let defaults = ChainSettings::default();
        match self {
            Self::PeakFreq => defaults.peak_freq,
            Self::PeakGain => defaults.peak_gain_db,
            Self::PeakQ => defaults.peak_q,
            Self::LowCutFreq => defaults.low_cut_freq,
            Self::LowCutSlope => defaults.low_cut_slope.index() as f32,
            Self::HighCutFreq => defaults.high_cut_freq,
            Self::HighCutSlope => defaults.high_cut_slope.index() as f32,
            Self::LowCutBypass | Self::PeakBypass | Self::HighCutBypass => 0.0,
            Self::AnalyzerEnabled => 1.0,
        }
    }
}

impl ParamName for EqParam {
    fn count() -> usize {
        Self::ALL.len()
    }

    fn from_id(value: ParamId) -> Self {
        Self::ALL[value]
    }

    fn into_id(self) -> ParamId {
        self as _
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::PeakFreq => "Peak Freq",
            Self::PeakGain => "Peak Gain",
            Self::PeakQ => "Peak Quality",
            Self::LowCutFreq => "LowCut Freq",
            Self::LowCutSlope => "LowCut Slope",
            Self::HighCutFreq => "HighCut Freq",
            Self::HighCutSlope => "HighCut Slope",
            Self::LowCutBypass => "LowCut Bypassed",
            Self::PeakBypass => "Peak Bypassed",
            Self::HighCutBypass => "HighCut Bypassed",
            Self::AnalyzerEnabled => "Analyzer Enabled",
        })
    }
}

/// Thread-safe equalizer parameter store.
///
/// Any thread may set values; every write raises the change flag, which starts out raised so that
/// the first tick builds the initial chain.
pub struct EqParams {
    store: ParamStore<EqParam>,
    samplerate: Samplerate,
}

impl EqParams {
    /// Create a new store with every parameter at its default value.
    pub fn new(samplerate: f64) -> Self {
        Self {
            store: ParamStore::new(ChangeFlag::raised(), EqParam::default_value),
            samplerate: Samplerate::new(samplerate),
        }
    }

    /// Set a parameter, clamping the value into its range. NaN values are ignored.
    pub fn set(&self, param: EqParam, value: f32) {
        if value.is_nan() {
            log::warn!("Ignoring NaN value for {}", param.name());
            return;
        }
        let (min, max) = param.range();
        let clamped = value.clamp(min, max);
        if clamped != value {
            log::warn!(
                "{}: {value} out of range [{min}, {max}], clamped",
                param.name()
            );
        }
        self.store.set_parameter(param, clamped);
    }

    /// Set a boolean parameter.
    pub fn set_bool(&self, param: EqParam, value: bool) {
        self.store.set_parameter_bool(param, value);
    }

    /// Set a slope parameter.
    pub fn set_slope(&self, param: EqParam, slope: Slope) {
        self.set(param, slope.index() as f32);
    }

    /// Current value of a parameter.
    pub fn get(&self, param: EqParam) -> f32 {
        self.store.get(param)
    }

    /// Current value of a boolean parameter.
    pub fn get_bool(&self, param: EqParam) -> bool {
        self.store.get_bool(param)
    }

    /// Update the sample rate of the audio stream. The chain is rebuilt at the next tick.
    pub fn set_samplerate(&self, samplerate: f64) {
        self.samplerate.set(samplerate);
        self.store.change_flag().raise();
    }
}

impl ParameterSource for EqParams {
    fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            peak_freq: self.get(EqParam::PeakFreq),
            peak_gain_db: self.get(EqParam::PeakGain),
            peak_q: self.get(EqParam::PeakQ),
            low_cut_freq: self.get(EqParam::LowCutFreq),
            low_cut_slope: Slope::from_index(self.get(EqParam::LowCutSlope)),
            high_cut_freq: self.get(EqParam::HighCutFreq),
            high_cut_slope: Slope::from_index(self.get(EqParam::HighCutSlope)),
            low_cut_bypassed: self.get_bool(EqParam::LowCutBypass),
            peak_bypassed: self.get_bool(EqParam::PeakBypass),
            high_cut_bypassed: self.get_bool(EqParam::HighCutBypass),
        }
    }

    fn analyzer_enabled(&self) -> bool {
        self.get_bool(EqParam::AnalyzerEnabled)
    }

    fn samplerate(&self) -> &Samplerate {
        &self.samplerate
    }

    fn change_flag(&self) -> &ChangeFlag {
        self.store.change_flag()
    }
}
