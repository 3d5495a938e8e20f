//! Configuration of the whole pipeline, loadable from TOML.
//!
//! Every field has a default, so a configuration file only needs to list what it changes:
//!
//! ```toml
//! [analyzer]
//! fft_size = 4096
//!
//! [relay]
//! overflow = "reject_newest"
//!
//! [scheduler]
//! tick_interval_ms = 30
//! ```
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol::fs;

use eqscope_analyzer::relay::RelayConfig;
use eqscope_analyzer::spectrum::AnalyzerConfig;
use eqscope_filters::response::DEFAULT_DB_RANGE;

use crate::Error;

/// Response curve display configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decibel range of the response curve, as `[min, max]`
    pub response_db_range: (f32, f32),
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            response_db_range: DEFAULT_DB_RANGE,
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between two ticks, in milliseconds
    pub tick_interval_ms: u64,
    /// Number of analyzed audio channels
    pub channels: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            channels: 2,
        }
    }
}

impl SchedulerConfig {
    /// Interval between two ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Complete configuration.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqScopeConfig {
    /// Spectral analysis
    pub analyzer: AnalyzerConfig,
    /// Audio block relay, one per channel
    pub relay: RelayConfig,
    /// Response curve display
    pub display: DisplayConfig,
    /// Periodic scheduling
    pub scheduler: SchedulerConfig,
}

impl EqScopeConfig {
    /// Parse a configuration from TOML text. The result is not validated.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize the configuration into TOML text.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read and validate a configuration file.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a pipeline can be built from this configuration.
    pub fn validate(&self) -> Result<(), Error> {
        self.relay.validate()?;
        let order = self.analyzer.validate()?;
        if self.relay.block_size > order.size() {
            return Err(eqscope_analyzer::Error::BlockLargerThanFft {
                block: self.relay.block_size,
                fft: order.size(),
            }
            .into());
        }
        if self.scheduler.channels == 0 {
            return Err(Error::Config("at least one channel is needed".into()));
        }
        if self.scheduler.tick_interval_ms == 0 {
            return Err(Error::Config("tick interval cannot be zero".into()));
        }
        let (min, max) = self.display.response_db_range;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::Config(format!(
                "invalid response decibel range [{min}, {max}]"
            )));
        }

        let relay_samples = self.relay.block_size * self.relay.capacity;
        if relay_samples < order.size() {
            log::warn!(
                "Relay holds {relay_samples} samples, less than one analysis window of {}",
                order.size()
            );
        }
        Ok(())
    }
}
