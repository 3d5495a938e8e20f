#![warn(missing_docs)]
//! # `eqscope`
//!
//! Analysis and visualization pipeline of a parametric equalizer: a lock-free relay carries audio
//! blocks from the real-time thread to a periodic scheduler, which turns them into spectrum paths
//! and rebuilds the filter chain and its response curve whenever parameters change.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use eqscope::params::{EqParam, EqParams};
//! use eqscope::scheduler::Scheduler;
//! use eqscope::{EqScopeConfig, Bounds};
//!
//! let params = Arc::new(EqParams::new(48e3));
//! let (mut scheduler, mut producers) =
//!     Scheduler::new(&EqScopeConfig::default(), params.clone()).unwrap();
//! scheduler.set_bounds(Bounds::new(0.0, 0.0, 600.0, 300.0));
//!
//! // Audio thread
//! producers[0].push(&[0.0; 512]);
//! // UI thread
//! params.set(EqParam::PeakGain, 6.0);
//! // Timer
//! let report = scheduler.tick();
//! assert!(report.rebuilt);
//! assert_eq!(600, scheduler.view().response().width());
//! ```

pub mod config;
pub mod driver;
pub mod params;
pub mod scheduler;

mod error;

pub use config::EqScopeConfig;
pub use eqscope_analyzer as analyzer;
pub use eqscope_core::geom::{Bounds, RenderPath};
pub use eqscope_filters as filters;
pub use error::Error;

/// Core definitions shared by all `eqscope` crates.
pub mod prelude {
    pub use eqscope_core::dsp::analysis::DspAnalysis;
    pub use eqscope_core::dsp::parameter::{ChangeFlag, Samplerate};
    pub use eqscope_core::Scalar;
}
