//! Per-channel analysis pipelines: relay, analyzer and path builder for one audio channel.
use eqscope_core::dsp::parameter::Samplerate;
use eqscope_core::geom::{Bounds, RenderPath};

use crate::path::PathBuilder;
use crate::relay::RelayConsumer;
use crate::spectrum::{AnalyzerConfig, SpectralAnalyzer};
use crate::Error;

/// Something which gets refreshed periodically by the scheduler.
pub trait Refresh {
    /// Catch up with whatever happened since the last refresh.
    fn refresh(&mut self);
}

/// Analysis pipeline of one audio channel.
///
/// Each refresh drains the relay into the analyzer, turns the produced frames into paths and
/// keeps the most recent path for the renderer. When nothing new came in, the previous path is
/// kept.
pub struct ChannelPipeline {
    name: String,
    consumer: RelayConsumer,
    analyzer: SpectralAnalyzer,
    builder: PathBuilder,
    block: Box<[f32]>,
    bounds: Bounds,
    samplerate: Samplerate,
    path: RenderPath,
    reported_lost: u64,
}

impl ChannelPipeline {
    /// Create a new pipeline reading blocks from `consumer`.
    pub fn new(
        name: impl Into<String>,
        consumer: RelayConsumer,
        config: &AnalyzerConfig,
        samplerate: Samplerate,
    ) -> Result<Self, Error> {
        let analyzer = SpectralAnalyzer::new(config)?;
        if consumer.block_size() > analyzer.fft_size() {
            return Err(Error::BlockLargerThanFft {
                block: consumer.block_size(),
                fft: analyzer.fft_size(),
            });
        }
        Ok(Self {
            name: name.into(),
            block: vec![0.0; consumer.block_size()].into_boxed_slice(),
            consumer,
            analyzer,
            builder: PathBuilder::new(config.queue_capacity, config.queue_overflow),
            bounds: Bounds::default(),
            samplerate,
            path: RenderPath::default(),
            reported_lost: 0,
        })
    }

    /// Name of the channel, used in log messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Most recent path of the channel's spectrum.
    pub fn latest_path(&self) -> &RenderPath {
        &self.path
    }

    /// Set the rectangle the spectrum is drawn in. Takes effect from the next produced path.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Drain the relay without analyzing anything, and clear the current path.
    pub fn discard(&mut self) {
        self.report_losses();
        self.consumer.skip_all();
        self.analyzer.reset();
        self.builder.clear();
        self.path.clear();
    }

    fn report_losses(&mut self) {
        let lost = self.consumer.lost_blocks();
        if lost > self.reported_lost {
            log::warn!(
                "{}: {} audio blocks lost since last refresh",
                self.name,
                lost - self.reported_lost
            );
            self.reported_lost = lost;
        }
    }
}

impl Refresh for ChannelPipeline {
    #[profiling::function]
    fn refresh(&mut self) {
        while self.consumer.pop_into(&mut self.block) {
            self.analyzer.push_block(&self.block);
        }
        self.report_losses();

        let bin_width = self.analyzer.bin_width(self.samplerate.get() as f32);
        let floor = self.analyzer.decibel_floor();
        while let Some(frame) = self.analyzer.pop_frame() {
            self.builder
                .generate(frame.decibels(), self.bounds, bin_width, floor);
        }
        if let Some(path) = self.builder.pull_latest() {
            self.path = path;
        }
    }
}
