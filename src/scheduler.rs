//! Periodic, change-coalescing scheduler.
//!
//! Every tick refreshes the channel pipelines and any extra [`Refresh`] objects, then checks the
//! parameters' change flag: if it was raised, any number of times since the last tick, the filter
//! chain and its response curve are rebuilt exactly once. A new analysis rectangle only re-evaluates
//! the curve of the current chain. Finally the renderer is asked to redraw.
use std::sync::Arc;

use eqscope_analyzer::pipeline::{ChannelPipeline, Refresh};
use eqscope_analyzer::relay::RelayProducer;
use eqscope_core::geom::{Bounds, RenderPath};
use eqscope_filters::chain::{ChainPublisher, ChainReader, FilterChain};
use eqscope_filters::response::ResponseCurve;

use crate::config::EqScopeConfig;
use crate::params::ParameterSource;
use crate::Error;

/// Everything the renderer can draw after a tick.
pub struct View<'a> {
    pipelines: &'a [ChannelPipeline],
    response: &'a ResponseCurve,
    response_path: &'a RenderPath,
    chain: &'a FilterChain<f64>,
}

impl<'a> View<'a> {
    /// Number of analyzed channels.
    pub fn channels(&self) -> usize {
        self.pipelines.len()
    }

    /// Latest spectrum path of each channel.
    pub fn channel_paths(&self) -> impl '_ + Iterator<Item = &'a RenderPath> {
        self.pipelines.iter().map(|p| p.latest_path())
    }

    /// Latest spectrum path of one channel.
    pub fn channel_path(&self, channel: usize) -> Option<&'a RenderPath> {
        self.pipelines.get(channel).map(|p| p.latest_path())
    }

    /// Response curve of the current chain, in decibels per pixel column.
    pub fn response(&self) -> &'a ResponseCurve {
        self.response
    }

    /// Response curve mapped into the analysis rectangle.
    pub fn response_path(&self) -> &'a RenderPath {
        self.response_path
    }

    /// Currently published filter chain.
    pub fn chain(&self) -> &'a FilterChain<f64> {
        self.chain
    }
}

/// Receiver of the scheduler's output, called at the end of every tick.
pub trait Renderer: Send {
    /// Redraw from the current view.
    fn redraw(&mut self, view: &View);
}

impl Renderer for () {
    fn redraw(&mut self, _: &View) {}
}

/// Outcome of a single tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the chain was rebuilt during this tick
    pub rebuilt: bool,
    /// Generation of the currently published chain
    pub generation: u64,
}

/// Owner of the channel pipelines and of the filter chain.
pub struct Scheduler {
    params: Arc<dyn ParameterSource>,
    pipelines: Vec<ChannelPipeline>,
    tickables: Vec<Box<dyn Refresh + Send>>,
    publisher: ChainPublisher<f64>,
    curve: ResponseCurve,
    curve_path: RenderPath,
    bounds: Bounds,
    db_range: (f32, f32),
    curve_dirty: bool,
    renderer: Box<dyn Renderer>,
    ticks: u64,
    rebuilds: u64,
}

impl Scheduler {
    /// Create a new scheduler from a validated configuration.
    ///
    /// Returns the scheduler along with the producer end of each channel's relay, to be handed to
    /// the real-time audio path.
    pub fn new(
        config: &EqScopeConfig,
        params: Arc<dyn ParameterSource>,
    ) -> Result<(Self, Vec<RelayProducer>), Error> {
        config.validate()?;
        let channels = config.scheduler.channels;
        let mut producers = Vec::with_capacity(channels);
        let mut pipelines = Vec::with_capacity(channels);
        for channel in 0..channels {
            let (producer, consumer) = RelayProducer::new(&config.relay)?;
            producers.push(producer);
            pipelines.push(ChannelPipeline::new(
                channel_name(channel, channels),
                consumer,
                &config.analyzer,
                params.samplerate().clone(),
            )?);
        }

        let samplerate = params.samplerate().get();
        let initial = FilterChain::from_settings(&params.chain_settings(), samplerate);
        let scheduler = Self {
            params,
            pipelines,
            tickables: Vec::new(),
            publisher: ChainPublisher::new(initial),
            curve: ResponseCurve::default(),
            curve_path: RenderPath::default(),
            bounds: Bounds::default(),
            db_range: config.display.response_db_range,
            curve_dirty: true,
            renderer: Box::new(()),
            ticks: 0,
            rebuilds: 0,
        };
        Ok((scheduler, producers))
    }

    /// Set the renderer called at the end of each tick.
    pub fn with_renderer(mut self, renderer: impl 'static + Renderer) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Add an object refreshed at every tick, after the channel pipelines.
    pub fn add_tickable(&mut self, tickable: impl 'static + Refresh + Send) {
        self.tickables.push(Box::new(tickable));
    }

    /// Create a reader of the published filter chains, for the audio path.
    pub fn chain_reader(&mut self) -> ChainReader<f64> {
        self.publisher.reader()
    }

    /// Set the analysis rectangle, in which both the spectrum and the response curve are drawn.
    /// The response curve of the current chain is re-evaluated at the next tick, without
    /// rebuilding or republishing the chain.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        for pipeline in &mut self.pipelines {
            pipeline.set_bounds(bounds);
        }
        self.curve_dirty = true;
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Number of chain rebuilds so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Current state, as handed to the renderer.
    pub fn view(&self) -> View {
        View {
            pipelines: &self.pipelines,
            response: &self.curve,
            response_path: &self.curve_path,
            chain: self.publisher.current(),
        }
    }

    /// Run one tick.
    #[profiling::function]
    pub fn tick(&mut self) -> TickReport {
        if self.params.analyzer_enabled() {
            for pipeline in &mut self.pipelines {
                pipeline.refresh();
            }
        } else {
            for pipeline in &mut self.pipelines {
                pipeline.discard();
            }
        }
        for tickable in &mut self.tickables {
            tickable.refresh();
        }

        let rebuilt = self.params.change_flag().take();
        if rebuilt {
            self.rebuild();
        }
        if rebuilt || self.curve_dirty {
            self.update_curve();
        }
        self.ticks += 1;
        let generation = self.publisher.current().generation();
        log::trace!("Tick {} (generation {generation})", self.ticks);

        let view = View {
            pipelines: &self.pipelines,
            response: &self.curve,
            response_path: &self.curve_path,
            chain: self.publisher.current(),
        };
        self.renderer.redraw(&view);
        TickReport {
            rebuilt,
            generation,
        }
    }

    #[profiling::function]
    fn rebuild(&mut self) {
        let settings = self.params.chain_settings();
        let chain = FilterChain::from_settings(&settings, self.params.samplerate().get());
        let generation = self.publisher.publish(chain);
        self.rebuilds += 1;
        log::debug!("Rebuilt filter chain, generation {generation}: {settings:?}");
    }

    #[profiling::function]
    fn update_curve(&mut self) {
        self.curve
            .evaluate_into(self.publisher.current(), self.bounds.columns());
        self.curve_path = self.curve.to_path(self.bounds, self.db_range);
        self.curve_dirty = false;
    }
}

fn channel_name(channel: usize, channels: usize) -> String {
    match (channels, channel) {
        (2, 0) => "left".to_string(),
        (2, 1) => "right".to_string(),
        (1, 0) => "mono".to_string(),
        _ => format!("channel {channel}"),
    }
}
