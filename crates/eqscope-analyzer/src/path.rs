//! Turning spectrum frames into polylines over a logarithmic frequency axis.
use eqscope_core::geom::{Bounds, RenderPath};
use eqscope_core::math::{remap, LogRange, MAX_FREQUENCY, MIN_FREQUENCY};

use crate::queue::{BoundedQueue, OverflowPolicy};

/// Build the polyline of one spectrum frame inside `bounds`.
///
/// Bins are placed on a 20 Hz - 20 kHz logarithmic axis spanning the width of `bounds`; bins
/// outside of that range (and the DC bin) are skipped. When several bins land on the same pixel
/// column, the loudest one is kept. Magnitudes map linearly from `decibel_floor` (bottom edge) to
/// 0 dB (top edge), and are clamped to that range.
///
/// Empty rectangles, empty frames and non-positive bin widths give an empty path.
#[profiling::function]
pub fn build_path(
    decibels: &[f32],
    bounds: Bounds,
    bin_width: f32,
    decibel_floor: f32,
) -> RenderPath {
    let columns = bounds.columns();
    if bounds.is_empty() || columns == 0 || decibels.is_empty() || !(bin_width > 0.0) {
        return RenderPath::default();
    }

    let axis = LogRange::new(10.0, MIN_FREQUENCY as f32, MAX_FREQUENCY as f32);
    let mut peaks: Vec<Option<f32>> = vec![None; columns];
    for (bin, &db) in decibels.iter().enumerate().skip(1) {
        let freq = bin as f32 * bin_width;
        if !(MIN_FREQUENCY as f32..=MAX_FREQUENCY as f32).contains(&freq) {
            continue;
        }
        let column = ((axis.normalize(freq) * bounds.w) as usize).min(columns - 1);
        let peak = &mut peaks[column];
        *peak = Some(peak.map_or(db, |p| p.max(db)));
    }

    let db_range = (decibel_floor, 0.0);
    let y_range = (bounds.bottom(), bounds.y);
    let mut path = RenderPath::with_capacity(columns);
    for (column, db) in peaks.into_iter().enumerate() {
        // Columns without any bin get no point
        let Some(db) = db else { continue };
        let db = db.clamp(decibel_floor, 0.0);
        path.line_to(bounds.x + column as f32, remap(db, db_range, y_range));
    }
    path
}

/// Produces render paths from spectrum frames, keeping a small queue of them so that the
/// consumer can always skip to the most recent one.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    paths: BoundedQueue<RenderPath>,
}

impl PathBuilder {
    /// Create a new builder keeping at most `capacity` paths.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            paths: BoundedQueue::new(capacity, policy),
        }
    }

    /// Build the path of a frame and queue it.
    pub fn generate(
        &mut self,
        decibels: &[f32],
        bounds: Bounds,
        bin_width: f32,
        decibel_floor: f32,
    ) {
        let path = build_path(decibels, bounds, bin_width, decibel_floor);
        self.paths.push(path);
    }

    /// Number of queued paths.
    pub fn paths_available(&self) -> usize {
        self.paths.len()
    }

    /// Drain the queued paths, returning the most recent one.
    pub fn pull_latest(&mut self) -> Option<RenderPath> {
        self.paths.latest()
    }

    /// Drop all queued paths.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BIN_WIDTH: f32 = 48e3 / 2048.0;

    #[rstest]
    #[case(Bounds::new(0.0, 0.0, 0.0, 0.0))]
    #[case(Bounds::new(10.0, 10.0, 0.0, 200.0))]
    #[case(Bounds::new(0.0, 0.0, 300.0, 0.0))]
    #[case(Bounds::new(0.0, 0.0, f32::NAN, 100.0))]
    fn test_empty_bounds_give_empty_path(#[case] bounds: Bounds) {
        let mut builder = PathBuilder::new(5, OverflowPolicy::DropOldest);
        builder.generate(&[], bounds, BIN_WIDTH, -48.0);
        builder.generate(&[-48.0; 1024], bounds, BIN_WIDTH, -48.0);
        assert_eq!(2, builder.paths_available());
        assert_eq!(Some(RenderPath::default()), builder.pull_latest());
    }

    #[test]
    fn test_empty_frame_gives_empty_path() {
        let path = build_path(&[], Bounds::new(0.0, 0.0, 400.0, 300.0), BIN_WIDTH, -48.0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_stays_in_bounds_and_increases_in_x() {
        let bounds = Bounds::new(5.0, 10.0, 400.0, 300.0);
        let decibels = (0..1024)
            .map(|i| -100.0 + 0.15 * i as f32)
            .collect::<Vec<_>>();
        let path = build_path(&decibels, bounds, BIN_WIDTH, -48.0);
        assert!(!path.is_empty());
        for window in path.points().windows(2) {
            assert!(window[0].0 < window[1].0);
        }
        for &(x, y) in path.points() {
            assert!(x >= bounds.x && x < bounds.x + bounds.w);
            assert!(y >= bounds.y && y <= bounds.bottom());
        }
    }

    #[test]
    fn test_columns_keep_loudest_bin() {
        // The last column covers everything above 10 kHz on a 10 pixel wide plot
        let bounds = Bounds::new(0.0, 0.0, 10.0, 48.0);
        let mut decibels = vec![-48.0; 1024];
        decibels[850] = -6.0;
        let path = build_path(&decibels, bounds, BIN_WIDTH, -48.0);
        let last = *path.points().last().unwrap();
        assert_eq!((9.0, 6.0), last);
    }

    #[test]
    fn test_out_of_range_bins_are_skipped() {
        let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);
        // DC and a bin at 30 kHz only
        let path = build_path(&[0.0, -48.0], bounds, 30e3, -48.0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_pull_latest_discards_intermediate_paths() {
        let mut builder = PathBuilder::new(5, OverflowPolicy::DropOldest);
        let bounds = Bounds::new(0.0, 0.0, 200.0, 100.0);
        builder.generate(&[-48.0; 1024], bounds, BIN_WIDTH, -48.0);
        builder.generate(&[0.0; 1024], bounds, BIN_WIDTH, -48.0);
        let latest = builder.pull_latest().unwrap();
        assert!(latest.points().iter().all(|&(_, y)| y == 0.0));
        assert!(builder.pull_latest().is_none());
    }
}
