//! Magnitude response of a [`FilterChain`], sampled once per pixel column on a logarithmic
//! frequency axis.
use eqscope_core::geom::{Bounds, RenderPath};
use eqscope_core::math::{gain_to_db, remap, LogRange, MAX_FREQUENCY, MIN_FREQUENCY};
use eqscope_core::Scalar;

use crate::chain::FilterChain;

/// Decibel range drawn by default, as `(min, max)`.
pub const DEFAULT_DB_RANGE: (f32, f32) = (-24.0, 24.0);

/// Floor below which magnitudes are not told apart.
const RESPONSE_FLOOR_DB: f64 = -200.0;

fn frequency_axis() -> LogRange<f64> {
    LogRange::new(10.0, MIN_FREQUENCY, MAX_FREQUENCY)
}

/// Frequency, in Hz, displayed at pixel column `x` of a curve `width` pixels wide.
///
/// Column 0 maps to 20 Hz, column `width` to 20 kHz, logarithmically in between.
pub fn pixel_to_frequency(x: f64, width: f64) -> f64 {
    frequency_axis().unnormalize(x / width)
}

/// Pixel column, possibly fractional, at which frequency `freq` is displayed. Inverse of
/// [`pixel_to_frequency`].
pub fn frequency_to_pixel(freq: f64, width: f64) -> f64 {
    frequency_axis().normalize(freq) * width
}

/// Response curve of a filter chain, in decibels, one value per pixel column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCurve {
    decibels: Vec<f32>,
}

#[profiling::all_functions]
impl ResponseCurve {
    /// Evaluate the response of `chain` over `width` pixel columns.
    pub fn evaluate<T: Scalar>(chain: &FilterChain<T>, width: usize) -> Self {
        let mut curve = Self::default();
        curve.evaluate_into(chain, width);
        curve
    }

    /// Re-evaluate the response in place, reusing the allocation when possible.
    pub fn evaluate_into<T: Scalar>(&mut self, chain: &FilterChain<T>, width: usize) {
        self.decibels.clear();
        self.decibels.extend((0..width).map(|x| {
            let freq = T::cast_f64(pixel_to_frequency(x as f64, width as f64));
            let db = gain_to_db(chain.magnitude_at(freq), T::cast_f64(RESPONSE_FLOOR_DB));
            db.to_f32()
        }));
    }

    /// Decibel value per pixel column.
    pub fn decibels(&self) -> &[f32] {
        &self.decibels
    }

    /// Number of pixel columns in the curve.
    pub fn width(&self) -> usize {
        self.decibels.len()
    }

    /// Map the curve into `bounds`, with `db_range.1` at the top edge and `db_range.0` at the
    /// bottom edge. Values outside the range are clamped to the edges.
    pub fn to_path(&self, bounds: Bounds, db_range: (f32, f32)) -> RenderPath {
        let (min, max) = db_range;
        if bounds.is_empty() || !(max > min) {
            return RenderPath::default();
        }
        self.decibels
            .iter()
            .enumerate()
            .map(|(x, db)| {
                let y = remap(db.clamp(min, max), (min, max), (bounds.bottom(), bounds.y));
                (bounds.x + x as f32, y)
            })
            .collect()
    }
}
