//! Drawing geometry handed to and from the renderer.

/// Axis-aligned rectangle in drawing coordinates. The y axis points downwards, so `y` is the top
/// edge and `y + h` the bottom edge.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Bounds {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Bounds {
    /// Create a new rectangle from its top-left corner and its size.
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Bottom edge of the rectangle.
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Number of whole pixel columns covered by this rectangle.
    pub fn columns(&self) -> usize {
        if self.w.is_finite() && self.w > 0.0 {
            self.w as usize
        } else {
            0
        }
    }

    /// Returns true when nothing can be drawn in this rectangle.
    pub fn is_empty(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }
}

/// Polyline in drawing coordinates, ready to be stroked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPath {
    points: Vec<(f32, f32)>,
}

impl RenderPath {
    /// Create an empty path with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a point to the polyline.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.points.push((x, y));
    }

    /// Remove all points, keeping the allocation.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Points of the polyline, in drawing order.
    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// Number of points in the polyline.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the path has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(f32, f32)> for RenderPath {
    fn from_iter<I: IntoIterator<Item = (f32, f32)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
