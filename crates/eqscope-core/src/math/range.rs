use crate::Scalar;

/// Logarithmic range, mapping values between `min` and `max` onto `0..=1` such that equal ratios
/// cover equal distances.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LogRange<T> {
    base: T,
    log_min: T,
    log_max: T,
}

impl<T: Scalar> LogRange<T> {
    /// Create a new logarithmic range. `min` and `max` must be strictly positive.
    pub fn new(base: T, min: T, max: T) -> Self {
        Self {
            base,
            log_min: min.log(base),
            log_max: max.log(base),
        }
    }

    /// Normalize `x` into the `0..=1` range (values outside of `min..=max` map outside of it).
    pub fn normalize(&self, x: T) -> T {
        let x = x.log(self.base);
        (x - self.log_min) / (self.log_max - self.log_min)
    }

    /// Inverse of [`Self::normalize`].
    pub fn unnormalize(&self, x: T) -> T {
        let x = self.log_min + x * (self.log_max - self.log_min);
        self.base.powf(x)
    }
}
