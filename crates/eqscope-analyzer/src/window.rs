//! Analysis windows.
use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

/// Window function applied before the transform.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Raised cosine
    Hann,
    /// 4-term Blackman-Harris, trading a wider main lobe for very low sidelobes
    #[default]
    BlackmanHarris,
}

impl WindowKind {
    /// Generate a symmetric window of the given size.
    pub fn generate(self, size: usize) -> Vec<f32> {
        if size <= 1 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f32;
        (0..size)
            .map(|i| {
                let x = TAU * i as f32 / denom;
                match self {
                    Self::Hann => 0.5 - 0.5 * x.cos(),
                    Self::BlackmanHarris => {
                        0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                            - 0.01168 * (3.0 * x).cos()
                    }
                }
            })
            .collect()
    }
}

/// Multiply `buffer` by `window` in place, sample by sample.
pub fn multiply_with_window(buffer: &mut [f32], window: &[f32]) {
    for (x, w) in buffer.iter_mut().zip(window) {
        *x *= w;
    }
}
