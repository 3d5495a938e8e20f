//! DSP-facing definitions: transfer function analysis and shared parameter values.

pub mod analysis;
pub mod parameter;
