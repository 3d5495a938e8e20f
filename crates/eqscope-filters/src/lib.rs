#![warn(missing_docs)]
//! # Filters for `eqscope`
//!
//! Coefficient design for the equalizer's filter chain, the chain itself and its publication to
//! concurrent readers, and the evaluation of its magnitude response for display.

pub mod biquad;
pub mod chain;
pub mod response;
