#![warn(missing_docs)]
//! # Spectrum analysis for `eqscope`
//!
//! Everything between the real-time audio callback and the spectrum overlay: the lock-free
//! [`relay`] audio blocks cross threads through, the [`spectrum`] analyzer turning them into
//! decibel frames, and the [`path`] builder turning frames into polylines. A [`pipeline`] couples
//! one of each per audio channel.

pub mod path;
pub mod pipeline;
pub mod queue;
pub mod relay;
pub mod spectrum;
pub mod window;

mod error;

pub use error::Error;
