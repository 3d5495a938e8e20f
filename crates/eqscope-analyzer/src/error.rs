use thiserror::Error;

/// Construction-time errors of the analysis pipeline. These are configuration mistakes; once
/// built, nothing in the pipeline fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Relay blocks must hold at least one sample
    #[error("Relay block size cannot be zero")]
    ZeroBlockSize,
    /// Relay must hold at least one block
    #[error("Relay capacity cannot be zero")]
    ZeroCapacity,
    /// Frame queues must hold at least one element
    #[error("Queue capacity cannot be zero")]
    ZeroQueueCapacity,
    /// Transform sizes are restricted to a few powers of two
    #[error("Unsupported FFT size {0}, expected one of 2048, 4096 or 8192")]
    UnsupportedFftSize(usize),
    /// Blocks larger than the transform would never be analyzed in full
    #[error("Block size {block} is larger than the FFT size {fft}")]
    BlockLargerThanFft {
        /// Relay block size
        block: usize,
        /// Transform size
        fft: usize,
    },
    /// The decibel floor must be a finite, negative value
    #[error("Invalid decibel floor {0}, expected a finite negative value")]
    InvalidDecibelFloor(f32),
}
