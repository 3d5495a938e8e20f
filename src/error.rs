use std::io;

use thiserror::Error;

/// Errors raised while configuring or starting the analysis pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// A pipeline component refused its configuration
    #[error("Analyzer configuration error: {0}")]
    Analyzer(#[from] eqscope_analyzer::Error),
    /// Configuration file I/O
    #[error("Configuration I/O Error: {0}")]
    IoError(#[from] io::Error),
    /// Configuration file parsing
    #[error("TOML Parse Error: {0}")]
    TomlError(#[from] toml::de::Error),
    /// Configuration serialization
    #[error("TOML Serialize Error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    /// The scheduler thread panicked, taking the scheduler with it
    #[error("Scheduler thread panicked")]
    DriverPanicked,
}
