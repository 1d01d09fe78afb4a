//! Stabilizer error types.

use thiserror::Error;

/// Invalid stabilizer configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Window size must be at least 1")]
    EmptyWindow,

    #[error("Confidence threshold {0} is outside [0, 1)")]
    Threshold(f32),

    #[error("Repeat limit must be at least 1")]
    RepeatLimit,

    #[error("Unknown window mode: {0}")]
    UnknownMode(String),

    #[error("Unknown repeat policy: {0}")]
    UnknownRepeatPolicy(String),
}

/// Classifier output that cannot be gated.
#[derive(Debug, Error, PartialEq)]
pub enum GateError {
    #[error("Model returned an empty distribution")]
    EmptyDistribution,

    #[error("Model returned {actual} probabilities for {expected} labels")]
    LabelMismatch { expected: usize, actual: usize },

    #[error("Model returned no finite probability")]
    NonFinite,
}
