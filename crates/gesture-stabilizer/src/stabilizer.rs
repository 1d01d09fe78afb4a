//! Per-session stabilizer combining the sequence buffer, the confidence gate
//! and repeat suppression.
//!
//! Classification is split in two phases so the model call can happen
//! outside the stabilizer (e.g. on a blocking thread):
//!
//! 1. [`Stabilizer::push`] appends a frame and either reports that the
//!    window is still filling or hands back the flattened window.
//! 2. [`Stabilizer::resolve`] takes the model's probabilities for that
//!    window and applies the gate and the repeat policy.
//!
//! If the model call fails, `resolve` is simply not called; the frame stays
//! buffered and the prediction state is untouched.

use gesture_models::FeatureVector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulator::{BufferStatus, SequenceAccumulator, WindowMode};
use crate::error::{ConfigError, GateError};
use crate::gate::{ClassificationGate, GateDecision};
use crate::repeat::{PredictionState, RepeatPolicy, RepeatSuppressor, RepeatVerdict};

/// Stabilizer parameters for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Frames per classification window.
    pub window: usize,
    pub mode: WindowMode,
    /// Minimum (exclusive) top probability for a label to count.
    pub threshold: f32,
    pub repeat: RepeatPolicy,
}

impl StabilizerConfig {
    pub fn new(window: usize, mode: WindowMode, threshold: f32, repeat: RepeatPolicy) -> Self {
        Self {
            window,
            mode,
            threshold,
            repeat,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if let RepeatPolicy::Counted { limit } = self.repeat {
            if limit == 0 {
                return Err(ConfigError::RepeatLimit);
            }
        }
        Ok(())
    }
}

/// Outcome of pushing a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Window not full yet.
    Collecting(BufferStatus),
    /// Window full; classify this input and call [`Stabilizer::resolve`].
    Ready(WindowInput),
}

/// Flattened classification window, `frames * features` values, oldest
/// frame first.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInput {
    pub values: Vec<f32>,
    pub frames: usize,
    pub features: usize,
}

/// What the caller should report for a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Still filling the window, or holding a repeated label.
    Collecting { frames_collected: usize },
    /// The model was not confident enough.
    LowConfidence { raw_confidence: f32 },
    /// Confident label dropped as a repeat.
    Suppressed { label: String },
    /// Confident label emitted; the window has been cleared.
    Detected { label: String, confidence: f32 },
}

impl Outcome {
    pub fn label(&self) -> Option<&str> {
        match self {
            Outcome::Detected { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Reported confidence; 0.0 for anything but a detection.
    pub fn confidence(&self) -> f32 {
        match self {
            Outcome::Detected { confidence, .. } => *confidence,
            _ => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Collecting { .. } => "collecting",
            Outcome::LowConfidence { .. } => "low_confidence",
            Outcome::Suppressed { .. } => "suppressed",
            Outcome::Detected { .. } => "detected",
        }
    }
}

/// Buffer, gate and repeat state for one client on one endpoint.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    buffer: SequenceAccumulator,
    gate: ClassificationGate,
    repeats: RepeatSuppressor,
}

impl Stabilizer {
    pub fn new<I, S>(config: &StabilizerConfig, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buffer: SequenceAccumulator::new(config.window, config.mode),
            gate: ClassificationGate::new(labels, config.threshold),
            repeats: RepeatSuppressor::new(config.repeat),
        }
    }

    /// Append a frame.
    pub fn push(&mut self, vector: FeatureVector) -> Step {
        let features = vector.len();
        let status = self.buffer.push(vector);
        debug!(
            frames = status.len,
            capacity = status.capacity,
            "Frame buffered"
        );

        if !status.ready {
            return Step::Collecting(status);
        }

        Step::Ready(WindowInput {
            values: self.buffer.flatten(),
            frames: status.len,
            features,
        })
    }

    /// Apply the gate and repeat policy to the model output for the window
    /// returned by the last [`push`](Self::push).
    pub fn resolve(&mut self, probabilities: &[f32]) -> Result<Outcome, GateError> {
        let (label, confidence) = match self.gate.decide(probabilities)? {
            GateDecision::Rejected { raw_confidence } => {
                return Ok(Outcome::LowConfidence { raw_confidence })
            }
            GateDecision::Confident { label, confidence } => (label, confidence),
        };

        match self.repeats.judge(&label) {
            RepeatVerdict::Emit => {
                self.buffer.clear();
                Ok(Outcome::Detected { label, confidence })
            }
            RepeatVerdict::Hold { .. } => Ok(Outcome::Collecting {
                frames_collected: self.buffer.len(),
            }),
            RepeatVerdict::Drop => Ok(Outcome::Suppressed { label }),
        }
    }

    /// Push a frame and classify synchronously when the window is full.
    pub fn observe<F, E>(&mut self, vector: FeatureVector, classify: F) -> Result<Outcome, E>
    where
        F: FnOnce(&WindowInput) -> Result<Vec<f32>, E>,
        E: From<GateError>,
    {
        match self.push(vector) {
            Step::Collecting(status) => Ok(Outcome::Collecting {
                frames_collected: status.len,
            }),
            Step::Ready(input) => {
                let probabilities = classify(&input)?;
                Ok(self.resolve(&probabilities)?)
            }
        }
    }

    /// Clear the buffer and forget the last label.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.repeats.reset();
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn window(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn prediction_state(&self) -> &PredictionState {
        self.repeats.state()
    }
}
