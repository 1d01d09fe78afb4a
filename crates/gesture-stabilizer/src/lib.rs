//! Sequence stabilization for frame-by-frame classifiers.
//!
//! Raw per-frame classification flickers near decision boundaries. This
//! crate turns a stream of feature vectors into stable labels:
//! - [`SequenceAccumulator`] collects a window of frames (fixed or sliding)
//! - [`ClassificationGate`] applies argmax and a confidence threshold
//! - [`RepeatSuppressor`] holds or drops repeated labels
//! - [`Stabilizer`] ties the three together with one config per endpoint

pub mod accumulator;
pub mod error;
pub mod gate;
pub mod presets;
pub mod repeat;
pub mod stabilizer;

pub use accumulator::{BufferStatus, SequenceAccumulator, WindowMode};
pub use error::{ConfigError, GateError};
pub use gate::{ClassificationGate, GateDecision};
pub use presets::default_config;
pub use repeat::{PredictionState, RepeatPolicy, RepeatSuppressor, RepeatVerdict, DEFAULT_REPEAT_LIMIT};
pub use stabilizer::{Outcome, Stabilizer, StabilizerConfig, Step, WindowInput};
