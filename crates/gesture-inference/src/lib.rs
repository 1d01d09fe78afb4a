//! Frame decoding and sequence classifiers.
//!
//! This crate provides:
//! - Data URL / multipart frame decoding into RGB images
//! - The [`SequenceClassifier`] trait and its ONNX Runtime implementation
//! - Feature standardization for models trained on scaled inputs

pub mod classifier;
pub mod error;
pub mod frame;
pub mod onnx;
pub mod scaler;

pub use classifier::{check_window, ScaledClassifier, SequenceClassifier};
pub use error::{InferenceError, InferenceResult};
pub use onnx::OnnxClassifier;
pub use scaler::StandardScaler;
