//! Sequence classifier abstraction.

use std::sync::Arc;

use crate::error::{InferenceError, InferenceResult};
use crate::scaler::StandardScaler;

/// A trained model mapping a window of frames to label probabilities.
///
/// Implementations are synchronous and may block for the duration of the
/// model call; async callers should run them on a blocking thread.
pub trait SequenceClassifier: Send + Sync {
    /// Classify a `[frames * features]` window, oldest frame first.
    fn predict(&self, window: &[f32], frames: usize, features: usize) -> InferenceResult<Vec<f32>>;

    /// Human-readable model description for logs and readiness checks.
    fn describe(&self) -> String;
}

impl<T: SequenceClassifier + ?Sized> SequenceClassifier for Arc<T> {
    fn predict(&self, window: &[f32], frames: usize, features: usize) -> InferenceResult<Vec<f32>> {
        (**self).predict(window, frames, features)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Standardizes the window before handing it to the inner model.
pub struct ScaledClassifier<C> {
    scaler: StandardScaler,
    inner: C,
}

impl<C: SequenceClassifier> ScaledClassifier<C> {
    pub fn new(scaler: StandardScaler, inner: C) -> Self {
        Self { scaler, inner }
    }
}

impl<C: SequenceClassifier> SequenceClassifier for ScaledClassifier<C> {
    fn predict(&self, window: &[f32], frames: usize, features: usize) -> InferenceResult<Vec<f32>> {
        if features != self.scaler.features() {
            return Err(InferenceError::scaling(format!(
                "X has {} features, but the scaler is expecting {} features as input",
                features,
                self.scaler.features()
            )));
        }
        let mut scaled = window.to_vec();
        self.scaler.transform(&mut scaled)?;
        self.inner.predict(&scaled, frames, features)
    }

    fn describe(&self) -> String {
        format!("{} (standardized)", self.inner.describe())
    }
}

/// Check that a window has exactly `frames * features` values.
pub fn check_window(window: &[f32], frames: usize, features: usize) -> InferenceResult<()> {
    let expected = frames * features;
    if window.len() != expected {
        return Err(InferenceError::InputShape {
            expected,
            actual: window.len(),
        });
    }
    Ok(())
}
