//! Per-feature standardization fitted at training time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// `(x - mean) / scale`, applied to every frame of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f32>, scale: Vec<f32>) -> InferenceResult<Self> {
        if mean.len() != scale.len() {
            return Err(InferenceError::scaling(format!(
                "mean has {} values but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        Ok(Self { mean, scale })
    }

    /// Load `{"mean": [...], "scale": [...]}` from a JSON file.
    pub fn from_json_file(path: &Path) -> InferenceResult<Self> {
        if !path.exists() {
            return Err(InferenceError::model_not_found(path.display().to_string()));
        }
        let raw: StandardScaler = serde_json::from_slice(&std::fs::read(path)?)?;
        Self::new(raw.mean, raw.scale)
    }

    /// Number of features per frame.
    pub fn features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a flattened `[frames * features]` window in place.
    pub fn transform(&self, window: &mut [f32]) -> InferenceResult<()> {
        let features = self.features();
        if features == 0 || window.len() % features != 0 {
            return Err(InferenceError::scaling(format!(
                "X has {} values, which is not a multiple of the {} features the scaler was fitted with",
                window.len(),
                features
            )));
        }

        for frame in window.chunks_exact_mut(features) {
            for ((value, mean), scale) in frame.iter_mut().zip(&self.mean).zip(&self.scale) {
                // Constant features were fitted with zero variance.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                *value = (*value - mean) / scale;
            }
        }
        Ok(())
    }
}
