//! ONNX Runtime-backed sequence classifier.
//!
//! Models take a `[1, frames, features]` float32 tensor and return
//! `[1, labels]` probabilities (softmax already applied in the graph).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::classifier::{check_window, SequenceClassifier};
use crate::error::{InferenceError, InferenceResult};

/// ONNX sequence classifier.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load a model from disk.
    ///
    /// Returns error if the file doesn't exist or cannot be loaded.
    pub fn load(model_path: &Path) -> InferenceResult<Self> {
        if !model_path.exists() {
            return Err(InferenceError::model_not_found(
                model_path.display().to_string(),
            ));
        }

        let session = create_session(model_path)?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::ModelLoad("model declares no outputs".to_string()))?;

        info!(
            model_path = %model_path.display(),
            output = %output_name,
            "Sequence classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn to_tensor(window: &[f32], frames: usize, features: usize) -> InferenceResult<Value> {
        let shape = vec![1usize, frames, features];
        Tensor::from_array((shape, window.to_vec().into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| InferenceError::inference(format!("Failed to create tensor: {}", e)))
    }
}

impl SequenceClassifier for OnnxClassifier {
    fn predict(&self, window: &[f32], frames: usize, features: usize) -> InferenceResult<Vec<f32>> {
        check_window(window, frames, features)?;
        let input = Self::to_tensor(window, frames, features)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::inference("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| InferenceError::inference(format!("ONNX inference failed: {}", e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| InferenceError::inference(format!("Missing {} tensor", self.output_name)))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::inference(format!("Failed to extract tensor: {}", e)))?;

        // Accept [1, labels] or [labels].
        let labels = match shape.len() {
            2 if shape[0] == 1 => shape[1] as usize,
            1 => shape[0] as usize,
            _ => {
                return Err(InferenceError::inference(format!(
                    "Unexpected classifier output shape: {:?}",
                    shape
                )))
            }
        };

        debug!(frames, features, labels, "Classifier run complete");
        Ok(data.iter().take(labels).copied().collect())
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.model_path.display())
    }
}

/// Create an ONNX Runtime session, preferring an accelerator when built
/// with one.
fn create_session(model_path: &Path) -> InferenceResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| InferenceError::ModelLoad(format!("Failed to read model file: {}", e)))?;

    let builder = Session::builder()
        .map_err(|e| InferenceError::ModelLoad(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| InferenceError::ModelLoad(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for sequence classifier");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, using CPU");
    }

    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| InferenceError::ModelLoad(format!("Failed to load ONNX model: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_reported() {
        let err = OnnxClassifier::load(Path::new("/nonexistent/model.onnx")).err().unwrap();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
    }
}
