//! Error types for decoding and inference.

use thiserror::Error;

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Errors that can occur between an uploaded frame and a probability
/// distribution.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Image decoding failed: {0}")]
    Decode(String),

    #[error("Scaling failed: {0}")]
    Scaling(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input shape: expected {expected} values, got {actual}")]
    InputShape { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl InferenceError {
    /// Create a decode failure error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a scaling failure error.
    pub fn scaling(message: impl Into<String>) -> Self {
        Self::Scaling(message.into())
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Returns true if the client sent something undecodable.
    pub fn is_client_error(&self) -> bool {
        matches!(self, InferenceError::Decode(_))
    }
}
