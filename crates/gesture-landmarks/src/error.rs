//! Landmark client error types.

use thiserror::Error;

pub type LandmarkResult<T> = Result<T, LandmarkError>;

#[derive(Debug, Error)]
pub enum LandmarkError {
    #[error("Landmark service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Frame encoding failed: {0}")]
    Encode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LandmarkError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LandmarkError::ServiceUnavailable(_) | LandmarkError::Network(_)
        )
    }
}
