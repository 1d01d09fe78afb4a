//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gesture_inference::InferenceError;
use gesture_landmarks::LandmarkError;
use gesture_models::FeatureError;
use gesture_stabilizer::GateError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request carried no frame at all.
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Image decoding failed: {0}")]
    Decode(String),

    #[error("Scaling failed: {0}")]
    Preprocessing(String),

    #[error("Feature extraction failed: {0}")]
    Features(String),

    #[error("Landmark extraction failed: {0}")]
    Landmarks(String),

    #[error("Prediction error: {0}")]
    Inference(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn no_image() -> Self {
        Self::MissingInput("No image provided")
    }

    pub fn no_frame() -> Self {
        Self::MissingInput("No frame sent")
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInput(_) | ApiError::BadRequest(_) | ApiError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Landmarks(_) => StatusCode::BAD_GATEWAY,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Preprocessing(_)
            | ApiError::Features(_)
            | ApiError::Inference(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text, with server-side details hidden when `production` is set.
    fn message(&self, production: bool) -> String {
        if production && self.status_code().is_server_error() {
            return match self {
                ApiError::Landmarks(_) => "Landmark extraction failed".to_string(),
                _ => "Internal server error".to_string(),
            };
        }
        self.to_string()
    }

    /// Render with an explicit environment flag.
    pub fn into_response_for(self, production: bool) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, "{:?}", self);
        }
        let body = ErrorResponse {
            error: self.message(production),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Don't expose internal error details in production
        let production = std::env::var("ENVIRONMENT")
            .map(|e| e.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        self.into_response_for(production)
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Decode(msg) => ApiError::Decode(msg),
            InferenceError::Scaling(msg) => ApiError::Preprocessing(msg),
            other => ApiError::Inference(other.to_string()),
        }
    }
}

impl From<LandmarkError> for ApiError {
    fn from(err: LandmarkError) -> Self {
        ApiError::Landmarks(err.to_string())
    }
}

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        ApiError::Features(err.to_string())
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        ApiError::Inference(err.to_string())
    }
}
