//! Landmark service request/response types.

use gesture_models::Endpoint;
use serde::{Deserialize, Serialize};

/// Tracker settings sent with every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingOptions {
    /// Treat every frame independently instead of tracking across frames.
    pub static_image_mode: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl TrackingOptions {
    /// Settings each endpoint's model was trained against.
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::DetectSection | Endpoint::DetectEmotion => Self {
                static_image_mode: true,
                ..Self::default()
            },
            Endpoint::Predict | Endpoint::DetectFood => Self::default(),
        }
    }
}

/// Request for holistic landmark extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolisticRequest {
    /// Base64 PNG of the RGB frame
    pub image: String,
    #[serde(flatten)]
    pub options: TrackingOptions,
    /// Whether the 468-point face mesh is needed. Iris refinement stays off.
    #[serde(default = "default_true")]
    pub include_face: bool,
}

fn default_true() -> bool {
    true
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
