//! Landmark extractor abstraction.

use async_trait::async_trait;
use gesture_models::HolisticLandmarks;
use image::RgbImage;

use crate::error::LandmarkResult;
use crate::types::TrackingOptions;

/// Produces pose, face and hand landmarks for a single RGB frame.
#[async_trait]
pub trait LandmarkExtractor: Send + Sync {
    async fn extract(
        &self,
        frame: &RgbImage,
        options: TrackingOptions,
        with_face: bool,
    ) -> LandmarkResult<HolisticLandmarks>;

    /// Whether the extractor is able to serve requests.
    async fn health_check(&self) -> bool;
}
