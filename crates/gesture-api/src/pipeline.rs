//! Frame processing shared by every classification endpoint.
//!
//! decode → (mirror) → landmarks → feature vector → stabilizer → model

use std::time::Instant;

use axum::body::Bytes;
use gesture_inference::frame::{decode_bytes, decode_data_url, mirror};
use gesture_landmarks::TrackingOptions;
use gesture_models::Endpoint;
use gesture_stabilizer::{Outcome, Step};
use image::RgbImage;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::session::SessionKey;
use crate::state::AppState;

/// An encoded frame as uploaded by the client.
#[derive(Debug, Clone)]
pub enum FrameInput {
    /// `data:image/...;base64,...`
    DataUrl(String),
    /// Raw encoded image bytes from a multipart upload.
    Bytes(Bytes),
}

/// Decode a frame off the async runtime.
pub async fn decode(input: FrameInput) -> ApiResult<RgbImage> {
    let decoded = tokio::task::spawn_blocking(move || match input {
        FrameInput::DataUrl(url) => decode_data_url(&url),
        FrameInput::Bytes(bytes) => decode_bytes(&bytes),
    })
    .await
    .map_err(|e| ApiError::internal(format!("decode task failed: {e}")))?;

    Ok(decoded?)
}

/// Run one decoded frame through the caller's stabilizer for `endpoint`.
///
/// The session lock is held until the outcome is resolved. Failures before
/// the frame is buffered (landmarks, features) leave the session untouched;
/// a failed model call leaves the frame buffered.
pub async fn process_frame(
    state: &AppState,
    endpoint: Endpoint,
    session: &SessionKey,
    frame: RgbImage,
) -> ApiResult<Outcome> {
    let frame = if endpoint.mirrors_input() {
        mirror(&frame)
    } else {
        frame
    };

    let classifier = state
        .classifier(endpoint)
        .ok_or_else(|| ApiError::internal(format!("no model loaded for {endpoint}")))?;

    let stabilizer = state.sessions.get_or_create(endpoint, session).await;
    let mut stabilizer = stabilizer.lock().await;

    let layout = endpoint.layout();
    let started = Instant::now();
    let landmarks = state
        .extractor
        .extract(&frame, TrackingOptions::for_endpoint(endpoint), layout.uses_face())
        .await?;
    metrics::record_landmark_duration(endpoint.as_str(), started.elapsed().as_secs_f64());

    let vector = layout.extract(&landmarks)?;

    let outcome = match stabilizer.push(vector) {
        Step::Collecting(status) => {
            debug!(
                endpoint = %endpoint,
                session = %session,
                frames = status.len,
                window = status.capacity,
                "Collecting frames"
            );
            Outcome::Collecting {
                frames_collected: status.len,
            }
        }
        Step::Ready(input) => {
            let started = Instant::now();
            let probabilities = tokio::task::spawn_blocking(move || {
                classifier.predict(&input.values, input.frames, input.features)
            })
            .await
            .map_err(|e| ApiError::internal(format!("inference task failed: {e}")))??;
            metrics::record_inference_duration(endpoint.as_str(), started.elapsed().as_secs_f64());

            stabilizer.resolve(&probabilities)?
        }
    };

    metrics::record_frame(endpoint.as_str(), outcome.as_str());
    match &outcome {
        Outcome::Detected { label, confidence } => {
            info!(
                endpoint = %endpoint,
                session = %session,
                label = %label,
                confidence = %confidence,
                "Detected"
            );
            metrics::record_detection(endpoint.as_str(), label);
        }
        Outcome::LowConfidence { raw_confidence } => {
            debug!(endpoint = %endpoint, session = %session, raw_confidence, "Below threshold");
        }
        Outcome::Suppressed { label } => {
            debug!(endpoint = %endpoint, session = %session, label = %label, "Repeat suppressed");
        }
        Outcome::Collecting { .. } => {}
    }

    Ok(outcome)
}
