//! Classification handlers.
//!
//! All four endpoints share the same pipeline and differ only in how the
//! frame arrives and how the outcome is rendered.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gesture_models::Endpoint;
use gesture_stabilizer::Outcome;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{self, FrameInput};
use crate::session::SessionKey;
use crate::state::AppState;

/// JSON body carrying a data URL frame.
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// Gesture prediction from a mirrored webcam frame.
pub async fn predict(State(state): State<AppState>, session: SessionKey, body: Bytes) -> Response {
    let result = classify_data_url(&state, Endpoint::Predict, &session, &body).await;
    respond(&state, Endpoint::Predict, result)
}

/// Entertainment section selection.
pub async fn detect_section(
    State(state): State<AppState>,
    session: SessionKey,
    body: Bytes,
) -> Response {
    let result = classify_data_url(&state, Endpoint::DetectSection, &session, &body).await;
    respond(&state, Endpoint::DetectSection, result)
}

/// Food signs, uploaded as a multipart `frame` file.
pub async fn detect_food(
    State(state): State<AppState>,
    session: SessionKey,
    multipart: Option<Multipart>,
) -> Response {
    let result = async {
        let bytes = read_frame_field(multipart).await?;
        let frame = pipeline::decode(FrameInput::Bytes(bytes)).await?;
        pipeline::process_frame(&state, Endpoint::DetectFood, &session, frame).await
    }
    .await;
    respond(&state, Endpoint::DetectFood, result)
}

/// Emotion from face and body landmarks.
pub async fn detect_emotion(
    State(state): State<AppState>,
    session: SessionKey,
    body: Bytes,
) -> Response {
    let result = classify_data_url(&state, Endpoint::DetectEmotion, &session, &body).await;
    respond(&state, Endpoint::DetectEmotion, result)
}

async fn classify_data_url(
    state: &AppState,
    endpoint: Endpoint,
    session: &SessionKey,
    body: &[u8],
) -> ApiResult<Outcome> {
    // A missing or unparseable body is reported the same as a missing field
    let image = serde_json::from_slice::<FrameRequest>(body)
        .ok()
        .and_then(|request| request.image)
        .filter(|image| !image.is_empty())
        .ok_or_else(ApiError::no_image)?;

    let frame = pipeline::decode(FrameInput::DataUrl(image)).await?;
    pipeline::process_frame(state, endpoint, session, frame).await
}

async fn read_frame_field(multipart: Option<Multipart>) -> ApiResult<Bytes> {
    let mut multipart = multipart.ok_or_else(ApiError::no_frame)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some("frame") {
            return field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()));
        }
    }

    Err(ApiError::no_frame())
}

fn respond(state: &AppState, endpoint: Endpoint, result: ApiResult<Outcome>) -> Response {
    match result {
        Ok(outcome) => Json(render(endpoint, &outcome)).into_response(),
        Err(err) => err.into_response_for(state.config.is_production()),
    }
}

/// Response body for an outcome, in each endpoint's established shape.
pub fn render(endpoint: Endpoint, outcome: &Outcome) -> Value {
    if let Outcome::Detected { label, confidence } = outcome {
        let key = match endpoint {
            Endpoint::DetectEmotion => "emotion",
            _ => "prediction",
        };
        return json!({ key: label, "confidence": confidence });
    }

    match (endpoint, outcome) {
        (Endpoint::Predict, Outcome::Collecting { frames_collected }) => {
            json!({ "prediction": "collecting", "frames_collected": frames_collected })
        }
        (Endpoint::DetectSection, _) => json!({ "prediction": "", "confidence": 0.0 }),
        (Endpoint::DetectEmotion, _) => json!({ "emotion": null, "confidence": 0.0 }),
        _ => json!({ "prediction": null, "confidence": 0.0 }),
    }
}
