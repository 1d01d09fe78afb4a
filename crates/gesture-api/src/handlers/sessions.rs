//! Session management.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::session::SessionKey;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ResetResponse {
    pub session: String,
    /// Endpoint buffers that were dropped
    pub cleared: usize,
}

/// Forget the caller's buffered frames and last labels on every endpoint.
pub async fn reset_session(
    State(state): State<AppState>,
    session: SessionKey,
) -> Json<ResetResponse> {
    let cleared = state.sessions.remove(&session).await;
    info!(session = %session, cleared, "Session reset");

    Json(ResetResponse {
        session: session.to_string(),
        cleared,
    })
}
