//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "gesture_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gesture_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "gesture_http_requests_in_flight";

    // Classification metrics
    pub const FRAMES_TOTAL: &str = "gesture_frames_total";
    pub const DETECTIONS_TOTAL: &str = "gesture_detections_total";
    pub const INFERENCE_DURATION_SECONDS: &str = "gesture_inference_duration_seconds";
    pub const LANDMARK_DURATION_SECONDS: &str = "gesture_landmark_duration_seconds";
    pub const ACTIVE_SESSIONS: &str = "gesture_active_sessions";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "gesture_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a processed frame and what the stabilizer made of it.
pub fn record_frame(endpoint: &str, outcome: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::FRAMES_TOTAL, &labels).increment(1);
}

/// Record an emitted label.
pub fn record_detection(endpoint: &str, label: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("label", label.to_string()),
    ];
    counter!(names::DETECTIONS_TOTAL, &labels).increment(1);
}

/// Record model inference duration.
pub fn record_inference_duration(endpoint: &str, duration_secs: f64) {
    let labels = [("endpoint", endpoint.to_string())];
    histogram!(names::INFERENCE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record landmark extraction duration.
pub fn record_landmark_duration(endpoint: &str, duration_secs: f64) {
    let labels = [("endpoint", endpoint.to_string())];
    histogram!(names::LANDMARK_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Update active sessions gauge.
pub fn set_active_sessions(count: usize) {
    gauge!(names::ACTIVE_SESSIONS).set(count as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    // Route template keeps label cardinality bounded
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
