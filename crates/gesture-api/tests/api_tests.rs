//! API integration tests against in-memory landmark and model fakes.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use image::{ImageOutputFormat, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;

use gesture_api::{create_router, ApiConfig, AppState, Classifiers};
use gesture_inference::{InferenceError, InferenceResult, SequenceClassifier};
use gesture_landmarks::{LandmarkError, LandmarkExtractor, LandmarkResult, TrackingOptions};
use gesture_models::{Endpoint, HolisticLandmarks};

/// Reports one left hand for every frame, or fails when told to.
#[derive(Default)]
struct FakeTracker {
    failing: AtomicBool,
    /// Points per reported hand; 0 means a full hand.
    hand_points: AtomicUsize,
    calls: AtomicUsize,
    face_requested: Mutex<Vec<bool>>,
}

#[async_trait]
impl LandmarkExtractor for FakeTracker {
    async fn extract(
        &self,
        _frame: &RgbImage,
        _options: TrackingOptions,
        with_face: bool,
    ) -> LandmarkResult<HolisticLandmarks> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.face_requested.lock().unwrap().push(with_face);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LandmarkError::ServiceUnavailable("tracker down".to_string()));
        }
        let points = match self.hand_points.load(Ordering::SeqCst) {
            0 => 21,
            n => n,
        };
        Ok(HolisticLandmarks {
            left_hand_landmarks: Some(vec![[0.5, 0.5, 0.0]; points]),
            ..HolisticLandmarks::default()
        })
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

/// Returns queued outputs in order, then `fallback`.
struct ScriptedModel {
    queued: Mutex<VecDeque<Result<Vec<f32>, String>>>,
    fallback: Vec<f32>,
    shapes: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedModel {
    fn new(fallback: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            shapes: Mutex::new(Vec::new()),
        })
    }

    fn then(&self, output: Result<Vec<f32>, &str>) {
        self.queued
            .lock()
            .unwrap()
            .push_back(output.map_err(|e| e.to_string()));
    }

    fn calls(&self) -> usize {
        self.shapes.lock().unwrap().len()
    }
}

impl SequenceClassifier for ScriptedModel {
    fn predict(&self, window: &[f32], frames: usize, features: usize) -> InferenceResult<Vec<f32>> {
        assert_eq!(window.len(), frames * features);
        self.shapes.lock().unwrap().push((frames, features));
        match self.queued.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(InferenceError::inference(message)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

struct Harness {
    app: Router,
    tracker: Arc<FakeTracker>,
    predict: Arc<ScriptedModel>,
    section: Arc<ScriptedModel>,
    food: Arc<ScriptedModel>,
    emotion: Arc<ScriptedModel>,
}

fn harness() -> Harness {
    harness_with(|_| {})
}

fn harness_with(configure: impl FnOnce(&mut ApiConfig)) -> Harness {
    let mut config = ApiConfig::default();
    configure(&mut config);

    let tracker = Arc::new(FakeTracker::default());
    // Confident "Food", "music", "Tea" and "Happy" by default
    let predict = ScriptedModel::new(vec![0.01, 0.01, 0.95, 0.02, 0.01]);
    let section = ScriptedModel::new(vec![0.02, 0.96, 0.02]);
    let food = ScriptedModel::new(vec![0.0, 0.0, 0.0, 0.0, 0.1, 0.9]);
    let emotion = ScriptedModel::new(vec![0.99, 0.005, 0.005]);

    let mut classifiers = Classifiers::new();
    classifiers.insert(Endpoint::Predict, predict.clone() as Arc<dyn SequenceClassifier>);
    classifiers.insert(Endpoint::DetectSection, section.clone() as Arc<dyn SequenceClassifier>);
    classifiers.insert(Endpoint::DetectFood, food.clone() as Arc<dyn SequenceClassifier>);
    classifiers.insert(Endpoint::DetectEmotion, emotion.clone() as Arc<dyn SequenceClassifier>);

    let state = AppState::from_parts(config, tracker.clone(), classifiers);

    Harness {
        app: create_router(state, None),
        tracker,
        predict,
        section,
        food,
        emotion,
    }
}

fn set_window(config: &mut ApiConfig, endpoint: Endpoint, window: usize) {
    if let Some(settings) = config.endpoints.get_mut(&endpoint) {
        settings.stabilizer.window = window;
    }
}

fn png_bytes() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(8, 8)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn frame_body() -> String {
    json!({ "image": format!("data:image/png;base64,{}", STANDARD.encode(png_bytes())) })
        .to_string()
}

fn post_json(uri: &str, session: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("X-Session-ID", session)
        .body(Body::from(body))
        .unwrap()
}

fn post_multipart(session: &str, field: &str, data: &[u8]) -> Request<Body> {
    let boundary = "frame-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"frame.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/detect-food")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("X-Session-ID", session)
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn predict_frame(app: &Router, session: &str) -> (StatusCode, Value) {
    send(app, post_json("/api/predict", session, frame_body())).await
}

#[tokio::test]
async fn test_health_endpoints() {
    let h = harness();

    for uri in ["/health", "/healthz"] {
        let (status, body) = send(&h.app, Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    let (status, body) = send(&h.app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    h.tracker.failing.store(true, Ordering::SeqCst);
    let (status, body) = send(&h.app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["landmarks"]["status"], "error");
    assert_eq!(body["checks"]["models"]["status"], "ok");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_image_is_rejected() {
    let h = harness();

    for body in ["", "{}", r#"{"image": ""}"#, "not json"] {
        let (status, json) = send(&h.app, post_json("/api/predict", "s1", body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json, json!({ "error": "No image provided" }));
    }
    assert_eq!(h.tracker.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_rejected() {
    let h = harness();
    let body = json!({ "image": "data:image/png;base64,aGVsbG8gd29ybGQ=" }).to_string();

    let (status, json) = send(&h.app, post_json("/api/detect-emotion", "s1", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Image decoding failed"));
}

#[tokio::test]
async fn test_predict_collects_then_detects() {
    let h = harness();

    for n in 1..=4 {
        let (status, body) = predict_frame(&h.app, "cabin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "prediction": "collecting", "frames_collected": n }));
    }
    assert_eq!(h.predict.calls(), 0);

    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["prediction"], "Food");
    assert!((body["confidence"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    assert_eq!(*h.predict.shapes.lock().unwrap(), vec![(5, 126)]);

    // Emitting clears the window
    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body, json!({ "prediction": "collecting", "frames_collected": 1 }));
}

#[tokio::test]
async fn test_predict_holds_repeated_label() {
    let h = harness_with(|c| set_window(c, Endpoint::Predict, 1));

    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["prediction"], "Food");

    // Two confirmations are held, the third re-emits
    for _ in 0..2 {
        let (_, body) = predict_frame(&h.app, "cabin").await;
        assert_eq!(body, json!({ "prediction": "collecting", "frames_collected": 1 }));
    }
    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["prediction"], "Food");
}

#[tokio::test]
async fn test_predict_low_confidence() {
    let h = harness_with(|c| set_window(c, Endpoint::Predict, 1));
    h.predict.then(Ok(vec![0.2, 0.2, 0.2, 0.2, 0.2]));

    let (status, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "prediction": null, "confidence": 0.0 }));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let h = harness();

    predict_frame(&h.app, "alice").await;
    predict_frame(&h.app, "alice").await;
    let (_, body) = predict_frame(&h.app, "bob").await;
    assert_eq!(body["frames_collected"], 1);
    let (_, body) = predict_frame(&h.app, "alice").await;
    assert_eq!(body["frames_collected"], 3);
}

#[tokio::test]
async fn test_section_distinct_labels() {
    let h = harness_with(|c| set_window(c, Endpoint::DetectSection, 2));
    let request = || post_json("/api/detect-section", "kiosk", frame_body());

    let (_, body) = send(&h.app, request()).await;
    assert_eq!(body, json!({ "prediction": "", "confidence": 0.0 }));

    let (_, body) = send(&h.app, request()).await;
    assert_eq!(body["prediction"], "music");

    // Same label again is dropped
    send(&h.app, request()).await;
    let (_, body) = send(&h.app, request()).await;
    assert_eq!(body, json!({ "prediction": "", "confidence": 0.0 }));
    assert_eq!(h.section.calls(), 2);
}

#[tokio::test]
async fn test_food_multipart_upload() {
    let h = harness_with(|c| set_window(c, Endpoint::DetectFood, 1));

    let (status, body) = send(&h.app, post_multipart("tray", "frame", &png_bytes())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Tea");
    assert_eq!(h.food.calls(), 1);
}

#[tokio::test]
async fn test_food_requires_frame_field() {
    let h = harness();

    let (status, body) = send(&h.app, post_multipart("tray", "image", &png_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No frame sent" }));

    let (status, body) = send(&h.app, post_json("/api/detect-food", "tray", frame_body())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No frame sent" }));
}

#[tokio::test]
async fn test_food_collecting_reports_null() {
    let h = harness();
    let (_, body) = send(&h.app, post_multipart("tray", "frame", &png_bytes())).await;
    assert_eq!(body, json!({ "prediction": null, "confidence": 0.0 }));
}

#[tokio::test]
async fn test_emotion_uses_holistic_features() {
    let h = harness();
    let request = || post_json("/api/detect-emotion", "seat-12", frame_body());

    let (_, body) = send(&h.app, request()).await;
    assert_eq!(body, json!({ "emotion": null, "confidence": 0.0 }));
    send(&h.app, request()).await;

    let (_, body) = send(&h.app, request()).await;
    assert_eq!(body["emotion"], "Happy");
    assert_eq!(*h.emotion.shapes.lock().unwrap(), vec![(3, 1662)]);
    assert!(h.tracker.face_requested.lock().unwrap().iter().all(|f| *f));
}

#[tokio::test]
async fn test_landmark_failure_leaves_buffer_untouched() {
    let h = harness();

    predict_frame(&h.app, "cabin").await;
    h.tracker.failing.store(true, Ordering::SeqCst);
    let (status, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Landmark extraction failed"));

    h.tracker.failing.store(false, Ordering::SeqCst);
    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["frames_collected"], 2);
}

#[tokio::test]
async fn test_malformed_landmarks_are_server_errors() {
    let h = harness();
    h.tracker.hand_points.store(5, Ordering::SeqCst);

    let (status, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Feature extraction failed"));

    // Nothing was buffered
    h.tracker.hand_points.store(0, Ordering::SeqCst);
    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["frames_collected"], 1);
}

#[tokio::test]
async fn test_inference_failure_keeps_frame() {
    let h = harness_with(|c| set_window(c, Endpoint::Predict, 2));
    h.predict.then(Err("bad input"));

    predict_frame(&h.app, "cabin").await;
    let (status, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Prediction error"));

    // The window stayed full, so the next frame classifies right away
    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["prediction"], "Food");
    assert_eq!(h.predict.calls(), 2);
}

#[tokio::test]
async fn test_production_hides_internal_errors() {
    let h = harness_with(|c| {
        c.environment = "production".to_string();
        set_window(c, Endpoint::Predict, 1);
    });
    h.predict.then(Err("tensor shape mismatch"));

    let (status, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_reset_session() {
    let h = harness();

    predict_frame(&h.app, "cabin").await;
    predict_frame(&h.app, "cabin").await;

    let request = Request::delete("/api/sessions/current")
        .header("X-Session-ID", "cabin")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "session": "cabin", "cleared": 1 }));

    let (_, body) = predict_frame(&h.app, "cabin").await;
    assert_eq!(body["frames_collected"], 1);
}

#[tokio::test]
async fn test_response_headers() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::get("/health")
                .header("X-Request-ID", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "req-42");
    assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");
}
