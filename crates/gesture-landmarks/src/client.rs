//! Landmark service HTTP client.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gesture_models::HolisticLandmarks;
use image::{ImageOutputFormat, RgbImage};
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{LandmarkError, LandmarkResult};
use crate::extractor::LandmarkExtractor;
use crate::types::{HealthResponse, HolisticRequest, TrackingOptions};

/// Configuration for the landmark client.
#[derive(Debug, Clone)]
pub struct LandmarkClientConfig {
    /// Base URL of the landmark service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Base delay between retries, doubled per attempt
    pub retry_backoff: Duration,
}

impl Default for LandmarkClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl LandmarkClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("LANDMARK_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("LANDMARK_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: std::env::var("LANDMARK_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            retry_backoff: Duration::from_millis(100),
        }
    }
}

/// Client for the holistic tracking sidecar.
pub struct LandmarkClient {
    http: Client,
    config: LandmarkClientConfig,
}

impl LandmarkClient {
    /// Create a new landmark client.
    pub fn new(config: LandmarkClientConfig) -> LandmarkResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LandmarkError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> LandmarkResult<Self> {
        Self::new(LandmarkClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send a frame to the tracker and parse its landmarks.
    pub async fn holistic(&self, request: &HolisticRequest) -> LandmarkResult<HolisticLandmarks> {
        let url = format!("{}/holistic", self.config.base_url);

        debug!("Sending landmark request to {}", url);

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .json(request)
                    .send()
                    .await
                    .map_err(LandmarkError::Network)?;

                if response.status().is_server_error() {
                    return Err(LandmarkError::ServiceUnavailable(format!(
                        "landmark service returned {}",
                        response.status()
                    )));
                }
                Ok(response)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LandmarkError::RequestFailed(format!(
                "Landmark service returned {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| LandmarkError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> LandmarkResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = LandmarkResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(self.config.retry_backoff, attempt);
                    warn!(
                        "Landmark request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LandmarkError::RequestFailed("Unknown error".to_string())))
    }
}

#[async_trait]
impl LandmarkExtractor for LandmarkClient {
    async fn extract(
        &self,
        frame: &RgbImage,
        options: TrackingOptions,
        with_face: bool,
    ) -> LandmarkResult<HolisticLandmarks> {
        let request = HolisticRequest {
            image: STANDARD.encode(encode_png(frame)?),
            options,
            include_face: with_face,
        };
        self.holistic(&request).await
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthResponse>().await {
                    Ok(health) => health.status == "healthy" || health.status == "ok",
                    Err(e) => {
                        warn!("Landmark service health payload invalid: {}", e);
                        false
                    }
                }
            }
            Ok(response) => {
                warn!("Landmark service health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Landmark service health check error: {}", e);
                false
            }
        }
    }
}

/// `base * 2^attempt`, saturating instead of overflowing on large retry counts.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

fn encode_png(frame: &RgbImage) -> LandmarkResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    frame
        .write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|e| LandmarkError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LandmarkClient {
        LandmarkClient::new(LandmarkClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_backoff: Duration::from_millis(1),
        })
        .unwrap()
    }

    fn frame() -> RgbImage {
        RgbImage::new(4, 4)
    }

    #[test]
    fn test_config_defaults() {
        let config = LandmarkClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
        // Large retry counts saturate instead of panicking
        assert_eq!(backoff_delay(base, 40), base.saturating_mul(u32::MAX));
    }

    #[tokio::test]
    async fn test_extract_parses_landmarks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/holistic"))
            .and(body_partial_json(json!({ "static_image_mode": true, "include_face": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pose_landmarks": null,
                "face_landmarks": null,
                "left_hand_landmarks": [[0.1, 0.2, 0.3]],
                "right_hand_landmarks": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = TrackingOptions {
            static_image_mode: true,
            ..TrackingOptions::default()
        };
        let landmarks = client_for(&server)
            .extract(&frame(), options, false)
            .await
            .unwrap();

        assert!(landmarks.has_hands());
        assert!(landmarks.right_hand_landmarks.is_none());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/holistic"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/holistic"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let landmarks = client_for(&server)
            .extract(&frame(), TrackingOptions::default(), true)
            .await
            .unwrap();
        assert!(landmarks.is_empty());
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/holistic"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad frame"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .extract(&frame(), TrackingOptions::default(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, LandmarkError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/holistic"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .extract(&frame(), TrackingOptions::default(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, LandmarkError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = LandmarkClient::new(LandmarkClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
            ..LandmarkClientConfig::default()
        })
        .unwrap();
        assert!(!client.health_check().await);
    }
}
