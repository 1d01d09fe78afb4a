//! API configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gesture_models::Endpoint;
use gesture_stabilizer::{default_config, ConfigError, RepeatPolicy, StabilizerConfig, WindowMode};
use tracing::warn;

/// Model and stabilizer settings for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSettings {
    /// ONNX model file
    pub model_path: PathBuf,
    /// Standardization parameters, for endpoints trained on scaled features
    pub scaler_path: Option<PathBuf>,
    pub stabilizer: StabilizerConfig,
}

impl EndpointSettings {
    /// Defaults for an endpoint with models under `model_dir`.
    pub fn defaults(endpoint: Endpoint, model_dir: &Path) -> Self {
        Self {
            model_path: model_dir.join(endpoint.default_model_file()),
            scaler_path: endpoint
                .uses_scaler()
                .then(|| model_dir.join("scaler.json")),
            stabilizer: default_config(endpoint),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Idle time after which a client's buffers are dropped
    pub session_ttl: Duration,
    /// Upper bound on tracked (endpoint, client) sessions
    pub session_max_entries: usize,
    /// Directory holding the ONNX models
    pub model_dir: PathBuf,
    /// Per-endpoint settings
    pub endpoints: BTreeMap<Endpoint, EndpointSettings>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let model_dir = PathBuf::from("./model");
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            session_ttl: Duration::from_secs(600),
            session_max_entries: 10_000,
            endpoints: Endpoint::ALL
                .iter()
                .map(|e| (*e, EndpointSettings::defaults(*e, &model_dir)))
                .collect(),
            model_dir,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_dir = lookup("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);

        let endpoints = Endpoint::ALL
            .iter()
            .map(|e| (*e, endpoint_from_lookup(*e, &model_dir, &lookup)))
            .collect();

        Self {
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "API_PORT").unwrap_or(defaults.port),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parse_var(&lookup, "RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: parse_var(&lookup, "MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            session_ttl: parse_var(&lookup, "SESSION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            session_max_entries: parse_var(&lookup, "SESSION_MAX_ENTRIES")
                .unwrap_or(defaults.session_max_entries),
            model_dir,
            endpoints,
        }
    }

    /// Check every endpoint's stabilizer settings.
    pub fn validate(&self) -> Result<(), (Endpoint, ConfigError)> {
        for (endpoint, settings) in &self.endpoints {
            settings
                .stabilizer
                .validate()
                .map_err(|e| (*endpoint, e))?;
        }
        Ok(())
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> EndpointSettings {
        self.endpoints
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| EndpointSettings::defaults(endpoint, &self.model_dir))
    }
}

/// Read `<PREFIX>_*` overrides for one endpoint.
fn endpoint_from_lookup<F>(endpoint: Endpoint, model_dir: &Path, lookup: &F) -> EndpointSettings
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = endpoint.env_prefix();
    let var = |name: &str| lookup(&format!("{prefix}_{name}"));
    let mut settings = EndpointSettings::defaults(endpoint, model_dir);

    if let Some(model) = var("MODEL") {
        settings.model_path = resolve(model_dir, &model);
    }
    if let Some(scaler) = var("SCALER") {
        settings.scaler_path = Some(resolve(model_dir, &scaler));
    }

    let stabilizer = &mut settings.stabilizer;
    if let Some(window) = var("WINDOW").and_then(|s| s.trim().parse().ok()) {
        stabilizer.window = window;
    }
    if let Some(threshold) = var("THRESHOLD").and_then(|s| s.trim().parse().ok()) {
        stabilizer.threshold = threshold;
    }
    if let Some(mode) = var("MODE") {
        match mode.parse::<WindowMode>() {
            Ok(mode) => stabilizer.mode = mode,
            Err(e) => warn!(endpoint = %endpoint, "{}, keeping {}", e, stabilizer.mode),
        }
    }
    if let Some(repeat) = var("REPEAT") {
        match repeat.parse::<RepeatPolicy>() {
            Ok(policy) => stabilizer.repeat = policy,
            Err(e) => warn!(endpoint = %endpoint, "{}, keeping {}", e, stabilizer.repeat),
        }
    }
    if let Some(limit) = var("REPEAT_LIMIT").and_then(|s| s.trim().parse().ok()) {
        if let RepeatPolicy::Counted { .. } = stabilizer.repeat {
            stabilizer.repeat = RepeatPolicy::Counted { limit };
        }
    }

    settings
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn resolve(model_dir: &Path, file: &str) -> PathBuf {
    let path = PathBuf::from(file);
    if path.is_absolute() {
        path
    } else {
        model_dir.join(path)
    }
}
