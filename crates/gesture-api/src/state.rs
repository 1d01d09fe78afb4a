//! Application state.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use gesture_inference::{OnnxClassifier, ScaledClassifier, SequenceClassifier, StandardScaler};
use gesture_landmarks::{LandmarkClient, LandmarkExtractor};
use gesture_models::Endpoint;
use tracing::info;

use crate::config::{ApiConfig, EndpointSettings};
use crate::session::SessionStore;

pub type Classifiers = HashMap<Endpoint, Arc<dyn SequenceClassifier>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub extractor: Arc<dyn LandmarkExtractor>,
    pub classifiers: Arc<Classifiers>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Connect the landmark client and load every endpoint's model.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let extractor = LandmarkClient::from_env().context("creating landmark client")?;
        info!("Landmark service at {}", extractor.base_url());

        let mut classifiers = Classifiers::new();
        for endpoint in Endpoint::ALL {
            let settings = config.endpoint(*endpoint);
            let classifier = load_classifier(*endpoint, &settings)?;
            info!(endpoint = %endpoint, model = %classifier.describe(), "Model loaded");
            classifiers.insert(*endpoint, classifier);
        }

        Ok(Self::from_parts(config, Arc::new(extractor), classifiers))
    }

    /// Assemble state from already-built components.
    pub fn from_parts(
        config: ApiConfig,
        extractor: Arc<dyn LandmarkExtractor>,
        classifiers: Classifiers,
    ) -> Self {
        let stabilizers = config
            .endpoints
            .iter()
            .map(|(endpoint, settings)| (*endpoint, settings.stabilizer.clone()))
            .collect();
        let sessions = SessionStore::new(
            stabilizers,
            config.session_ttl,
            config.session_max_entries,
        );

        Self {
            config,
            extractor,
            classifiers: Arc::new(classifiers),
            sessions,
        }
    }

    pub fn classifier(&self, endpoint: Endpoint) -> Option<Arc<dyn SequenceClassifier>> {
        self.classifiers.get(&endpoint).cloned()
    }
}

fn load_classifier(
    endpoint: Endpoint,
    settings: &EndpointSettings,
) -> anyhow::Result<Arc<dyn SequenceClassifier>> {
    let model = OnnxClassifier::load(&settings.model_path)
        .with_context(|| format!("loading {} model", endpoint))?;

    match &settings.scaler_path {
        Some(path) => {
            let scaler = StandardScaler::from_json_file(path)
                .with_context(|| format!("loading {} scaler", endpoint))?;
            Ok(Arc::new(ScaledClassifier::new(scaler, model)))
        }
        None => Ok(Arc::new(model)),
    }
}
