//! Classification endpoint definitions.
//!
//! Each endpoint pairs a trained sequence model with its label set and the
//! feature layout the model was trained on:
//!
//! - `Predict`: cabin-assistant gestures from a mirrored webcam feed
//! - `DetectSection`: entertainment section selection
//! - `DetectFood`: in-flight vending sign language
//! - `DetectEmotion`: facial/body emotion

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureLayout;

/// A classification endpoint exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Predict,
    DetectSection,
    DetectFood,
    DetectEmotion,
}

impl Endpoint {
    /// All endpoints.
    pub const ALL: &'static [Endpoint] = &[
        Endpoint::Predict,
        Endpoint::DetectSection,
        Endpoint::DetectFood,
        Endpoint::DetectEmotion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Predict => "predict",
            Endpoint::DetectSection => "detect_section",
            Endpoint::DetectFood => "detect_food",
            Endpoint::DetectEmotion => "detect_emotion",
        }
    }

    /// Route path below `/api`.
    pub fn route(&self) -> &'static str {
        match self {
            Endpoint::Predict => "/predict",
            Endpoint::DetectSection => "/detect-section",
            Endpoint::DetectFood => "/detect-food",
            Endpoint::DetectEmotion => "/detect-emotion",
        }
    }

    /// Prefix for this endpoint's environment variables.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Endpoint::Predict => "PREDICT",
            Endpoint::DetectSection => "DETECT_SECTION",
            Endpoint::DetectFood => "DETECT_FOOD",
            Endpoint::DetectEmotion => "DETECT_EMOTION",
        }
    }

    /// Labels in model output order.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Endpoint::Predict => &["Assist", "Feedback", "Food", "Fun", "Services"],
            Endpoint::DetectSection => &["movie", "music", "book"],
            Endpoint::DetectFood => &["Biscuit", "Chips", "Coffee", "Fruit", "Sandwich", "Tea"],
            Endpoint::DetectEmotion => &["Happy", "Sad", "Neutral"],
        }
    }

    pub fn layout(&self) -> FeatureLayout {
        match self {
            Endpoint::DetectEmotion => FeatureLayout::Holistic,
            _ => FeatureLayout::Hands,
        }
    }

    /// Default ONNX model file name, relative to the model directory.
    pub fn default_model_file(&self) -> &'static str {
        match self {
            Endpoint::Predict => "sign_language_model_30frameaccurate.onnx",
            Endpoint::DetectSection => "final_model.onnx",
            Endpoint::DetectFood => "sign_language_lstm_model.onnx",
            Endpoint::DetectEmotion => "emotion_model_with_preprocessing.onnx",
        }
    }

    /// Whether frames are mirrored horizontally before landmark extraction.
    pub fn mirrors_input(&self) -> bool {
        matches!(self, Endpoint::Predict)
    }

    /// Whether features are standardized before inference.
    pub fn uses_scaler(&self) -> bool {
        matches!(self, Endpoint::DetectEmotion)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "predict" => Ok(Endpoint::Predict),
            "detect_section" | "section" => Ok(Endpoint::DetectSection),
            "detect_food" | "food" => Ok(Endpoint::DetectFood),
            "detect_emotion" | "emotion" => Ok(Endpoint::DetectEmotion),
            _ => Err(EndpointParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown endpoint: {0}")]
pub struct EndpointParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parse() {
        assert_eq!("predict".parse::<Endpoint>().unwrap(), Endpoint::Predict);
        assert_eq!("detect-section".parse::<Endpoint>().unwrap(), Endpoint::DetectSection);
        assert_eq!("food".parse::<Endpoint>().unwrap(), Endpoint::DetectFood);
        assert_eq!("DETECT_EMOTION".parse::<Endpoint>().unwrap(), Endpoint::DetectEmotion);
        assert!("detect-luggage".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_layouts() {
        assert_eq!(Endpoint::Predict.layout(), FeatureLayout::Hands);
        assert_eq!(Endpoint::DetectEmotion.layout(), FeatureLayout::Holistic);
        assert!(Endpoint::DetectEmotion.uses_scaler());
        assert!(!Endpoint::DetectFood.uses_scaler());
    }

    #[test]
    fn test_routes_are_unique() {
        let mut routes: Vec<_> = Endpoint::ALL.iter().map(|e| e.route()).collect();
        routes.sort();
        routes.dedup();
        assert_eq!(routes.len(), Endpoint::ALL.len());
    }
}
