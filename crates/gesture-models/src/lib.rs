//! Shared data models for the gesture backend.
//!
//! This crate provides Serde-serializable types for:
//! - Holistic landmark sets returned by the tracking service
//! - Per-frame feature vectors and their layouts
//! - Classification endpoint definitions

pub mod endpoint;
pub mod features;
pub mod landmarks;

pub use endpoint::{Endpoint, EndpointParseError};
pub use features::{FeatureError, FeatureLayout, FeatureVector};
pub use landmarks::{HolisticLandmarks, Point3, PosePoint};
