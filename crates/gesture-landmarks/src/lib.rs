//! Client for the holistic landmark tracking service.
//!
//! The body/hand/face tracker runs as a separate service; this crate sends
//! it decoded frames and parses the landmark groups it finds. The
//! [`LandmarkExtractor`] trait lets the API run against any other tracker
//! (or an in-memory fake in tests).

pub mod client;
pub mod error;
pub mod extractor;
pub mod types;

pub use client::{LandmarkClient, LandmarkClientConfig};
pub use error::{LandmarkError, LandmarkResult};
pub use extractor::LandmarkExtractor;
pub use types::{HealthResponse, HolisticRequest, TrackingOptions};
