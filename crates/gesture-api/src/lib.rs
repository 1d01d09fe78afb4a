//! Axum HTTP API for gesture and emotion classification.
//!
//! This crate provides:
//! - The four classification endpoints with per-client stabilizer sessions
//! - Rate limiting, request ids and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{ApiConfig, EndpointSettings};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use session::{SessionKey, SessionStore};
pub use state::{AppState, Classifiers};
