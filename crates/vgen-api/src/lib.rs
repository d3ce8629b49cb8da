//! Axum HTTP API server.
//!
//! This crate provides:
//! - Image upload into the shared uploads directory
//! - Background image-to-video generation through Kling or MiniMax
//! - Delivery of merged videos with range support
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, ProviderRegistry};
