//! Weather prediction HTTP service
//!
//! Serves the model bridge over axum along with health, readiness and
//! Prometheus metrics endpoints.

pub mod analyze;
pub mod api;
pub mod config;
