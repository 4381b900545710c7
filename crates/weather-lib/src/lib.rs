//! Weather prediction bridge
//!
//! This crate provides the core functionality for:
//! - Locating trained model artifacts on disk
//! - Running weather inference (humidity, temperature, wind, rain)
//! - Lazy once-only model loading with stub degradation
//! - Exporting prediction batches to CSV and JSON
//! - Health checks and observability

pub mod artifacts;
pub mod bridge;
pub mod error;
pub mod export;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{BridgeConfig, BridgeStatus, ModelBridge};
pub use error::{ExportError, LoadError, PredictError};
pub use export::{export_predictions, ExportPaths};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{ModelFormat, WeatherPredictor};
