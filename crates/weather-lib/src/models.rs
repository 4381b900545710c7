//! Core data models for weather predictions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Number of features fed to the model: `[year, lat, lon, month]`
pub const NUM_FEATURES: usize = 4;

/// Rain label reported by the stub predictor
pub const STUB_RAIN_LABEL: &str = "Rained";

/// A single prediction query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub year: i32,
    #[serde(rename = "latitude", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "longitude", alias = "lon")]
    pub lon: f64,
    pub month: u32,
}

impl PredictionRequest {
    pub fn new(year: i32, lat: f64, lon: f64, month: u32) -> Self {
        Self { year, lat, lon, month }
    }

    /// Reject coordinates and months outside their valid ranges
    pub fn validate(&self) -> Result<(), PredictError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(PredictError::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(PredictError::InvalidInput(format!(
                "longitude {} outside [-180, 180]",
                self.lon
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(PredictError::InvalidInput(format!(
                "month {} outside [1, 12]",
                self.month
            )));
        }
        Ok(())
    }

    /// Feature vector in the fixed order the model was trained on
    pub fn features(&self) -> [f64; NUM_FEATURES] {
        [self.year as f64, self.lat, self.lon, self.month as f64]
    }
}

/// Predicted weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub humidity: f64,
    pub temperature: f64,
    pub wind_speed: f64,
    pub rain: String,
    pub rain_confidence: f64,
}

impl Predictions {
    /// Fixed values served when no model is available
    pub fn stub() -> Self {
        Self {
            humidity: 30.0,
            temperature: 20.0,
            wind_speed: 2.7,
            rain: STUB_RAIN_LABEL.to_string(),
            rain_confidence: 1.0,
        }
    }
}

/// How a prediction was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub prediction_timestamp: DateTime<Utc>,
}

/// Full prediction output for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub input: PredictionRequest,
    pub predictions: Predictions,
    pub metadata: PredictionMetadata,
}

impl PredictionResult {
    /// Result produced by a loaded model
    pub fn from_model(input: PredictionRequest, predictions: Predictions) -> Self {
        Self {
            input,
            predictions,
            metadata: PredictionMetadata {
                model_loaded: true,
                reason: None,
                prediction_timestamp: Utc::now(),
            },
        }
    }

    /// Stub result tagged with the reason the model is unavailable
    pub fn stub(input: PredictionRequest, reason: impl Into<String>) -> Self {
        Self {
            input,
            predictions: Predictions::stub(),
            metadata: PredictionMetadata {
                model_loaded: false,
                reason: Some(reason.into()),
                prediction_timestamp: Utc::now(),
            },
        }
    }
}
