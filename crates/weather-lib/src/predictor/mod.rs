//! Weather prediction engine
//!
//! The engine combines three artifacts: a model backend producing raw
//! outputs, a feature scaler applied to the request features, and a label
//! encoder decoding the rain class.

mod engine;
mod inference;
mod linear;
mod output;
mod transforms;

pub use engine::{ModelInfo, WeatherPredictor};
pub use inference::OnnxModel;
pub use linear::{LinearModel, RegressionHead, SoftmaxHead};
pub use output::{resolve_rain, RawOutputs};
pub use transforms::{FeatureScaler, LabelEncoder};

use crate::error::PredictError;
use crate::models::NUM_FEATURES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serialized model formats the engine can load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// ONNX graph with four outputs, evaluated with tract
    #[default]
    Onnx,
    /// JSON linear model with three regression heads and a softmax rain head
    Linear,
}

impl ModelFormat {
    pub fn default_model_file(&self) -> &'static str {
        match self {
            ModelFormat::Onnx => "weather_prediction_model.onnx",
            ModelFormat::Linear => "weather_prediction_model.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Onnx => "onnx",
            ModelFormat::Linear => "linear",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(ModelFormat::Onnx),
            "linear" => Ok(ModelFormat::Linear),
            other => Err(format!("unknown model format '{}' (expected onnx or linear)", other)),
        }
    }
}

/// A loaded model that maps scaled features to raw outputs
pub trait ModelBackend: Send + Sync {
    /// Evaluate the model on one scaled feature vector
    fn run(&self, scaled: &[f64; NUM_FEATURES]) -> Result<RawOutputs, PredictError>;

    /// Number of rain classes the model emits, when known before evaluation
    fn rain_classes(&self) -> Option<usize>;

    fn format(&self) -> ModelFormat;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_format_parse() {
        assert_eq!("onnx".parse::<ModelFormat>().unwrap(), ModelFormat::Onnx);
        assert_eq!(" Linear ".parse::<ModelFormat>().unwrap(), ModelFormat::Linear);
        assert!("keras".parse::<ModelFormat>().is_err());
    }

    #[test]
    fn test_default_model_files() {
        assert_eq!(ModelFormat::default(), ModelFormat::Onnx);
        assert!(ModelFormat::Onnx.default_model_file().ends_with(".onnx"));
        assert!(ModelFormat::Linear.default_model_file().ends_with(".json"));
    }
}
