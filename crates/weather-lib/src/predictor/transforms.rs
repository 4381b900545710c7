//! Feature scaling and label decoding artifacts

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::models::NUM_FEATURES;

/// Forward transform applied to the raw feature vector before inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// `(x - mean) / scale`
    Standard {
        mean: [f64; NUM_FEATURES],
        scale: [f64; NUM_FEATURES],
    },
    /// `x * scale + min`
    MinMax {
        min: [f64; NUM_FEATURES],
        scale: [f64; NUM_FEATURES],
    },
}

impl FeatureScaler {
    /// Check the parameters can be applied without producing NaN or infinity
    pub fn validate(&self) -> Result<(), String> {
        match self {
            FeatureScaler::Standard { mean, scale } => {
                if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
                    return Err("standard scaler has non-finite parameters".to_string());
                }
                if scale.iter().any(|s| *s == 0.0) {
                    return Err("standard scaler has a zero scale".to_string());
                }
            }
            FeatureScaler::MinMax { min, scale } => {
                if min.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
                    return Err("min-max scaler has non-finite parameters".to_string());
                }
            }
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut scaled = [0.0; NUM_FEATURES];
        for (i, value) in features.iter().enumerate() {
            scaled[i] = match self {
                FeatureScaler::Standard { mean, scale } => (value - mean[i]) / scale[i],
                FeatureScaler::MinMax { min, scale } => value * scale[i] + min[i],
            };
        }
        scaled
    }
}

/// Maps rain class indices back to their labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("label encoder has no classes".to_string());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn inverse_transform(&self, index: usize) -> Result<&str, PredictError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(PredictError::UnknownClass {
                index,
                known: self.classes.len(),
            })
    }
}
