//! Linear model backend
//!
//! A JSON model with one linear head per regression target and a softmax
//! head over the rain classes. Useful for lightweight deployments where an
//! ONNX export is not available.

use serde::{Deserialize, Serialize};

use super::output::RawOutputs;
use super::{ModelBackend, ModelFormat};
use crate::error::PredictError;
use crate::models::NUM_FEATURES;

/// `y = w · x + b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionHead {
    pub weights: [f64; NUM_FEATURES],
    pub bias: f64,
}

impl RegressionHead {
    fn eval(&self, x: &[f64; NUM_FEATURES]) -> f64 {
        dot(&self.weights, x) + self.bias
    }
}

/// One logit row per class, normalized with softmax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxHead {
    pub weights: Vec<[f64; NUM_FEATURES]>,
    pub bias: Vec<f64>,
}

impl SoftmaxHead {
    fn eval(&self, x: &[f64; NUM_FEATURES]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| dot(w, x) + b)
            .collect();
        softmax(&logits)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub humidity: RegressionHead,
    pub temperature: RegressionHead,
    pub wind_speed: RegressionHead,
    pub rain: SoftmaxHead,
}

impl LinearModel {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let model: LinearModel = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.rain.weights.is_empty() {
            return Err("rain head has no classes".to_string());
        }
        if self.rain.weights.len() != self.rain.bias.len() {
            return Err(format!(
                "rain head has {} weight rows but {} biases",
                self.rain.weights.len(),
                self.rain.bias.len()
            ));
        }
        Ok(())
    }
}

impl ModelBackend for LinearModel {
    fn run(&self, scaled: &[f64; NUM_FEATURES]) -> Result<RawOutputs, PredictError> {
        Ok(RawOutputs {
            humidity: self.humidity.eval(scaled),
            temperature: self.temperature.eval(scaled),
            wind_speed: self.wind_speed.eval(scaled),
            rain_probabilities: self.rain.eval(scaled),
        })
    }

    fn rain_classes(&self) -> Option<usize> {
        Some(self.rain.weights.len())
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Linear
    }
}

fn dot(a: &[f64; NUM_FEATURES], b: &[f64; NUM_FEATURES]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}
