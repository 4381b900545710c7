//! Post-processing of raw model outputs
//!
//! Turns the three regression values and the rain class distribution into
//! the public `Predictions` shape.

use crate::error::PredictError;
use crate::models::Predictions;

use super::transforms::LabelEncoder;

/// Tolerance for probabilities that drift just outside [0, 1] through float error
const PROBABILITY_EPSILON: f64 = 1e-6;

/// Raw values produced by a model backend for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutputs {
    pub humidity: f64,
    pub temperature: f64,
    pub wind_speed: f64,
    pub rain_probabilities: Vec<f64>,
}

impl RawOutputs {
    /// Decode the rain class and package the outputs
    pub fn into_predictions(self, encoder: &LabelEncoder) -> Result<Predictions, PredictError> {
        for (name, value) in [
            ("humidity", self.humidity),
            ("temperature", self.temperature),
            ("wind_speed", self.wind_speed),
        ] {
            if !value.is_finite() {
                return Err(PredictError::MalformedOutput(format!(
                    "{} output is not finite ({})",
                    name, value
                )));
            }
        }

        let (index, confidence) = resolve_rain(&self.rain_probabilities)?;
        let rain = encoder.inverse_transform(index)?.to_string();

        Ok(Predictions {
            humidity: self.humidity,
            temperature: self.temperature,
            wind_speed: self.wind_speed,
            rain,
            rain_confidence: confidence,
        })
    }
}

/// Pick the most probable rain class.
///
/// Returns the class index and its probability. Ties resolve to the lowest
/// index.
pub fn resolve_rain(probabilities: &[f64]) -> Result<(usize, f64), PredictError> {
    if probabilities.is_empty() {
        return Err(PredictError::MalformedOutput(
            "rain distribution is empty".to_string(),
        ));
    }
    if let Some(bad) = probabilities.iter().find(|p| !p.is_finite()) {
        return Err(PredictError::MalformedOutput(format!(
            "rain distribution contains {}",
            bad
        )));
    }

    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate().skip(1) {
        if *p > probabilities[best] {
            best = i;
        }
    }

    let confidence = probabilities[best];
    if !(-PROBABILITY_EPSILON..=1.0 + PROBABILITY_EPSILON).contains(&confidence) {
        return Err(PredictError::MalformedOutput(format!(
            "rain probability {} outside [0, 1]",
            confidence
        )));
    }

    Ok((best, confidence.clamp(0.0, 1.0)))
}
