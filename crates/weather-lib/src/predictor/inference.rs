//! ONNX inference using tract
//!
//! The exported network takes one `f32 [1, 4]` input and produces four
//! outputs in order: humidity `[1, 1]`, temperature `[1, 1]`, wind speed
//! `[1, 1]` and the rain class distribution `[1, C]`.

use anyhow::{anyhow, Context};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;
use tracing::{debug, warn};

use super::output::RawOutputs;
use super::{ModelBackend, ModelFormat};
use crate::error::PredictError;
use crate::models::NUM_FEATURES;

/// Number of output tensors expected from the model
const NUM_OUTPUTS: usize = 4;

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX model evaluated with tract
pub struct OnnxModel {
    plan: TractModel,
    rain_classes: Option<usize>,
}

impl OnnxModel {
    /// Parse and optimize an ONNX model from bytes.
    ///
    /// tract panics on some malformed graphs; those panics are reported as
    /// errors like any other parse failure.
    pub fn from_bytes(model_bytes: &[u8]) -> TractResult<Self> {
        panic::catch_unwind(AssertUnwindSafe(|| Self::build(model_bytes))).unwrap_or_else(|payload| {
            Err(anyhow!("ONNX loader panicked: {}", panic_message(payload.as_ref())))
        })
    }

    fn build(model_bytes: &[u8]) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?;

        let outputs = model.output_outlets()?.len();
        if outputs < NUM_OUTPUTS {
            anyhow::bail!("model declares {} outputs, expected {}", outputs, NUM_OUTPUTS);
        }
        let rain_classes = rain_class_count(&model);
        debug!(rain_classes = ?rain_classes, "ONNX model optimized");

        let plan = model.into_runnable().context("Failed to create runnable model")?;
        Ok(Self { plan, rain_classes })
    }

    fn features_to_tensor(scaled: &[f64; NUM_FEATURES]) -> Result<Tensor, PredictError> {
        let data: Vec<f32> = scaled.iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .map_err(|e| PredictError::Inference(format!("failed to shape input: {}", e)))?;
        Ok(array.into())
    }
}

/// Width of the rain distribution output, when the graph fixes it
fn rain_class_count(model: &TypedModel) -> Option<usize> {
    let fact = model.output_fact(NUM_OUTPUTS - 1).ok()?;
    fact.shape.last()?.to_usize().ok()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn tensor_values(name: &str, value: &TValue) -> Result<Vec<f64>, PredictError> {
    let view = value
        .to_array_view::<f32>()
        .map_err(|e| PredictError::MalformedOutput(format!("{} output: {}", name, e)))?;
    Ok(view.iter().map(|v| *v as f64).collect())
}

fn first_value(name: &str, value: &TValue) -> Result<f64, PredictError> {
    tensor_values(name, value)?
        .first()
        .copied()
        .ok_or_else(|| PredictError::MalformedOutput(format!("{} output is empty", name)))
}

impl ModelBackend for OnnxModel {
    fn run(&self, scaled: &[f64; NUM_FEATURES]) -> Result<RawOutputs, PredictError> {
        let start = Instant::now();
        let input = Self::features_to_tensor(scaled)?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        if outputs.len() < NUM_OUTPUTS {
            return Err(PredictError::MalformedOutput(format!(
                "model produced {} outputs, expected {}",
                outputs.len(),
                NUM_OUTPUTS
            )));
        }

        let raw = RawOutputs {
            humidity: first_value("humidity", &outputs[0])?,
            temperature: first_value("temperature", &outputs[1])?,
            wind_speed: first_value("wind_speed", &outputs[2])?,
            rain_probabilities: tensor_values("rain", &outputs[3])?,
        };

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(raw)
    }

    fn rain_classes(&self) -> Option<usize> {
        self.rain_classes
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Onnx
    }
}
