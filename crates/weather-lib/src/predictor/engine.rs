//! Loaded predictor: model backend plus scaler and label encoder

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use super::inference::OnnxModel;
use super::linear::LinearModel;
use super::transforms::{FeatureScaler, LabelEncoder};
use super::{ModelBackend, ModelFormat};
use crate::artifacts::{self, ArtifactKind, ArtifactNames, ArtifactSet};
use crate::error::{LoadError, PredictError};
use crate::models::{PredictionRequest, PredictionResult};

/// Description of the artifacts a predictor was built from
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub format: ModelFormat,
    pub model_path: Option<PathBuf>,
    pub model_checksum: Option<String>,
    pub scaler_checksum: Option<String>,
    pub label_encoder_checksum: Option<String>,
    pub rain_classes: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

/// A ready-to-use weather predictor.
///
/// A value of this type only exists once all artifacts have been loaded, so
/// every method performs real inference.
pub struct WeatherPredictor {
    backend: Box<dyn ModelBackend>,
    scaler: FeatureScaler,
    encoder: LabelEncoder,
    info: ModelInfo,
}

impl std::fmt::Debug for WeatherPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherPredictor")
            .field("format", &self.info.format)
            .field("classes", &self.encoder.classes)
            .finish()
    }
}

impl WeatherPredictor {
    /// Locate and load all artifacts from `model_dir`
    pub fn load(
        model_dir: &Path,
        format: ModelFormat,
        names: &ArtifactNames,
    ) -> Result<Self, LoadError> {
        let start = Instant::now();
        info!(model_dir = %model_dir.display(), format = %format, "Loading weather prediction model");

        let set = artifacts::locate_all(model_dir, names)?;
        let predictor = Self::load_set(&set, format)?;

        info!(
            elapsed_ms = start.elapsed().as_millis(),
            classes = ?predictor.encoder.classes,
            "Weather predictor ready"
        );
        Ok(predictor)
    }

    fn load_set(set: &ArtifactSet, format: ModelFormat) -> Result<Self, LoadError> {
        let model_bytes = artifacts::read_artifact(ArtifactKind::Model, &set.model)?;
        let scaler_bytes = artifacts::read_artifact(ArtifactKind::Scaler, &set.scaler)?;
        let encoder_bytes = artifacts::read_artifact(ArtifactKind::LabelEncoder, &set.label_encoder)?;

        let deserialize_error = |artifact: ArtifactKind, path: &Path, cause: String| {
            LoadError::Deserialize {
                artifact,
                path: path.to_path_buf(),
                cause,
            }
        };

        let backend: Box<dyn ModelBackend> = match format {
            ModelFormat::Onnx => Box::new(
                OnnxModel::from_bytes(&model_bytes)
                    .map_err(|e| deserialize_error(ArtifactKind::Model, &set.model, e.to_string()))?,
            ),
            ModelFormat::Linear => Box::new(
                LinearModel::from_bytes(&model_bytes)
                    .map_err(|e| deserialize_error(ArtifactKind::Model, &set.model, e))?,
            ),
        };

        let scaler: FeatureScaler = serde_json::from_slice(&scaler_bytes)
            .map_err(|e| e.to_string())
            .and_then(|s: FeatureScaler| s.validate().map(|_| s))
            .map_err(|e| deserialize_error(ArtifactKind::Scaler, &set.scaler, e))?;

        let encoder: LabelEncoder = serde_json::from_slice(&encoder_bytes)
            .map_err(|e| e.to_string())
            .and_then(|enc: LabelEncoder| enc.validate().map(|_| enc))
            .map_err(|e| deserialize_error(ArtifactKind::LabelEncoder, &set.label_encoder, e))?;

        let mut predictor = Self::from_parts(backend, scaler, encoder)?;
        predictor.info.model_path = Some(set.model.clone());
        predictor.info.model_checksum = Some(artifacts::fingerprint(&model_bytes));
        predictor.info.scaler_checksum = Some(artifacts::fingerprint(&scaler_bytes));
        predictor.info.label_encoder_checksum = Some(artifacts::fingerprint(&encoder_bytes));

        debug!(
            model_checksum = ?predictor.info.model_checksum,
            scaler_checksum = ?predictor.info.scaler_checksum,
            label_encoder_checksum = ?predictor.info.label_encoder_checksum,
            "Model artifacts fingerprinted"
        );
        Ok(predictor)
    }

    /// Assemble a predictor from already-loaded components
    pub fn from_parts(
        backend: Box<dyn ModelBackend>,
        scaler: FeatureScaler,
        encoder: LabelEncoder,
    ) -> Result<Self, LoadError> {
        if let Some(classes) = backend.rain_classes() {
            if classes != encoder.len() {
                return Err(LoadError::Instantiate(format!(
                    "model emits {} rain classes but the label encoder knows {}",
                    classes,
                    encoder.len()
                )));
            }
        }

        let info = ModelInfo {
            format: backend.format(),
            model_path: None,
            model_checksum: None,
            scaler_checksum: None,
            label_encoder_checksum: None,
            rain_classes: encoder.classes.clone(),
            loaded_at: Utc::now(),
        };

        Ok(Self {
            backend,
            scaler,
            encoder,
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Rain labels the decoder can produce
    pub fn classes(&self) -> &[String] {
        &self.encoder.classes
    }

    /// Predict conditions for a single request
    pub fn predict_single(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        request.validate()?;

        let scaled = self.scaler.transform(&request.features());
        let raw = self.backend.run(&scaled)?;
        let predictions = raw.into_predictions(&self.encoder)?;

        Ok(PredictionResult::from_model(*request, predictions))
    }

    /// Predict each request in order, stopping at the first failure
    pub fn predict_batch(
        &self,
        requests: &[PredictionRequest],
    ) -> Result<Vec<PredictionResult>, PredictError> {
        let total = requests.len();
        requests
            .iter()
            .enumerate()
            .map(|(i, request)| {
                debug!(index = i + 1, total, "Predicting batch item");
                self.predict_single(request)
            })
            .collect()
    }
}
