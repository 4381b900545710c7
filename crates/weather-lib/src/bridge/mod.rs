//! Lazy model bridge with stub degradation
//!
//! The bridge owns the predictor state for whoever composes the serving
//! layer. The first prediction triggers a single load attempt; the outcome
//! is kept for the lifetime of the bridge:
//!
//! - `Ready`: every call is answered by the trained model.
//! - `Failed`: every call is answered with fixed stub values tagged with
//!   `model_loaded = false` and the recorded reason.
//!
//! Load failures never reach the caller. Inference failures on a ready
//! model do.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info};

use crate::artifacts::ArtifactNames;
use crate::error::{LoadError, PredictError};
use crate::models::{PredictionRequest, PredictionResult};
use crate::observability::{PredictorMetrics, StructuredLogger, SOURCE_MODEL, SOURCE_STUB};
use crate::predictor::{ModelFormat, ModelInfo, WeatherPredictor};

#[cfg(test)]
mod tests;

/// Settings the bridge is constructed with
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Directory holding the model artifacts; `None` means not configured
    pub model_dir: Option<PathBuf>,
    /// Skip loading entirely and serve stub predictions
    pub force_stub: bool,
    pub model_format: ModelFormat,
    pub artifacts: ArtifactNames,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            force_stub: false,
            model_format: ModelFormat::default(),
            artifacts: ArtifactNames::default(),
        }
    }
}

impl BridgeConfig {
    pub fn new(model_dir: impl Into<PathBuf>, model_format: ModelFormat) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            force_stub: false,
            model_format,
            artifacts: ArtifactNames::for_format(model_format),
        }
    }

    /// Configuration that always serves stub predictions
    pub fn stub() -> Self {
        Self {
            force_stub: true,
            ..Self::default()
        }
    }
}

/// Terminal outcome of the one load attempt
#[derive(Debug)]
pub enum ModelState {
    Ready(WeatherPredictor),
    Failed(LoadError),
}

/// Externally visible bridge state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    /// No prediction has been requested yet
    Unloaded,
    Ready,
    Failed,
}

/// Lazily loads the predictor once and degrades to stub output on failure
pub struct ModelBridge {
    config: BridgeConfig,
    state: OnceLock<ModelState>,
    load_attempts: AtomicUsize,
    metrics: PredictorMetrics,
    logger: StructuredLogger,
}

impl ModelBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: OnceLock::new(),
            load_attempts: AtomicUsize::new(0),
            metrics: PredictorMetrics::new(),
            logger: StructuredLogger::new("weather-bridge"),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current state without triggering a load
    pub fn status(&self) -> BridgeStatus {
        match self.state.get() {
            None => BridgeStatus::Unloaded,
            Some(ModelState::Ready(_)) => BridgeStatus::Ready,
            Some(ModelState::Failed(_)) => BridgeStatus::Failed,
        }
    }

    /// Load the model now if no prediction has done so yet
    pub fn ensure_loaded(&self) -> BridgeStatus {
        self.state();
        self.status()
    }

    /// Recorded load failure, if the bridge is degraded
    pub fn failure(&self) -> Option<&LoadError> {
        match self.state.get() {
            Some(ModelState::Failed(e)) => Some(e),
            _ => None,
        }
    }

    /// The loaded predictor, if the bridge is ready
    pub fn predictor(&self) -> Option<&WeatherPredictor> {
        match self.state.get() {
            Some(ModelState::Ready(p)) => Some(p),
            _ => None,
        }
    }

    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.predictor().map(WeatherPredictor::info)
    }

    /// Number of times loading has been attempted (never more than one)
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Predict conditions for one request, falling back to the stub when
    /// the model is unavailable
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        let start = Instant::now();
        let result = self.predict_inner(request);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());
        result
    }

    fn predict_inner(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        if let Err(e) = request.validate() {
            self.metrics.inc_prediction_errors();
            return Err(e);
        }

        match self.state() {
            ModelState::Ready(predictor) => {
                let result = predictor.predict_single(request).map_err(|e| {
                    self.metrics.inc_prediction_errors();
                    e
                })?;
                self.metrics.inc_predictions(SOURCE_MODEL);
                Ok(result)
            }
            ModelState::Failed(reason) => {
                self.metrics.inc_predictions(SOURCE_STUB);
                Ok(PredictionResult::stub(*request, reason.to_string()))
            }
        }
    }

    /// Predict every request in order; the first failure aborts the batch
    pub fn predict_batch(
        &self,
        requests: &[PredictionRequest],
    ) -> Result<Vec<PredictionResult>, PredictError> {
        requests.iter().map(|r| self.predict(r)).collect()
    }

    fn state(&self) -> &ModelState {
        self.state.get_or_init(|| self.materialize())
    }

    fn materialize(&self) -> ModelState {
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        debug!(config = ?self.config, "Materializing weather predictor");

        match self.try_load() {
            Ok(predictor) => {
                let info = predictor.info();
                let checksum = info.model_checksum.as_deref().unwrap_or("unknown");
                self.metrics.set_model_loaded(info.format.as_str(), checksum);
                self.logger.log_model_loaded(
                    info.format.as_str(),
                    info.model_checksum.as_deref(),
                    &info.rain_classes,
                );
                ModelState::Ready(predictor)
            }
            Err(e) => {
                self.metrics.set_model_failed(e.kind());
                self.logger
                    .log_model_degraded(e.kind(), &e.to_string(), e.is_configuration());
                ModelState::Failed(e)
            }
        }
    }

    fn try_load(&self) -> Result<WeatherPredictor, LoadError> {
        if self.config.force_stub {
            info!("Stub predictions forced by configuration");
            return Err(LoadError::StubForced);
        }

        let model_dir = self
            .config
            .model_dir
            .as_ref()
            .ok_or(LoadError::DirectoryNotConfigured)?;

        if !model_dir.exists() {
            return Err(LoadError::DirectoryMissing(model_dir.clone()));
        }

        WeatherPredictor::load(model_dir, self.config.model_format, &self.config.artifacts)
    }
}
