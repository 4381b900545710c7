//! Observability infrastructure for the weather predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction counts by source,
//!   model load state, exports)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::PredictionResult;

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0,
];

/// Prediction source label for model-backed results
pub const SOURCE_MODEL: &str = "model";

/// Prediction source label for stub results
pub const SOURCE_STUB: &str = "stub";

static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors: IntCounter,
    model_loaded: IntGauge,
    model_load_failure: GaugeVec,
    model_info: GaugeVec,
    exports_total: IntCounter,
    exported_predictions: IntCounter,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "weather_prediction_latency_seconds",
                "Time spent producing a single weather prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "weather_predictions_total",
                "Predictions served, by source (model or stub)",
                &["source"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter!(
                "weather_prediction_errors_total",
                "Predictions that failed with an inference or input error"
            )
            .expect("Failed to register prediction_errors"),

            model_loaded: register_int_gauge!(
                "weather_model_loaded",
                "1 when a trained model is serving predictions, 0 otherwise"
            )
            .expect("Failed to register model_loaded"),

            model_load_failure: register_gauge_vec!(
                "weather_model_load_failure_info",
                "Reason the model could not be loaded",
                &["reason"]
            )
            .expect("Failed to register model_load_failure_info"),

            model_info: register_gauge_vec!(
                "weather_model_info",
                "Information about the currently loaded model",
                &["format", "checksum"]
            )
            .expect("Failed to register model_info"),

            exports_total: register_int_counter!(
                "weather_exports_total",
                "Prediction batches exported to CSV and JSON"
            )
            .expect("Failed to register exports_total"),

            exported_predictions: register_int_counter!(
                "weather_exported_predictions_total",
                "Prediction records written by the exporter"
            )
            .expect("Failed to register exported_predictions"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// A lightweight handle to the process-wide metrics; clones share the same
/// underlying collectors.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Count a served prediction under `source` (`model` or `stub`)
    pub fn inc_predictions(&self, source: &str) {
        self.inner().predictions_total.with_label_values(&[source]).inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn set_model_loaded(&self, format: &str, checksum: &str) {
        self.inner().model_loaded.set(1);
        self.inner().model_load_failure.reset();
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[format, checksum])
            .set(1.0);
    }

    pub fn set_model_failed(&self, reason_kind: &str) {
        self.inner().model_loaded.set(0);
        self.inner().model_load_failure.reset();
        self.inner()
            .model_load_failure
            .with_label_values(&[reason_kind])
            .set(1.0);
    }

    pub fn record_export(&self, records: usize) {
        self.inner().exports_total.inc();
        self.inner().exported_predictions.inc_by(records as u64);
    }
}

/// Structured logger for predictor events
///
/// Emits event-tagged records so operators can follow model state changes
/// and served predictions in JSON logs.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_model_loaded(&self, format: &str, checksum: Option<&str>, classes: &[String]) {
        info!(
            event = "model_loaded",
            service = %self.service,
            format = %format,
            checksum = ?checksum,
            rain_classes = ?classes,
            "Weather model loaded"
        );
    }

    /// Log the switch to stub predictions
    pub fn log_model_degraded(&self, reason_kind: &str, reason: &str, configuration: bool) {
        warn!(
            event = "model_degraded",
            service = %self.service,
            reason_kind = %reason_kind,
            reason = %reason,
            configuration = configuration,
            "Model unavailable, serving stub predictions"
        );
    }

    pub fn log_prediction(&self, result: &PredictionResult) {
        let source = if result.metadata.model_loaded {
            SOURCE_MODEL
        } else {
            SOURCE_STUB
        };
        info!(
            event = "prediction_generated",
            service = %self.service,
            year = result.input.year,
            latitude = result.input.lat,
            longitude = result.input.lon,
            month = result.input.month,
            humidity = result.predictions.humidity,
            temperature = result.predictions.temperature,
            wind_speed = result.predictions.wind_speed,
            rain = %result.predictions.rain,
            rain_confidence = result.predictions.rain_confidence,
            source = source,
            "Generated weather prediction"
        );
    }

    pub fn log_export(&self, records: usize, csv_path: &str, json_path: &str) {
        info!(
            event = "predictions_exported",
            service = %self.service,
            records = records,
            csv = %csv_path,
            json = %json_path,
            "Predictions exported"
        );
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "server_started",
            service = %self.service,
            version = %version,
            addr = %addr,
            "Weather API started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service,
            reason = %reason,
            "Weather API shutting down"
        );
    }
}
