//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, NaiveDate};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use weather_lib::{
    export_predictions,
    health::{components, ComponentStatus, HealthRegistry},
    ExportError, ModelBridge, PredictError, PredictionRequest, PredictionResult, PredictorMetrics,
    StructuredLogger,
};

use crate::analyze::{climate_data, parse_lat_lon_from_label, parse_user_date, ClimateData, LiteAnalyzeRequest};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<ModelBridge>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
    pub api_prefix: String,
    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(bridge: Arc<ModelBridge>, health_registry: HealthRegistry) -> Self {
        Self {
            bridge,
            health_registry,
            metrics: PredictorMetrics::new(),
            logger: StructuredLogger::new("weather-api"),
            api_prefix: "/api/v1".to_string(),
            export_dir: PathBuf::from("exports"),
        }
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }
}

/// Errors returned by API handlers as `{"error": ...}` bodies
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("{0}")]
    BadRequest(String),

    #[error("prediction task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Predict(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run predictions off the async runtime; the first call may load the model
async fn run_predictions(
    state: &AppState,
    requests: Vec<PredictionRequest>,
) -> Result<Vec<PredictionResult>, ApiError> {
    let bridge = Arc::clone(&state.bridge);
    let results = tokio::task::spawn_blocking(move || bridge.predict_batch(&requests))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    state.health_registry.sync_bridge(&state.bridge).await;
    for result in &results {
        state.logger.log_prediction(result);
    }
    Ok(results)
}

async fn run_prediction(state: &AppState, request: PredictionRequest) -> Result<PredictionResult, ApiError> {
    run_predictions(state, vec![request])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Task("no prediction produced".to_string()))
}

/// Single prediction
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    Ok(Json(run_prediction(&state, request).await?))
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub requests: Vec<PredictionRequest>,
}

async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchRequest>,
) -> Result<Json<Vec<PredictionResult>>, ApiError> {
    Ok(Json(run_predictions(&state, body.requests).await?))
}

fn default_export_name() -> String {
    "weather_predictions".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub requests: Vec<PredictionRequest>,
    #[serde(default = "default_export_name")]
    pub base_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
    pub csv: String,
    pub json: String,
    pub total_predictions: usize,
}

/// Predict a batch and write it to the export directory
async fn export(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, ApiError> {
    let name = body.base_name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(ApiError::BadRequest(format!("invalid export name '{}'", body.base_name)));
    }
    if body.requests.is_empty() {
        return Err(ApiError::BadRequest("no predictions to export".to_string()));
    }

    let results = run_predictions(&state, body.requests).await?;
    let base = state.export_dir.join(name);
    let export_dir = state.export_dir.clone();
    let total = results.len();

    let written = tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&export_dir).map_err(|source| ExportError::Io {
            path: export_dir.clone(),
            source,
        })?;
        export_predictions(&results, &base)
    })
    .await
    .map_err(|e| ApiError::Task(e.to_string()))?;

    let paths = match written {
        Ok(paths) => paths,
        Err(e) => {
            state
                .health_registry
                .set_degraded(components::EXPORTER, e.to_string())
                .await;
            return Err(e.into());
        }
    };

    state.metrics.record_export(total);
    let response = ExportResponse {
        csv: paths.csv.display().to_string(),
        json: paths.json.display().to_string(),
        total_predictions: total,
    };
    state.logger.log_export(total, &response.csv, &response.json);
    Ok(Json(response))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRequest {
    pub date: NaiveDate,
    pub lat: f64,
    pub lon: f64,
    pub activity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPrediction {
    pub humidity: f64,
    pub temperature: f64,
    pub rain: String,
    pub wind_speed: f64,
    pub rain_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub inputs: ActivityRequest,
    pub prediction: ActivityPrediction,
    pub analysis_summary: Option<String>,
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Prediction for a dated activity at a point
async fn activity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActivityRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let request = PredictionRequest::new(body.date.year(), body.lat, body.lon, body.date.month());
    let result = run_prediction(&state, request).await?;
    let p = result.predictions;

    let summary = format!(
        "For {} on {}: about {:.1}°C with {:.0}% humidity and {:.1} m/s winds; rain outlook \"{}\" ({:.0}% confidence).",
        body.activity,
        body.date,
        p.temperature,
        p.humidity,
        p.wind_speed,
        p.rain,
        p.rain_confidence * 100.0
    );

    Ok(Json(ActivityResponse {
        inputs: body,
        prediction: ActivityPrediction {
            humidity: p.humidity,
            temperature: p.temperature,
            rain: p.rain,
            wind_speed: p.wind_speed,
            rain_confidence: p.rain_confidence,
        },
        analysis_summary: Some(summary),
        model_loaded: result.metadata.model_loaded,
        reason: result.metadata.reason,
    }))
}

/// Dashboard analysis from a free-text location label and date
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LiteAnalyzeRequest>,
) -> Result<Json<ClimateData>, ApiError> {
    let (lat, lon) = parse_lat_lon_from_label(&body.location).ok_or_else(|| {
        ApiError::BadRequest("Location must include '(lat, lon)' in the text.".to_string())
    })?;
    let date = parse_user_date(&body.date);

    info!(
        location = %body.location,
        date = %date,
        activity = ?body.activity,
        "Analyzing activity conditions"
    );

    let request = PredictionRequest::new(date.year(), lat, lon, date.month());
    let result = run_prediction(&state, request).await?;
    Ok(Json(climate_data(&body.location, &body.date, &result)))
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/export", post(export))
        .route("/activity", post(activity))
        .route("/analyze", post(analyze));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .nest(&state.api_prefix, api)
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
