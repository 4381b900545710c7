//! Error types for model loading, inference and export

use std::path::PathBuf;
use thiserror::Error;

use crate::artifacts::ArtifactKind;

/// Reasons the predictor could not be brought up.
///
/// A load error is terminal for the bridge that recorded it: the bridge
/// switches to stub output and reports the error text as the degradation
/// reason.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("USE_MODEL_STUB=true")]
    StubForced,

    #[error("MODEL_DIR not configured")]
    DirectoryNotConfigured,

    #[error("MODEL_DIR not found: {}", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("{artifact} artifact not found (tried: {})", display_paths(.candidates))]
    ArtifactMissing {
        artifact: ArtifactKind,
        candidates: Vec<PathBuf>,
    },

    #[error("failed to deserialize {artifact} artifact at {}: {cause}", .path.display())]
    Deserialize {
        artifact: ArtifactKind,
        path: PathBuf,
        cause: String,
    },

    #[error("failed to instantiate predictor: {0}")]
    Instantiate(String),
}

impl LoadError {
    /// Short machine-readable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::StubForced => "stub_forced",
            LoadError::DirectoryNotConfigured => "directory_not_configured",
            LoadError::DirectoryMissing(_) => "directory_missing",
            LoadError::ArtifactMissing { .. } => "artifact_missing",
            LoadError::Deserialize { .. } => "deserialize_failed",
            LoadError::Instantiate(_) => "instantiate_failed",
        }
    }

    /// True when the failure comes from configuration rather than a broken artifact
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoadError::StubForced | LoadError::DirectoryNotConfigured | LoadError::DirectoryMissing(_)
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while running inference on a loaded model
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid prediction input: {0}")]
    InvalidInput(String),

    #[error("model evaluation failed: {0}")]
    Inference(String),

    #[error("model produced malformed output: {0}")]
    MalformedOutput(String),

    #[error("rain class index {index} is outside the {known} known classes")]
    UnknownClass { index: usize, known: usize },
}

impl PredictError {
    /// True when the caller sent bad input, as opposed to a model fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::InvalidInput(_))
    }
}

/// Errors raised by the result exporter
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no predictions to export")]
    EmptyBatch,

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),
}
