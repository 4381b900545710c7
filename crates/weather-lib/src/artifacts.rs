//! Model artifact discovery
//!
//! A predictor needs three artifacts: the model weights, the feature scaler
//! and the rain label encoder. Each is looked up next to the configured
//! model directory first, then relative to the working directory.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::predictor::ModelFormat;

/// Default scaler artifact file name
pub const DEFAULT_SCALER_FILE: &str = "scaler.json";

/// Default label encoder artifact file name
pub const DEFAULT_LABEL_ENCODER_FILE: &str = "label_encoder.json";

/// The artifacts a predictor is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Scaler,
    LabelEncoder,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Scaler => "scaler",
            ArtifactKind::LabelEncoder => "label encoder",
        };
        f.write_str(name)
    }
}

/// File names of the three artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactNames {
    pub model: String,
    pub scaler: String,
    pub label_encoder: String,
}

impl ArtifactNames {
    /// Default names for the given model format
    pub fn for_format(format: ModelFormat) -> Self {
        Self {
            model: format.default_model_file().to_string(),
            scaler: DEFAULT_SCALER_FILE.to_string(),
            label_encoder: DEFAULT_LABEL_ENCODER_FILE.to_string(),
        }
    }

    fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Model => &self.model,
            ArtifactKind::Scaler => &self.scaler,
            ArtifactKind::LabelEncoder => &self.label_encoder,
        }
    }
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self::for_format(ModelFormat::default())
    }
}

/// Resolved paths of a complete artifact set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub label_encoder: PathBuf,
}

/// Candidate locations for `filename`, in lookup order
pub fn candidate_paths(base_dir: &Path, filename: &str) -> Vec<PathBuf> {
    vec![
        base_dir.join(filename),
        PathBuf::from(filename),
        Path::new(".").join(filename),
    ]
}

/// Find `filename` in the first candidate location that exists.
///
/// Artifacts bundled in `base_dir` take precedence over files in the working
/// directory. Returns `None` after logging every location tried.
pub fn locate(base_dir: &Path, filename: &str) -> Option<PathBuf> {
    let candidates = candidate_paths(base_dir, filename);
    if let Some(found) = candidates.iter().find(|p| p.exists()) {
        debug!(file = %filename, path = %found.display(), "Found model artifact");
        return Some(found.clone());
    }

    warn!(
        file = %filename,
        candidates = ?candidates,
        "Could not find model artifact"
    );
    None
}

/// Resolve all three artifacts; any missing one makes the whole set unavailable
pub fn locate_all(base_dir: &Path, names: &ArtifactNames) -> Result<ArtifactSet, LoadError> {
    let resolve = |kind: ArtifactKind| {
        let filename = names.get(kind);
        locate(base_dir, filename).ok_or_else(|| LoadError::ArtifactMissing {
            artifact: kind,
            candidates: candidate_paths(base_dir, filename),
        })
    };

    Ok(ArtifactSet {
        model: resolve(ArtifactKind::Model)?,
        scaler: resolve(ArtifactKind::Scaler)?,
        label_encoder: resolve(ArtifactKind::LabelEncoder)?,
    })
}

/// Compute SHA256 fingerprint of artifact bytes
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Read an artifact, mapping I/O failures to a load error for that artifact
pub(crate) fn read_artifact(kind: ArtifactKind, path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|e| LoadError::Deserialize {
        artifact: kind,
        path: path.to_path_buf(),
        cause: e.to_string(),
    })
}
