//! Local prediction command

use anyhow::Result;
use tracing::debug;
use weather_lib::{BridgeConfig, ModelBridge, PredictionRequest};

use crate::output::{print_prediction, OutputFormat};

/// Predict one request with a locally loaded model (or the stub)
pub fn predict_local(request: PredictionRequest, config: BridgeConfig, format: OutputFormat) -> Result<()> {
    let bridge = ModelBridge::new(config);
    let result = bridge.predict(&request)?;
    debug!(status = ?bridge.status(), "Local prediction complete");

    print_prediction(&result, format)
}
