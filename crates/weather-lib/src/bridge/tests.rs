//! Bridge state machine tests
//!
//! These tests build artifact directories on disk to drive the bridge
//! through its load, ready and degraded paths.

use super::*;
use crate::artifacts::ArtifactKind;
use crate::models::Predictions;
use crate::test_support::{onnx_untyped_input_model, write_linear_artifacts};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn ready_bridge(temp_dir: &TempDir) -> ModelBridge {
    write_linear_artifacts(temp_dir.path());
    ModelBridge::new(BridgeConfig::new(temp_dir.path(), ModelFormat::Linear))
}

#[test]
fn test_stub_forced_scenario_returns_fixed_values() {
    let bridge = ModelBridge::new(BridgeConfig::stub());

    let result = bridge
        .predict(&PredictionRequest::new(2024, 22.0, 25.625, 6))
        .unwrap();

    assert_eq!(
        result.predictions,
        Predictions {
            humidity: 30.0,
            temperature: 20.0,
            wind_speed: 2.7,
            rain: "Rained".to_string(),
            rain_confidence: 1.0,
        }
    );
    assert!(!result.metadata.model_loaded);
    assert_eq!(result.metadata.reason.as_deref(), Some("USE_MODEL_STUB=true"));
    assert_eq!(result.input, PredictionRequest::new(2024, 22.0, 25.625, 6));
}

#[test]
fn test_stub_forced_skips_valid_directory() {
    let temp_dir = TempDir::new().unwrap();
    write_linear_artifacts(temp_dir.path());
    let config = BridgeConfig {
        force_stub: true,
        ..BridgeConfig::new(temp_dir.path(), ModelFormat::Linear)
    };
    let bridge = ModelBridge::new(config);

    assert_eq!(bridge.ensure_loaded(), BridgeStatus::Failed);
    assert_eq!(bridge.failure(), Some(&LoadError::StubForced));
}

#[test]
fn test_unconfigured_directory_reason() {
    let bridge = ModelBridge::new(BridgeConfig::default());
    let result = bridge
        .predict(&PredictionRequest::new(2024, 0.0, 0.0, 1))
        .unwrap();

    assert_eq!(result.metadata.reason.as_deref(), Some("MODEL_DIR not configured"));
    assert_eq!(bridge.failure(), Some(&LoadError::DirectoryNotConfigured));
}

#[test]
fn test_missing_directory_loads_at_most_once() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("no-such-models");
    let bridge = ModelBridge::new(BridgeConfig::new(&missing, ModelFormat::Linear));

    let request = PredictionRequest::new(2024, 22.0, 25.625, 6);
    let reasons: Vec<Option<String>> = (0..5)
        .map(|_| bridge.predict(&request).unwrap().metadata.reason)
        .collect();

    let first = reasons[0].clone().unwrap();
    assert!(!first.is_empty());
    assert!(first.contains("no-such-models"));
    assert!(reasons.iter().all(|r| r.as_deref() == Some(first.as_str())));
    assert_eq!(bridge.load_attempts(), 1);
    assert_eq!(bridge.status(), BridgeStatus::Failed);
    assert!(matches!(bridge.failure(), Some(LoadError::DirectoryMissing(_))));
}

#[test]
fn test_failed_state_is_permanent() {
    let temp_dir = TempDir::new().unwrap();
    let model_dir = temp_dir.path().join("models");
    let bridge = ModelBridge::new(BridgeConfig::new(&model_dir, ModelFormat::Linear));
    let request = PredictionRequest::new(2024, 22.0, 25.625, 6);

    assert!(!bridge.predict(&request).unwrap().metadata.model_loaded);

    // Artifacts showing up later must not revive the bridge
    std::fs::create_dir_all(&model_dir).unwrap();
    write_linear_artifacts(&model_dir);

    assert!(!bridge.predict(&request).unwrap().metadata.model_loaded);
    assert_eq!(bridge.load_attempts(), 1);
}

#[test]
fn test_single_missing_artifact_degrades() {
    let temp_dir = TempDir::new().unwrap();
    write_linear_artifacts(temp_dir.path());
    std::fs::remove_file(temp_dir.path().join("scaler.json")).unwrap();
    let bridge = ModelBridge::new(BridgeConfig::new(temp_dir.path(), ModelFormat::Linear));

    let result = bridge
        .predict(&PredictionRequest::new(2024, 22.0, 25.625, 6))
        .unwrap();

    assert!(!result.metadata.model_loaded);
    assert!(result.metadata.reason.unwrap().contains("scaler"));
    assert!(bridge.predictor().is_none());
    assert!(matches!(
        bridge.failure(),
        Some(LoadError::ArtifactMissing {
            artifact: ArtifactKind::Scaler,
            ..
        })
    ));
}

#[test]
fn test_unreadable_onnx_graph_degrades_once() {
    let temp_dir = TempDir::new().unwrap();
    write_linear_artifacts(temp_dir.path());
    std::fs::write(
        temp_dir.path().join(ModelFormat::Onnx.default_model_file()),
        onnx_untyped_input_model(),
    )
    .unwrap();
    let bridge = ModelBridge::new(BridgeConfig::new(temp_dir.path(), ModelFormat::Onnx));
    let request = PredictionRequest::new(2024, 22.0, 25.625, 6);

    for _ in 0..2 {
        let result = bridge.predict(&request).unwrap();
        assert!(!result.metadata.model_loaded);
        assert_eq!(result.predictions.humidity, 30.0);
        assert_eq!(result.predictions.rain, "Rained");
    }

    assert_eq!(bridge.status(), BridgeStatus::Failed);
    assert_eq!(bridge.load_attempts(), 1);
    assert!(matches!(
        bridge.failure(),
        Some(LoadError::Deserialize {
            artifact: ArtifactKind::Model,
            ..
        })
    ));
}

#[test]
fn test_status_unloaded_until_first_call() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = ready_bridge(&temp_dir);

    assert_eq!(bridge.status(), BridgeStatus::Unloaded);
    assert_eq!(bridge.load_attempts(), 0);

    bridge
        .predict(&PredictionRequest::new(2024, 22.0, 25.625, 6))
        .unwrap();
    assert_eq!(bridge.status(), BridgeStatus::Ready);
}

#[test]
fn test_ready_bridge_delegates_to_model() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = ready_bridge(&temp_dir);
    assert_eq!(bridge.ensure_loaded(), BridgeStatus::Ready);

    let request = PredictionRequest::new(2024, 22.0, 25.625, 6);
    let result = bridge.predict(&request).unwrap();
    let direct = bridge.predictor().unwrap().predict_single(&request).unwrap();

    assert!(result.metadata.model_loaded);
    assert!(result.metadata.reason.is_none());
    assert_eq!(result.predictions, direct.predictions);
    assert!((0.0..=1.0).contains(&result.predictions.rain_confidence));
    assert!(bridge.model_info().unwrap().rain_classes.contains(&result.predictions.rain));
}

#[test]
fn test_invalid_input_fails_even_when_degraded() {
    let bridge = ModelBridge::new(BridgeConfig::stub());
    let result = bridge.predict(&PredictionRequest::new(2024, 22.0, 25.625, 13));
    assert!(matches!(result, Err(PredictError::InvalidInput(_))));
}

#[test]
fn test_batch_preserves_order_in_stub_mode() {
    let bridge = ModelBridge::new(BridgeConfig::stub());
    let requests = [
        PredictionRequest::new(2024, 22.0, 25.625, 6),
        PredictionRequest::new(2024, 22.0, 26.25, 7),
        PredictionRequest::new(2025, 22.0, 25.625, 1),
    ];

    let results = bridge.predict_batch(&requests).unwrap();
    let inputs: Vec<PredictionRequest> = results.iter().map(|r| r.input).collect();
    assert_eq!(inputs, requests.to_vec());
    assert!(results.iter().all(|r| r.predictions == Predictions::stub()));
}

#[test]
fn test_batch_matches_single_predictions_when_ready() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = ready_bridge(&temp_dir);
    let a = PredictionRequest::new(2024, 22.0, 25.625, 6);
    let b = PredictionRequest::new(2030, -33.9, 18.4, 11);

    let batch = bridge.predict_batch(&[a, b]).unwrap();
    assert_eq!(batch[0].predictions, bridge.predict(&a).unwrap().predictions);
    assert_eq!(batch[1].predictions, bridge.predict(&b).unwrap().predictions);
}

#[test]
fn test_concurrent_first_calls_load_once() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = Arc::new(ready_bridge(&temp_dir));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                bridge
                    .predict(&PredictionRequest::new(2024, 10.0 + i as f64, 25.0, 6))
                    .unwrap()
                    .metadata
                    .model_loaded
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(bridge.load_attempts(), 1);
}

#[test]
fn test_concurrent_degraded_calls_agree() {
    let bridge = Arc::new(ModelBridge::new(BridgeConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                bridge
                    .predict(&PredictionRequest::new(2024, 22.0, 25.625, 6))
                    .unwrap()
                    .metadata
                    .reason
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("MODEL_DIR not configured"));
    }
    assert_eq!(bridge.load_attempts(), 1);
}
