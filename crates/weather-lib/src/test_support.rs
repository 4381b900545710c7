//! Shared fixtures for unit tests

use std::fs;
use std::path::Path;

use crate::predictor::{
    FeatureScaler, LabelEncoder, LinearModel, ModelFormat, RegressionHead, SoftmaxHead,
};

pub fn linear_model() -> LinearModel {
    LinearModel {
        humidity: RegressionHead {
            weights: [0.5, -8.0, 1.5, 2.0],
            bias: 55.0,
        },
        temperature: RegressionHead {
            weights: [0.8, -6.0, 0.5, 3.0],
            bias: 24.0,
        },
        wind_speed: RegressionHead {
            weights: [0.0, 0.7, -0.2, 0.1],
            bias: 3.2,
        },
        rain: SoftmaxHead {
            weights: vec![[0.1, 0.9, -0.4, 0.3], [-0.1, -0.9, 0.4, -0.3]],
            bias: vec![0.2, -0.2],
        },
    }
}

pub fn scaler() -> FeatureScaler {
    FeatureScaler::Standard {
        mean: [2000.0, 0.0, 0.0, 6.5],
        scale: [25.0, 45.0, 90.0, 3.5],
    }
}

pub fn encoder() -> LabelEncoder {
    LabelEncoder::new(vec!["No Rain".to_string(), "Rained".to_string()])
}

/// Write a complete linear-format artifact set into `dir`
pub fn write_linear_artifacts(dir: &Path) {
    fs::write(
        dir.join(ModelFormat::Linear.default_model_file()),
        serde_json::to_vec(&linear_model()).unwrap(),
    )
    .unwrap();
    fs::write(dir.join("scaler.json"), serde_json::to_vec(&scaler()).unwrap()).unwrap();
    fs::write(
        dir.join("label_encoder.json"),
        serde_json::to_vec(&encoder()).unwrap(),
    )
    .unwrap();
}

/// Minimal protobuf writer for hand-built ONNX graphs
#[derive(Default)]
struct Proto(Vec<u8>);

impl Proto {
    fn varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.0.push(byte);
                break;
            }
            self.0.push(byte | 0x80);
        }
    }

    fn int(mut self, field: u64, value: u64) -> Self {
        self.varint(field << 3);
        self.varint(value);
        self
    }

    fn bytes(mut self, field: u64, payload: &[u8]) -> Self {
        self.varint((field << 3) | 2);
        self.varint(payload.len() as u64);
        self.0.extend_from_slice(payload);
        self
    }

    fn str(self, field: u64, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    fn msg(self, field: u64, message: Proto) -> Self {
        self.bytes(field, &message.0)
    }
}

// ONNX enum values
const ONNX_FLOAT: u64 = 1;
const ONNX_ATTR_TENSOR: u64 = 4;

fn float_value_info(name: &str, dims: &[u64]) -> Proto {
    let shape = dims
        .iter()
        .fold(Proto::default(), |shape, d| shape.msg(1, Proto::default().int(1, *d)));
    let tensor_type = Proto::default().int(1, ONNX_FLOAT).msg(2, shape);
    Proto::default()
        .str(1, name)
        .msg(2, Proto::default().msg(1, tensor_type))
}

fn constant_node(output: &str, values: &[f32]) -> Proto {
    let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let tensor = Proto::default()
        .int(1, 1)
        .int(1, values.len() as u64)
        .int(2, ONNX_FLOAT)
        .bytes(9, &raw);
    let attribute = Proto::default()
        .str(1, "value")
        .msg(5, tensor)
        .int(20, ONNX_ATTR_TENSOR);

    Proto::default()
        .str(2, output)
        .str(3, output)
        .str(4, "Constant")
        .msg(5, attribute)
}

fn onnx_model(graph: Proto) -> Vec<u8> {
    Proto::default()
        .int(1, 7)
        .msg(8, Proto::default().int(2, 13))
        .msg(7, graph)
        .0
}

/// ONNX model ignoring its `x: f32[1, 4]` input and emitting fixed outputs
pub fn onnx_constant_model(humidity: f32, temperature: f32, wind_speed: f32, rain: &[f32]) -> Vec<u8> {
    let heads = [
        ("humidity", vec![humidity]),
        ("temperature", vec![temperature]),
        ("wind_speed", vec![wind_speed]),
        ("rain", rain.to_vec()),
    ];

    let mut graph = Proto::default();
    for (name, values) in &heads {
        graph = graph.msg(1, constant_node(name, values));
    }
    graph = graph.str(2, "weather").msg(11, float_value_info("x", &[1, 4]));
    for (name, values) in &heads {
        graph = graph.msg(12, float_value_info(name, &[1, values.len() as u64]));
    }
    onnx_model(graph)
}

/// ONNX model whose only input carries no type information
pub fn onnx_untyped_input_model() -> Vec<u8> {
    let graph = Proto::default()
        .str(2, "weather")
        .msg(11, Proto::default().str(1, "x"));
    onnx_model(graph)
}
