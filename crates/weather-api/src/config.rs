//! Server configuration
//!
//! Values come from an optional config file (`weather-api.toml` by default,
//! overridable with `WEATHER_CONFIG`) and then from `WEATHER_*` environment
//! variables, which take precedence.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use weather_lib::artifacts::ArtifactNames;
use weather_lib::{BridgeConfig, ModelFormat};

/// Environment variable naming the config file
pub const CONFIG_FILE_ENV: &str = "WEATHER_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "weather-api";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Deployment environment label (dev, staging, prod)
    #[serde(default = "default_env")]
    pub env: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the model artifacts
    #[serde(default)]
    pub model_dir: Option<PathBuf>,

    /// Serve stub predictions without attempting to load a model
    #[serde(default)]
    pub use_model_stub: bool,

    #[serde(default)]
    pub model_format: ModelFormat,

    /// Override for the model artifact file name
    #[serde(default)]
    pub model_file: Option<String>,

    #[serde(default)]
    pub scaler_file: Option<String>,

    #[serde(default)]
    pub label_encoder_file: Option<String>,

    /// Directory the export endpoint writes into
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_app_name() -> String {
    "Rain Parade API".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_env() -> String {
    "dev".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

impl ApiConfig {
    /// Load configuration from the config file and process environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(&file, None)
    }

    /// Load from `file` and an explicit environment map (`None` reads the
    /// process environment)
    pub fn from_sources(file: &str, env: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("WEATHER")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins")
                    .source(env),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Bridge settings derived from this configuration
    pub fn bridge_config(&self) -> BridgeConfig {
        let mut artifacts = ArtifactNames::for_format(self.model_format);
        if let Some(name) = &self.model_file {
            artifacts.model = name.clone();
        }
        if let Some(name) = &self.scaler_file {
            artifacts.scaler = name.clone();
        }
        if let Some(name) = &self.label_encoder_file {
            artifacts.label_encoder = name.clone();
        }

        BridgeConfig {
            model_dir: self.model_dir.clone(),
            force_stub: self.use_model_stub,
            model_format: self.model_format,
            artifacts,
        }
    }
}
