//! weather-api - HTTP front end for the weather predictor
//!
//! Loads configuration, warms up the model bridge and serves predictions
//! until interrupted.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use weather_api::{
    api,
    config::{ApiConfig, LogFormat},
};
use weather_lib::{
    health::{components, HealthRegistry},
    ModelBridge, StructuredLogger,
};

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiConfig::load()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }

    info!(
        app_name = %config.app_name,
        env = %config.env,
        model_dir = ?config.model_dir,
        model_format = %config.model_format,
        use_model_stub = config.use_model_stub,
        cors_origins = ?config.cors_origins,
        "Starting weather-api"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::EXPORTER).await;

    let bridge = Arc::new(ModelBridge::new(config.bridge_config()));
    health_registry.sync_bridge(&bridge).await;

    // Load before accepting traffic so the first request does not pay for it
    let warmup = Arc::clone(&bridge);
    let status = tokio::task::spawn_blocking(move || warmup.ensure_loaded()).await?;
    info!(status = ?status, "Model bridge initialized");
    health_registry.sync_bridge(&bridge).await;

    let logger = StructuredLogger::new(config.app_name.clone());
    let state = Arc::new(
        api::AppState::new(bridge, health_registry.clone())
            .with_api_prefix(config.api_prefix.clone())
            .with_export_dir(config.export_dir.clone())
            .with_logger(logger.clone()),
    );

    health_registry.set_ready(true).await;

    let addr = format!("0.0.0.0:{}", config.api_port);
    logger.log_startup(API_VERSION, &addr);

    tokio::select! {
        result = api::serve(&addr, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
