//! Rain Parade weather predictor CLI
//!
//! Runs predictions locally against a model directory or remotely against a
//! running weather-api, and exports prediction batches to CSV and JSON.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weather_lib::artifacts::ArtifactNames;
use weather_lib::{BridgeConfig, ModelFormat, PredictionRequest};

use commands::{batch, predict, remote};

/// Rain Parade weather predictor CLI
#[derive(Parser)]
#[command(name = "wxp")]
#[command(author, version, about = "CLI for the Rain Parade weather predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL for remote commands (can also be set via WXP_API_URL env var)
    #[arg(long, env = "WXP_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Route prefix of the remote API's prediction endpoints
    #[arg(long, env = "WXP_API_PREFIX", default_value = "/api/v1")]
    pub api_prefix: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict conditions for one location and month using a local model
    Predict {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Predict a batch of requests from a JSON file and export the results
    Batch {
        /// JSON file holding an array of requests (or {"requests": [...]})
        #[arg(long, short)]
        input: PathBuf,

        /// Base path for the exported files (.csv and .json are appended)
        #[arg(long, short, default_value = "weather_predictions")]
        output: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Query a running weather-api
    #[command(subcommand)]
    Remote(RemoteCommands),
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Request a prediction from the API
    Predict {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show API health
    Health,
}

/// Location and time to predict for
#[derive(Args)]
pub struct QueryArgs {
    #[arg(long)]
    pub year: i32,

    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Month (1-12)
    #[arg(long)]
    pub month: u32,
}

impl QueryArgs {
    fn request(&self) -> PredictionRequest {
        PredictionRequest::new(self.year, self.lat, self.lon, self.month)
    }
}

/// Where the local model comes from
#[derive(Args)]
pub struct ModelArgs {
    /// Directory holding the model artifacts
    #[arg(long, env = "WEATHER_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Skip model loading and serve stub predictions
    #[arg(long)]
    pub stub: bool,

    /// Model artifact format (onnx or linear)
    #[arg(long, default_value = "onnx")]
    pub model_format: ModelFormat,
}

impl ModelArgs {
    fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            model_dir: self.model_dir.clone(),
            force_stub: self.stub,
            model_format: self.model_format,
            artifacts: ArtifactNames::for_format(self.model_format),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Predict { query, model } => {
            predict::predict_local(query.request(), model.bridge_config(), cli.format)?;
        }
        Commands::Batch { input, output, model } => {
            batch::run_batch(&input, &output, model.bridge_config(), cli.format)?;
        }
        Commands::Remote(remote_cmd) => {
            let client = client::ApiClient::new(&cli.api_url, &cli.api_prefix)?;
            match remote_cmd {
                RemoteCommands::Predict { query } => {
                    remote::predict(&client, query.request(), cli.format).await?;
                }
                RemoteCommands::Health => {
                    remote::health(&client, cli.format).await?;
                }
            }
        }
    }

    Ok(())
}
