//! Batch prediction and export command

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tabled::Tabled;
use weather_lib::{export_predictions, BridgeConfig, ModelBridge, PredictionRequest, PredictionResult};

use crate::output::{color_confidence, print_info, print_json, print_success, print_table, print_warning, OutputFormat};

/// Accepted shapes of the batch input file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchInput {
    List(Vec<PredictionRequest>),
    Wrapped { requests: Vec<PredictionRequest> },
}

impl BatchInput {
    fn into_requests(self) -> Vec<PredictionRequest> {
        match self {
            BatchInput::List(requests) | BatchInput::Wrapped { requests } => requests,
        }
    }
}

/// Row for the batch summary table
#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "#")]
    id: usize,
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "Month")]
    month: u32,
    #[tabled(rename = "Lat")]
    lat: String,
    #[tabled(rename = "Lon")]
    lon: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Wind")]
    wind_speed: String,
    #[tabled(rename = "Rain")]
    rain: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl BatchRow {
    fn new(id: usize, result: &PredictionResult) -> Self {
        let p = &result.predictions;
        Self {
            id,
            year: result.input.year,
            month: result.input.month,
            lat: format!("{:.3}", result.input.lat),
            lon: format!("{:.3}", result.input.lon),
            humidity: format!("{:.1}%", p.humidity),
            temperature: format!("{:.1}°C", p.temperature),
            wind_speed: format!("{:.1}", p.wind_speed),
            rain: p.rain.clone(),
            confidence: color_confidence(p.rain_confidence),
        }
    }
}

#[derive(Serialize)]
struct BatchSummary<'a> {
    total_predictions: usize,
    model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    csv: String,
    json: String,
}

/// Read requests from `input`, predict them all and export to `output`
pub fn run_batch(input: &Path, output: &Path, config: BridgeConfig, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read batch input {}", input.display()))?;
    let requests = serde_json::from_str::<BatchInput>(&content)
        .with_context(|| format!("Failed to parse batch input {}", input.display()))?
        .into_requests();

    if requests.is_empty() {
        anyhow::bail!("Batch input {} contains no requests", input.display());
    }

    let bridge = ModelBridge::new(config);
    let results = bridge.predict_batch(&requests)?;
    let paths = export_predictions(&results, output)?;

    let reason = bridge.failure().map(ToString::to_string);
    match format {
        OutputFormat::Json => print_json(&BatchSummary {
            total_predictions: results.len(),
            model_loaded: reason.is_none(),
            reason: reason.as_deref(),
            csv: paths.csv.display().to_string(),
            json: paths.json.display().to_string(),
        })?,
        OutputFormat::Table => {
            println!("{}", "Batch Predictions".bold());
            let rows = results
                .iter()
                .enumerate()
                .map(|(i, r)| BatchRow::new(i + 1, r))
                .collect();
            print_table::<BatchRow>(rows);

            if let Some(reason) = &reason {
                print_warning(&format!("Model unavailable ({}); stub predictions exported", reason));
            }
            print_success(&format!("Exported {} predictions", results.len()));
            print_info(&format!("CSV:  {}", paths.csv.display()));
            print_info(&format!("JSON: {}", paths.json.display()));
        }
    }

    Ok(())
}
