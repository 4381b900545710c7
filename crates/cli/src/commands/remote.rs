//! Commands that talk to a running weather-api

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use weather_lib::PredictionRequest;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_prediction, print_table, OutputFormat};

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub async fn predict(client: &ApiClient, request: PredictionRequest, format: OutputFormat) -> Result<()> {
    let result = client.predict(&request).await?;
    print_prediction(&result, format)
}

pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{} {}", "API status:".bold(), color_status(health.status.as_str()));

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, c)| ComponentRow {
                    name: name.clone(),
                    status: color_status(c.status.as_str()),
                    message: c.message.clone().unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            print_table(rows);
        }
    }

    Ok(())
}
