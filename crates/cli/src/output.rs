//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use weather_lib::PredictionResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a rounded table of rows
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" => status.green().to_string(),
        "degraded" | "unloaded" => status.yellow().to_string(),
        "unhealthy" | "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print one prediction as a field/value table, or as JSON
pub fn print_prediction(result: &PredictionResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table => {
            let p = &result.predictions;
            let rows = vec![
                FieldRow { field: "Year", value: result.input.year.to_string() },
                FieldRow { field: "Latitude", value: format!("{:.4}", result.input.lat) },
                FieldRow { field: "Longitude", value: format!("{:.4}", result.input.lon) },
                FieldRow { field: "Month", value: result.input.month.to_string() },
                FieldRow { field: "Humidity", value: format!("{:.1}%", p.humidity) },
                FieldRow { field: "Temperature", value: format!("{:.1}°C", p.temperature) },
                FieldRow { field: "Wind speed", value: format!("{:.1} m/s", p.wind_speed) },
                FieldRow { field: "Rain", value: p.rain.cyan().to_string() },
                FieldRow { field: "Rain confidence", value: color_confidence(p.rain_confidence) },
            ];
            print_table(rows);

            if result.metadata.model_loaded {
                print_success("Prediction generated by the trained model");
            } else {
                let reason = result.metadata.reason.as_deref().unwrap_or("unknown");
                print_warning(&format!("Model unavailable ({}); showing stub prediction", reason));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(1.0), "100%");
        assert_eq!(format_confidence(0.734), "73%");
    }

    #[test]
    fn test_color_confidence_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(color_confidence(0.9), "90%");
        assert_eq!(color_status("degraded"), "degraded");
    }
}
