//! Prediction export to CSV and JSON
//!
//! A batch of results is written twice: as a flat CSV table with one row per
//! prediction, and as a JSON document holding the full nested results plus
//! export metadata. Re-exporting to the same base name overwrites both files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::models::PredictionResult;

/// Format version written into the JSON metadata
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// One CSV row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub prediction_id: usize,
    pub year: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub month: u32,
    pub predicted_humidity: f64,
    pub predicted_temperature: f64,
    pub predicted_wind_speed: f64,
    pub predicted_rain: String,
    pub rain_confidence: f64,
    pub prediction_timestamp: DateTime<Utc>,
}

impl ExportRecord {
    /// Flatten a result; `prediction_id` is 1-based
    pub fn from_result(prediction_id: usize, result: &PredictionResult) -> Self {
        Self {
            prediction_id,
            year: result.input.year,
            latitude: result.input.lat,
            longitude: result.input.lon,
            month: result.input.month,
            predicted_humidity: result.predictions.humidity,
            predicted_temperature: result.predictions.temperature,
            predicted_wind_speed: result.predictions.wind_speed,
            predicted_rain: result.predictions.rain.clone(),
            rain_confidence: result.predictions.rain_confidence,
            prediction_timestamp: result.metadata.prediction_timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub export_date: DateTime<Utc>,
    pub total_predictions: usize,
    pub model_version: String,
    pub output_files: Vec<String>,
}

/// JSON export document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBatch {
    pub metadata: ExportMetadata,
    pub predictions: Vec<PredictionResult>,
}

/// Paths of the files written by one export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Write `results` to `<base_name>.csv` and `<base_name>.json`
pub fn export_predictions(
    results: &[PredictionResult],
    base_name: impl AsRef<Path>,
) -> Result<ExportPaths, ExportError> {
    if results.is_empty() {
        return Err(ExportError::EmptyBatch);
    }

    let base = base_name.as_ref();
    let paths = ExportPaths {
        csv: with_suffix(base, "csv"),
        json: with_suffix(base, "json"),
    };

    write_csv(results, &paths.csv)?;

    let batch = ExportBatch {
        metadata: ExportMetadata {
            export_date: Utc::now(),
            total_predictions: results.len(),
            model_version: EXPORT_FORMAT_VERSION.to_string(),
            output_files: vec![
                paths.csv.display().to_string(),
                paths.json.display().to_string(),
            ],
        },
        predictions: results.to_vec(),
    };
    write_json(&batch, &paths.json)?;

    Ok(paths)
}

// Appends rather than replacing, so "2024.06" becomes "2024.06.csv".
fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_csv(results: &[PredictionResult], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    for (i, result) in results.iter().enumerate() {
        writer.serialize(ExportRecord::from_result(i + 1, result))?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(batch: &ExportBatch, path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, batch)?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PredictionRequest, Predictions};
    use std::fs;
    use tempfile::TempDir;

    fn results(n: usize) -> Vec<PredictionResult> {
        (0..n)
            .map(|i| {
                PredictionResult::from_model(
                    PredictionRequest::new(2024, 22.0, 25.625 + i as f64, 6),
                    Predictions {
                        humidity: 40.0 + i as f64,
                        temperature: 30.5,
                        wind_speed: 3.25,
                        rain: "No Rain".to_string(),
                        rain_confidence: 0.875,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_export_writes_n_rows() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("weather_predictions");

        let paths = export_predictions(&results(3), &base).unwrap();
        assert_eq!(paths.csv, temp_dir.path().join("weather_predictions.csv"));
        assert_eq!(paths.json, temp_dir.path().join("weather_predictions.json"));

        let mut reader = csv::Reader::from_path(&paths.csv).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "prediction_id",
                "year",
                "latitude",
                "longitude",
                "month",
                "predicted_humidity",
                "predicted_temperature",
                "predicted_wind_speed",
                "predicted_rain",
                "rain_confidence",
                "prediction_timestamp",
            ]
        );

        let records: Vec<ExportRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.prediction_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(records[2].longitude, 27.625);
        assert_eq!(records[0].predicted_rain, "No Rain");
    }

    #[test]
    fn test_export_json_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("batch");

        let paths = export_predictions(&results(4), &base).unwrap();
        let batch: ExportBatch =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();

        assert_eq!(batch.metadata.total_predictions, 4);
        assert_eq!(batch.metadata.model_version, EXPORT_FORMAT_VERSION);
        assert_eq!(batch.metadata.output_files.len(), 2);
        assert!(batch.metadata.output_files[0].ends_with("batch.csv"));
        assert_eq!(batch.predictions.len(), 4);
        for (written, expected) in batch.predictions.iter().zip(results(4)) {
            assert_eq!(written.input, expected.input);
            assert_eq!(written.predictions, expected.predictions);
            assert!(written.metadata.model_loaded);
        }
    }

    #[test]
    fn test_export_empty_batch_fails_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("empty");

        assert!(matches!(
            export_predictions(&[], &base),
            Err(ExportError::EmptyBatch)
        ));
        assert!(!temp_dir.path().join("empty.csv").exists());
        assert!(!temp_dir.path().join("empty.json").exists());
    }

    #[test]
    fn test_export_overwrites_previous_output() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("rerun");

        export_predictions(&results(5), &base).unwrap();
        let paths = export_predictions(&results(2), &base).unwrap();

        let mut reader = csv::Reader::from_path(&paths.csv).unwrap();
        assert_eq!(reader.records().count(), 2);
        let batch: ExportBatch =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(batch.metadata.total_predictions, 2);
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("missing").join("out");

        assert!(matches!(
            export_predictions(&results(1), &base),
            Err(ExportError::Io { .. })
        ));
    }

    #[test]
    fn test_with_suffix_keeps_dots() {
        assert_eq!(
            with_suffix(Path::new("out/2024.06"), "csv"),
            PathBuf::from("out/2024.06.csv")
        );
    }
}
