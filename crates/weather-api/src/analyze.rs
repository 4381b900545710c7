//! Mapping between front-end request shapes and prediction requests
//!
//! The dashboard sends free-text location labels such as
//! `"Cairo, Egypt (30.0444, 31.2357)"` and human-formatted dates. These
//! helpers pull coordinates and a calendar date out of them and render the
//! prediction back into the dashboard's condition cards.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use weather_lib::PredictionResult;

const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%Y-%m-%d", "%d %B %Y"];

/// Extract `(lat, lon)` from a location label.
///
/// A parenthesised pair wins; otherwise the first two numbers in the label
/// are used.
pub fn parse_lat_lon_from_label(label: &str) -> Option<(f64, f64)> {
    parenthesised_pair(label).or_else(|| {
        let numbers = scan_numbers(label);
        match numbers.as_slice() {
            [lat, lon, ..] => Some((*lat, *lon)),
            _ => None,
        }
    })
}

fn parenthesised_pair(label: &str) -> Option<(f64, f64)> {
    let mut rest = label;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        let close = after.find(')')?;
        let tokens: Vec<&str> = after[..close]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        if let [lat, lon] = tokens.as_slice() {
            if is_plain_number(lat) && is_plain_number(lon) {
                if let (Ok(lat), Ok(lon)) = (lat.parse(), lon.parse()) {
                    return Some((lat, lon));
                }
            }
        }
        rest = after;
    }
    None
}

/// `-?\d+(\.\d+)?`
fn is_plain_number(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    all_digits(whole) && frac.map_or(true, all_digits)
}

/// Every `-?\d+(\.\d+)?` occurrence in order
fn scan_numbers(text: &str) -> Vec<f64> {
    let chars: Vec<char> = text.chars().collect();
    let mut numbers = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let negative = chars[i] == '-' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit());
        if !(negative || chars[i].is_ascii_digit()) {
            i += 1;
            continue;
        }

        let start = i;
        if negative {
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }

        let token: String = chars[start..i].iter().collect();
        if let Ok(value) = token.parse() {
            numbers.push(value);
        }
    }
    numbers
}

/// Parse a user-facing date, falling back to today (UTC) when unrecognised
pub fn parse_user_date(text: &str) -> NaiveDate {
    let text = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date;
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.date_naive();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return dt.date();
    }

    debug!(date = %text, "Unrecognised date, using today");
    Utc::now().date_naive()
}

fn default_activity() -> Option<String> {
    Some("outdoor activity".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteAnalyzeRequest {
    pub location: String,
    pub date: String,
    #[serde(default = "default_activity")]
    pub activity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub historical: Option<f64>,
    #[serde(rename = "trendAdjusted")]
    pub trend_adjusted: Option<f64>,
    #[serde(rename = "mlProjection")]
    pub ml_projection: Option<f64>,
    pub icon: String,
}

impl Condition {
    fn projected(name: &str, value: f64, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            historical: None,
            trend_adjusted: None,
            ml_projection: Some(value),
            icon: icon.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateData {
    pub location: String,
    pub date: String,
    pub summary: String,
    pub conditions: Vec<Condition>,
}

/// Render a prediction as dashboard condition cards and a one-line summary
pub fn climate_data(location: &str, date: &str, result: &PredictionResult) -> ClimateData {
    let p = &result.predictions;
    let rain_pct = (p.rain_confidence * 100.0).round();

    let conditions = vec![
        Condition::projected("Heavy Rain", rain_pct, "🌧️"),
        Condition::projected("Extreme Heat", p.temperature.round(), "🔥"),
        Condition::projected("High Winds", (p.wind_speed * 10.0).round() / 10.0, "🌬️"),
    ];

    let summary = format!(
        "On {} in {}, model projects {}% chance of rain (“{}”), about {:.1}°C, {:.0}% humidity, and {:.1} m/s winds.",
        date, location, rain_pct, p.rain, p.temperature, p.humidity, p.wind_speed
    );

    ClimateData {
        location: location.to_string(),
        date: date.to_string(),
        summary,
        conditions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_lib::PredictionRequest;

    #[test]
    fn test_parenthesised_label() {
        assert_eq!(
            parse_lat_lon_from_label("Cairo, Egypt (30.0444, 31.2357)"),
            Some((30.0444, 31.2357))
        );
        assert_eq!(
            parse_lat_lon_from_label("Somewhere (-33.9 18.4)"),
            Some((-33.9, 18.4))
        );
    }

    #[test]
    fn test_parenthesised_pair_preferred_over_earlier_numbers() {
        assert_eq!(
            parse_lat_lon_from_label("Route 66 near 12 (35.1, -106.6)"),
            Some((35.1, -106.6))
        );
    }

    #[test]
    fn test_bare_numbers_fallback() {
        assert_eq!(parse_lat_lon_from_label("30.0444, 31.2357"), Some((30.0444, 31.2357)));
        assert_eq!(parse_lat_lon_from_label("Cairo 30.0444 31.2357"), Some((30.0444, 31.2357)));
        assert_eq!(parse_lat_lon_from_label("lat 30 lon -31.5"), Some((30.0, -31.5)));
    }

    #[test]
    fn test_label_without_coordinates() {
        assert_eq!(parse_lat_lon_from_label("Cairo, Egypt"), None);
        assert_eq!(parse_lat_lon_from_label("Zone 9"), None);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert_eq!(parse_user_date("July 15, 2026"), expected);
        assert_eq!(parse_user_date("2026-07-15"), expected);
        assert_eq!(parse_user_date("15 July 2026"), expected);
        assert_eq!(parse_user_date("2026-07-15T08:30:00Z"), expected);
        assert_eq!(parse_user_date("2026-07-15T08:30:00"), expected);
    }

    #[test]
    fn test_unparseable_date_is_today() {
        let today = Utc::now().date_naive();
        let parsed = parse_user_date("someday soon");
        // Tolerate a midnight rollover between the two calls
        assert!(parsed >= today && parsed <= today.succ_opt().unwrap());
    }

    #[test]
    fn test_climate_data_cards() {
        let result = PredictionResult::stub(PredictionRequest::new(2026, 30.0, 31.0, 7), "USE_MODEL_STUB=true");
        let data = climate_data("Cairo (30, 31)", "July 15, 2026", &result);

        assert_eq!(data.conditions.len(), 3);
        assert_eq!(data.conditions[0].ml_projection, Some(100.0));
        assert_eq!(data.conditions[1].ml_projection, Some(20.0));
        assert_eq!(data.conditions[2].ml_projection, Some(2.7));
        assert!(data.summary.contains("100% chance of rain"));
        assert!(data.summary.contains("20.0°C"));
        assert!(data.summary.contains("30% humidity"));
    }
}
