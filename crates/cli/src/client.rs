//! API client for communicating with the weather API

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;
use weather_lib::{HealthResponse, PredictionRequest, PredictionResult};

/// API client for the weather API
pub struct ApiClient {
    client: Client,
    base_url: Url,
    predict_path: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// `api_prefix` is the route prefix the server nests its prediction
    /// endpoints under (`/api/v1` unless the server overrides `API_PREFIX`).
    pub fn new(base_url: &str, api_prefix: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        let prefix = api_prefix.trim_matches('/');
        let predict_path = if prefix.is_empty() {
            "predict".to_string()
        } else {
            format!("{}/predict", prefix)
        };

        Ok(Self {
            client,
            base_url,
            predict_path,
        })
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        self.post(&self.predict_path, request).await
    }

    /// Fetch `/healthz`; an unhealthy server answers 503 with the same body
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.base_url.join("healthz").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}
