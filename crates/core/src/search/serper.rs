//! Serper.dev search API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::types::{OrganicResult, PlaceResult, SearchClient, SearchError, SearchRequest};
use crate::config::SearchConfig;
use crate::metrics;

const MAX_ORGANIC_RESULTS: u32 = 100;
const MAX_PLACE_RESULTS: u32 = 20;

pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    country: String,
    language: String,
}

impl SerperClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            language: config.language.clone(),
        })
    }

    fn body(&self, request: &SearchRequest, max: u32) -> SerperRequest {
        let localized = request.location.is_some();
        SerperRequest {
            q: request.query.clone(),
            num: request.num.clamp(1, max),
            gl: localized.then(|| self.country.clone()),
            hl: localized.then(|| self.language.clone()),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &SerperRequest,
    ) -> Result<T, SearchError> {
        let started = Instant::now();
        let result = self.send(operation, body).await;

        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["serper", operation])
            .observe(started.elapsed().as_secs_f64());
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&[
                "serper",
                operation,
                if result.is_ok() { "success" } else { "error" },
            ])
            .inc();

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &SerperRequest,
    ) -> Result<T, SearchError> {
        let url = format!("{}/{}", self.api_base, operation);
        debug!(url = %url, query = %body.q, num = body.num, "Serper request");

        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::ConnectionFailed(e.to_string())
                } else {
                    SearchError::ApiError {
                        status: None,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(SearchError::RateLimited { retry_after_ms });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError {
                status: Some(status.as_u16()),
                message: format!(
                    "HTTP {}: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest {
    q: String,
    num: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<PlaceResult>,
}

#[async_trait]
impl SearchClient for SerperClient {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<OrganicResult>, SearchError> {
        let body = self.body(request, MAX_ORGANIC_RESULTS);
        let response: OrganicResponse = self.post("search", &body).await?;
        Ok(response.organic)
    }

    async fn places(&self, request: &SearchRequest) -> Result<Vec<PlaceResult>, SearchError> {
        let body = self.body(request, MAX_PLACE_RESULTS);
        let response: PlacesResponse = self.post("places", &body).await?;
        Ok(response.places)
    }
}
