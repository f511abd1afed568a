//! Thin `reqwest` client over the dashboard REST API.

use binwatch_types::{Bin, SimulationConfig};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::PollerError;

/// Body of `POST /api/simulation/trigger`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriggerResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Whether at least one bin advanced.
    pub updated: bool,
    /// Config after the tick; absent when the simulation was not running.
    #[serde(default)]
    pub config: Option<SimulationConfig>,
}

/// Client for one dashboard server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// `GET /api/simulation/config`.
    pub async fn get_config(&self) -> Result<SimulationConfig, PollerError> {
        self.get_json("/api/simulation/config").await
    }

    /// `GET /api/bins`.
    pub async fn get_bins(&self) -> Result<Vec<Bin>, PollerError> {
        self.get_json("/api/bins").await
    }

    /// `POST /api/simulation/trigger`.
    pub async fn trigger(&self) -> Result<TriggerResponse, PollerError> {
        const ENDPOINT: &str = "/api/simulation/trigger";
        let response = self.client.post(self.url(ENDPOINT)).send().await?;
        Self::decode(ENDPOINT, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, PollerError> {
        let response = self.client.get(self.url(endpoint)).send().await?;
        Self::decode(endpoint, response).await
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, PollerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("unable to read error body: {e}"));
            return Err(PollerError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(client.url("/api/bins"), "http://localhost:5000/api/bins");
    }

    #[test]
    fn idle_trigger_body_has_no_config() {
        let body = r#"{"message":"Simulation is not running","updated":false}"#;
        let parsed: Option<TriggerResponse> = serde_json::from_str(body).ok();
        assert_eq!(parsed.as_ref().map(|r| r.updated), Some(false));
        assert!(parsed.is_some_and(|r| r.config.is_none()));
    }
}
