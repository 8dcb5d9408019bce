//! HTTP client for the Travelcast REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn monthly_profile(&self, city: &str, month: &str) -> Result<Value> {
        let url = format!("{}/weather/monthly-profile", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("city", city), ("month", month)])
            .send()
            .await
            .context("Failed to reach the Travelcast API")?;
        Self::into_json(response).await
    }

    pub async fn best_travel_month(
        &self,
        city: &str,
        min_temp: &str,
        max_temp: &str,
    ) -> Result<Value> {
        let url = format!("{}/travel/best-month", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("city", city), ("min_temp", min_temp), ("max_temp", max_temp)])
            .send()
            .await
            .context("Failed to reach the Travelcast API")?;
        Self::into_json(response).await
    }

    pub async fn compare_cities(&self, cities: &str, month: &str) -> Result<Value> {
        let url = format!("{}/travel/compare-cities", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("cities", cities), ("month", month)])
            .send()
            .await
            .context("Failed to reach the Travelcast API")?;
        Self::into_json(response).await
    }

    pub async fn metrics(&self) -> Result<Value> {
        let url = format!("{}/metrics", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the Travelcast API")?;
        Self::into_json(response).await
    }

    /// Decode the response, surfacing the API's error message on failure.
    async fn into_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("Invalid response from the Travelcast API")?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            anyhow::bail!("{} ({})", message, status);
        }

        Ok(body)
    }
}
