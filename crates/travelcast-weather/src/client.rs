//! Open-Meteo upstream client: geocoding search and historical archive.
//!
//! Both endpoints are plain JSON-over-HTTPS GETs. Base URLs are
//! configurable so tests can point the client at a stub server.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use travelcast_core::ServiceError;

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com";

/// Fixed historical range the statistics are computed over. The range is
/// closed, which is why derived records never need invalidation.
pub const START_DATE: &str = "2018-01-01";
pub const END_DATE: &str = "2023-12-31";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Option<Vec<GeocodeHit>>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeHit {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<DailySeries>,
}

/// Daily min/max temperature series with their dates, as returned by the
/// archive endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub temperature_2m_min: Vec<f64>,
    pub temperature_2m_max: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    geocoding_url: String,
    archive_url: String,
}

impl OpenMeteoClient {
    /// Client against the public Open-Meteo endpoints.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base_urls(GEOCODING_URL, ARCHIVE_URL)
    }

    /// Client against explicit base URLs.
    pub fn with_base_urls(geocoding_url: &str, archive_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            geocoding_url: geocoding_url.trim_end_matches('/').to_string(),
            archive_url: archive_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look a city name up in the geocoding index.
    pub async fn search_city(&self, city: &str) -> Result<GeocodingResponse, ServiceError> {
        let url = format!("{}/v1/search", self.geocoding_url);
        let response = self
            .client
            .get(&url)
            .query(&[("name", city)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Geocoding request failed for city {}: {}", city, e);
                ServiceError::upstream("Geocoding API request failed.")
            })?;

        if !response.status().is_success() {
            tracing::error!(
                "Geocoding API returned status {} for city {}",
                response.status(),
                city
            );
            return Err(ServiceError::upstream("Geocoding API request failed."));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Malformed geocoding payload for city {}: {}", city, e);
            ServiceError::upstream("Geocoding API request failed.")
        })
    }

    /// Fetch the daily min/max temperature series over the fixed
    /// historical range.
    pub async fn daily_archive(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<DailySeries, ServiceError> {
        let url = format!("{}/v1/archive", self.archive_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", START_DATE.to_string()),
                ("end_date", END_DATE.to_string()),
                (
                    "daily",
                    "temperature_2m_min,temperature_2m_max".to_string(),
                ),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Archive request failed: {}", e);
                ServiceError::upstream("Weather API request failed.")
            })?;

        if !response.status().is_success() {
            tracing::error!("Archive API returned status {}", response.status());
            return Err(ServiceError::upstream("Weather API request failed."));
        }

        let body: ArchiveResponse = response.json().await.map_err(|e| {
            tracing::error!("Malformed archive payload: {}", e);
            ServiceError::upstream("Weather API request failed.")
        })?;

        body.daily
            .ok_or_else(|| ServiceError::upstream("Weather data not available."))
    }
}
