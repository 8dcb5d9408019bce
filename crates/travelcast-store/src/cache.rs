//! Cache record types and the cache store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Resolved coordinates for a city. Write-once, never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRecord {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Derived monthly temperature averages for a (city, month) pair.
/// Write-once, never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherStatRecord {
    pub city: String,
    pub month: u32,
    pub min_temp_avg: f64,
    pub max_temp_avg: f64,
}

/// Lookup/insert contract for the result cache.
///
/// Callers always check before inserting; nothing here serializes on the
/// key, so two concurrent writers for the same uncached key may both
/// insert. Records are idempotent by content, so the duplicate is
/// harmless and lookups simply take the first row.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn geocode(&self, city: &str) -> Result<Option<GeocodeRecord>, StoreError>;

    async fn insert_geocode(&self, record: &GeocodeRecord) -> Result<(), StoreError>;

    async fn weather_stat(
        &self,
        city: &str,
        month: u32,
    ) -> Result<Option<WeatherStatRecord>, StoreError>;

    async fn insert_weather_stat(&self, record: &WeatherStatRecord) -> Result<(), StoreError>;
}
