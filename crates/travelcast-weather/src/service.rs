//! Core orchestration: coordinate resolution, monthly averages, and the
//! three business operations behind the REST and bot surfaces.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use travelcast_core::ServiceError;
use travelcast_store::{CacheStore, GeocodeRecord, WeatherStatRecord};

use crate::client::OpenMeteoClient;
use crate::types::{BestTravelMonth, CityComparison, CityStats, MonthlyProfile};

const MIN_CITIES: usize = 2;
const MAX_CITIES: usize = 5;

/// Weather service: one implementation parameterized by the cache store.
///
/// Cache reads and writes are best-effort. A failing store read counts as
/// a miss and a failing write is dropped with a warning; only upstream
/// and validation failures abort a request.
#[derive(Clone)]
pub struct WeatherService {
    upstream: OpenMeteoClient,
    cache: Arc<dyn CacheStore>,
}

impl WeatherService {
    pub fn new(upstream: OpenMeteoClient, cache: Arc<dyn CacheStore>) -> Self {
        Self { upstream, cache }
    }

    /// Resolve a city to (latitude, longitude), cache first.
    pub async fn resolve_coordinates(&self, city: &str) -> Result<(f64, f64), ServiceError> {
        match self.cache.geocode(city).await {
            Ok(Some(record)) => {
                debug!("Geocode cache hit for city: {}", city);
                return Ok((record.latitude, record.longitude));
            }
            Ok(None) => {}
            Err(e) => warn!("Geocode cache lookup failed for city {}: {}", city, e),
        }

        info!("Fetching geocode data for city: {}", city);
        let response = self.upstream.search_city(city).await?;

        let hit = response
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!("City '{}' not found in geocoding API", city);
                ServiceError::not_found(format!("City '{}' not found.", city))
            })?;

        let record = GeocodeRecord {
            city: city.to_string(),
            latitude: hit.latitude,
            longitude: hit.longitude,
        };
        if let Err(e) = self.cache.insert_geocode(&record).await {
            warn!("Failed to cache geocode for city {}: {}", city, e);
        }

        debug!(
            "Geocode data for city '{}': lat={}, lon={}",
            city, hit.latitude, hit.longitude
        );
        Ok((hit.latitude, hit.longitude))
    }

    /// Average daily min/max temperatures for (city, month), cache first.
    pub async fn monthly_average(&self, city: &str, month: u32) -> Result<(f64, f64), ServiceError> {
        match self.cache.weather_stat(city, month).await {
            Ok(Some(record)) => {
                debug!("Weather cache hit for city and month: {}-{}", city, month);
                return Ok((record.min_temp_avg, record.max_temp_avg));
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Weather cache lookup failed for {}-{}: {}",
                city, month, e
            ),
        }

        let (latitude, longitude) = self.resolve_coordinates(city).await?;
        info!("Fetching weather data for city: {}, month: {}", city, month);
        let daily = self.upstream.daily_archive(latitude, longitude).await?;

        let min_temp_avg = monthly_mean(&daily.time, &daily.temperature_2m_min, month)?;
        let max_temp_avg = monthly_mean(&daily.time, &daily.temperature_2m_max, month)?;

        let record = WeatherStatRecord {
            city: city.to_string(),
            month,
            min_temp_avg,
            max_temp_avg,
        };
        if let Err(e) = self.cache.insert_weather_stat(&record).await {
            warn!("Failed to cache weather stat for {}-{}: {}", city, month, e);
        }

        debug!(
            "Weather data for {}, month {}: min_avg={}, max_avg={}",
            city, month, min_temp_avg, max_temp_avg
        );
        Ok((min_temp_avg, max_temp_avg))
    }

    /// Monthly weather profile for a city.
    pub async fn monthly_profile(
        &self,
        city: Option<&str>,
        month: Option<&str>,
    ) -> Result<MonthlyProfile, ServiceError> {
        let (city, month) = match (required(city), required(month)) {
            (Some(city), Some(month)) => (city, month),
            _ => {
                return Err(ServiceError::validation(
                    "City and month parameters are required.",
                ))
            }
        };
        let month = parse_month(month)?;

        let (min_temp_avg, max_temp_avg) = self.monthly_average(city, month).await?;
        Ok(MonthlyProfile {
            city: city.to_string(),
            month,
            min_temp_avg,
            max_temp_avg,
        })
    }

    /// The month whose averages most closely match the requested comfort
    /// range. Months are scanned in ascending order and only a strictly
    /// smaller difference replaces the incumbent, so ties go to the
    /// earliest month.
    pub async fn best_travel_month(
        &self,
        city: Option<&str>,
        min_temp: Option<&str>,
        max_temp: Option<&str>,
    ) -> Result<BestTravelMonth, ServiceError> {
        let (city, min_temp, max_temp) =
            match (required(city), required(min_temp), required(max_temp)) {
                (Some(city), Some(min_temp), Some(max_temp)) => (city, min_temp, max_temp),
                _ => {
                    return Err(ServiceError::validation(
                        "City, min_temp, and max_temp parameters are required.",
                    ))
                }
            };
        let min_temp = parse_temperature(min_temp)?;
        let max_temp = parse_temperature(max_temp)?;

        info!(
            "Calculating best travel month for city: {} with preferred temps: min={}, max={}",
            city, min_temp, max_temp
        );

        let mut best_month = 0u32;
        let mut best = (f64::INFINITY, 0.0, 0.0);
        for month in 1..=12u32 {
            let (min_avg, max_avg) = self.monthly_average(city, month).await?;
            let min_diff = (min_temp - min_avg).abs();
            let max_diff = (max_temp - max_avg).abs();
            let overall = min_diff + max_diff;
            if overall < best.0 {
                best = (overall, min_diff, max_diff);
                best_month = month;
            }
        }

        Ok(BestTravelMonth {
            city: city.to_string(),
            best_month,
            min_temp_diff: round2(best.1),
            max_temp_diff: round2(best.2),
            overall_diff: round2(best.0),
        })
    }

    /// Side-by-side monthly averages for 2 to 5 cities.
    pub async fn compare_cities(
        &self,
        cities: Option<&str>,
        month: Option<&str>,
    ) -> Result<CityComparison, ServiceError> {
        let (cities, month) = match (required(cities), required(month)) {
            (Some(cities), Some(month)) => (cities, month),
            _ => {
                return Err(ServiceError::validation(
                    "Cities and month parameters are required.",
                ))
            }
        };
        let month = parse_month(month)?;

        let city_list: Vec<&str> = cities.split(',').map(str::trim).collect();
        if !(MIN_CITIES..=MAX_CITIES).contains(&city_list.len()) {
            warn!("Invalid number of cities: {}", city_list.len());
            return Err(ServiceError::validation(
                "Number of cities must be between 2 and 5.",
            ));
        }

        info!("Comparing cities: {:?} for month: {}", city_list, month);
        let mut entries = BTreeMap::new();
        for city in city_list {
            let (min_temp_avg, max_temp_avg) = self.monthly_average(city, month).await?;
            entries.insert(
                city.to_string(),
                CityStats {
                    min_temp_avg,
                    max_temp_avg,
                },
            );
            debug!("Added weather data for city: {}", city);
        }

        Ok(CityComparison {
            month,
            cities: entries,
        })
    }
}

/// Treat absent and empty parameters alike.
fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_month(raw: &str) -> Result<u32, ServiceError> {
    let month: u32 = raw.trim().parse().map_err(|_| {
        warn!("Invalid month value: {}", raw);
        ServiceError::validation("Invalid month. Month must be between 1 and 12.")
    })?;
    if !(1..=12).contains(&month) {
        warn!("Invalid month value: {}", month);
        return Err(ServiceError::validation(
            "Invalid month. Month must be between 1 and 12.",
        ));
    }
    Ok(month)
}

fn parse_temperature(raw: &str) -> Result<f64, ServiceError> {
    raw.trim().parse().map_err(|_| {
        warn!("Invalid temperature value: {}", raw);
        ServiceError::validation("min_temp and max_temp must be numbers.")
    })
}

/// Mean of the samples whose date falls in the requested calendar month,
/// rounded to 2 decimals. Entries with unparsable dates are skipped.
fn monthly_mean(dates: &[String], temps: &[f64], month: u32) -> Result<f64, ServiceError> {
    let filtered: Vec<f64> = dates
        .iter()
        .zip(temps)
        .filter_map(|(date, temp)| {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            (parsed.month() == month).then_some(*temp)
        })
        .collect();

    if filtered.is_empty() {
        warn!("No data for month {}", month);
        return Err(ServiceError::not_found("No data for the specified month."));
    }

    Ok(round2(filtered.iter().sum::<f64>() / filtered.len() as f64))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_filters_empty() {
        assert_eq!(required(Some("London")), Some("London"));
        assert_eq!(required(Some("")), None);
        assert_eq!(required(None), None);
    }

    #[test]
    fn test_parse_month_bounds() {
        assert_eq!(parse_month("1").unwrap(), 1);
        assert_eq!(parse_month("12").unwrap(), 12);
        assert_eq!(parse_month(" 7 ").unwrap(), 7);
        assert!(parse_month("0").is_err());
        assert!(parse_month("13").is_err());
        assert!(parse_month("july").is_err());
    }

    #[test]
    fn test_parse_temperature() {
        assert_eq!(parse_temperature("21.5").unwrap(), 21.5);
        assert_eq!(parse_temperature("-3").unwrap(), -3.0);
        assert!(parse_temperature("warm").is_err());
    }

    #[test]
    fn test_monthly_mean_filters_by_month() {
        let dates = vec![
            "2018-06-30".to_string(),
            "2018-07-01".to_string(),
            "2018-07-02".to_string(),
            "2018-08-01".to_string(),
        ];
        let temps = vec![50.0, 10.0, 10.3, 50.0];

        // (10.0 + 10.3) / 2 = 10.15
        assert_eq!(monthly_mean(&dates, &temps, 7).unwrap(), 10.15);
    }

    #[test]
    fn test_monthly_mean_rounds_to_two_decimals() {
        let dates = vec![
            "2018-07-01".to_string(),
            "2018-07-02".to_string(),
            "2018-07-03".to_string(),
        ];
        let temps = vec![10.0, 10.1, 10.3];

        // 30.4 / 3 = 10.1333... -> 10.13
        assert_eq!(monthly_mean(&dates, &temps, 7).unwrap(), 10.13);
    }

    #[test]
    fn test_monthly_mean_empty_month_is_not_found() {
        let dates = vec!["2018-07-01".to_string()];
        let temps = vec![10.0];

        let err = monthly_mean(&dates, &temps, 12).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_monthly_mean_skips_malformed_dates() {
        let dates = vec!["not-a-date".to_string(), "2018-07-01".to_string()];
        let temps = vec![99.0, 10.0];

        assert_eq!(monthly_mean(&dates, &temps, 7).unwrap(), 10.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.134), 10.13);
        assert_eq!(round2(10.136), 10.14);
        assert_eq!(round2(-3.007), -3.01);
    }
}
