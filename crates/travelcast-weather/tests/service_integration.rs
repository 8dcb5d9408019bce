//! Integration tests for WeatherService against a stubbed upstream.

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use travelcast_core::ServiceError;
use travelcast_store::SqliteStore;
use travelcast_weather::{OpenMeteoClient, WeatherService};

fn service_against(mock: &MockServer) -> WeatherService {
    let client = OpenMeteoClient::with_base_urls(&mock.uri(), &mock.uri()).unwrap();
    let store = SqliteStore::in_memory().unwrap();
    WeatherService::new(client, Arc::new(store))
}

fn geocode_body(latitude: f64, longitude: f64) -> serde_json::Value {
    serde_json::json!({
        "results": [
            {"name": "Somewhere", "latitude": latitude, "longitude": longitude}
        ]
    })
}

/// Archive payload with the given (date, min, max) rows.
fn archive_body(days: &[(String, f64, f64)]) -> serde_json::Value {
    serde_json::json!({
        "daily": {
            "time": days.iter().map(|d| d.0.clone()).collect::<Vec<_>>(),
            "temperature_2m_min": days.iter().map(|d| d.1).collect::<Vec<_>>(),
            "temperature_2m_max": days.iter().map(|d| d.2).collect::<Vec<_>>(),
        }
    })
}

/// 31 days of July 2018 with arithmetic-progression temperatures
/// (min mean 13.5, max mean 23.5), padded with June noise that must be
/// filtered out.
fn july_fixture() -> Vec<(String, f64, f64)> {
    let mut days = vec![
        ("2018-06-29".to_string(), 99.0, 99.0),
        ("2018-06-30".to_string(), 99.0, 99.0),
    ];
    for day in 1..=31u32 {
        days.push((
            format!("2018-07-{:02}", day),
            12.0 + 0.1 * (day - 1) as f64,
            22.0 + 0.1 * (day - 1) as f64,
        ));
    }
    days
}

#[tokio::test]
async fn test_monthly_profile_computes_rounded_mean() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(51.5, -0.12)))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("start_date", "2018-01-01"))
        .and(query_param("end_date", "2023-12-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&july_fixture())))
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let profile = service
        .monthly_profile(Some("London"), Some("7"))
        .await
        .unwrap();

    assert_eq!(profile.city, "London");
    assert_eq!(profile.month, 7);
    assert_eq!(profile.min_temp_avg, 13.5);
    assert_eq!(profile.max_temp_avg, 23.5);
}

#[tokio::test]
async fn test_warm_cache_skips_upstream() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(51.5, -0.12)))
        .expect(1)
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&july_fixture())))
        .expect(1)
        .mount(&mock)
        .await;

    let service = service_against(&mock);

    let first = service
        .monthly_profile(Some("London"), Some("7"))
        .await
        .unwrap();
    let second = service
        .monthly_profile(Some("London"), Some("7"))
        .await
        .unwrap();

    assert_eq!(first, second);
    // expect(1) on both mocks verifies no second upstream call on drop
}

#[tokio::test]
async fn test_unknown_city_is_not_found() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let err = service
        .monthly_profile(Some("Atlantis"), Some("7"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.to_string(), "City 'Atlantis' not found.");
}

#[tokio::test]
async fn test_geocoding_failure_is_upstream_error() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let err = service
        .monthly_profile(Some("London"), Some("7"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Upstream(_)));
    assert_eq!(err.to_string(), "Geocoding API request failed.");
}

#[tokio::test]
async fn test_archive_missing_daily_section() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(51.5, -0.12)))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"latitude": 51.5})),
        )
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let err = service
        .monthly_profile(Some("London"), Some("7"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Weather data not available.");
}

#[tokio::test]
async fn test_archive_failure_is_upstream_error() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(51.5, -0.12)))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let err = service
        .monthly_profile(Some("London"), Some("7"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Weather API request failed.");
}

#[tokio::test]
async fn test_monthly_profile_validation() {
    let mock = MockServer::start().await;
    let service = service_against(&mock);

    for (city, month) in [
        (None, Some("7")),
        (Some("London"), None),
        (Some(""), Some("7")),
    ] {
        let err = service.monthly_profile(city, month).await.unwrap_err();
        assert_eq!(err.to_string(), "City and month parameters are required.");
    }

    for month in ["0", "13", "nope"] {
        let err = service
            .monthly_profile(Some("London"), Some(month))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid month. Month must be between 1 and 12."
        );
    }
}

/// One day per month of 2018; month m gets min = m, max = m + 10.
fn year_fixture() -> Vec<(String, f64, f64)> {
    (1..=12u32)
        .map(|m| (format!("2018-{:02}-15", m), m as f64, m as f64 + 10.0))
        .collect()
}

#[tokio::test]
async fn test_best_travel_month_ties_break_to_earliest() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(48.85, 2.35)))
        .expect(1)
        .mount(&mock)
        .await;

    // One archive fetch per cold (city, month) pair
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&year_fixture())))
        .expect(12)
        .mount(&mock)
        .await;

    let service = service_against(&mock);

    // Months 2 and 3 both score |2.5-m| + |12.5-(m+10)| = 1.0; the
    // earlier month must win.
    let best = service
        .best_travel_month(Some("Paris"), Some("2.5"), Some("12.5"))
        .await
        .unwrap();

    assert_eq!(best.best_month, 2);
    assert_eq!(best.min_temp_diff, 0.5);
    assert_eq!(best.max_temp_diff, 0.5);
    assert_eq!(best.overall_diff, 1.0);
}

#[tokio::test]
async fn test_best_travel_month_validation() {
    let mock = MockServer::start().await;
    let service = service_against(&mock);

    let err = service
        .best_travel_month(Some("Paris"), None, Some("25"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "City, min_temp, and max_temp parameters are required."
    );

    let err = service
        .best_travel_month(Some("Paris"), Some("warm"), Some("25"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "min_temp and max_temp must be numbers.");
}

#[tokio::test]
async fn test_compare_cities_preserves_entries() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(51.5, -0.12)))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(48.85, 2.35)))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&july_fixture())))
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let comparison = service
        .compare_cities(Some("London, Paris"), Some("7"))
        .await
        .unwrap();

    assert_eq!(comparison.month, 7);
    assert_eq!(comparison.cities.len(), 2);
    assert_eq!(comparison.cities["London"].min_temp_avg, 13.5);
    assert_eq!(comparison.cities["Paris"].max_temp_avg, 23.5);
}

#[tokio::test]
async fn test_compare_cities_duplicate_overwrites_its_own_key() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body(51.5, -0.12)))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&july_fixture())))
        .mount(&mock)
        .await;

    let service = service_against(&mock);
    let comparison = service
        .compare_cities(Some("London,London"), Some("7"))
        .await
        .unwrap();

    // Two positions pass validation; the repeated name collapses to one key
    assert_eq!(comparison.cities.len(), 1);
}

#[tokio::test]
async fn test_compare_cities_count_validation() {
    let mock = MockServer::start().await;
    let service = service_against(&mock);

    for cities in ["London", "a,b,c,d,e,f"] {
        let err = service
            .compare_cities(Some(cities), Some("7"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Number of cities must be between 2 and 5.");
    }

    let err = service.compare_cities(None, Some("7")).await.unwrap_err();
    assert_eq!(err.to_string(), "Cities and month parameters are required.");

    let err = service
        .compare_cities(Some("London,Paris"), Some("13"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid month. Month must be between 1 and 12."
    );
}
