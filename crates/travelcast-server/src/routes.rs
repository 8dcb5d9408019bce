//! The four REST endpoints and their per-route metrics bookkeeping.
//!
//! Every weather route measures its elapsed time and records one metrics
//! sample after the reply is built, on success and failure paths alike.
//! Service failures map to status codes in exactly one place
//! (`error_reply`); a metrics-store hiccup is logged and swallowed so it
//! never fails the primary request.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use travelcast_core::ServiceError;
use travelcast_store::{metrics_report, MetricsStore};
use travelcast_weather::WeatherService;

pub const MONTHLY_PROFILE_ROUTE: &str = "/weather/monthly-profile";
pub const BEST_MONTH_ROUTE: &str = "/travel/best-month";
pub const COMPARE_CITIES_ROUTE: &str = "/travel/compare-cities";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
    pub metrics: Arc<dyn MetricsStore>,
}

/// Build the complete route tree.
pub fn api(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let monthly_profile = warp::path!("weather" / "monthly-profile")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(monthly_profile);

    let best_month = warp::path!("travel" / "best-month")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(best_travel_month);

    let compare_cities = warp::path!("travel" / "compare-cities")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(compare_cities);

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and(with_state(state))
        .and_then(metrics);

    monthly_profile
        .or(best_month)
        .or(compare_cities)
        .or(metrics)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn param<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(String::as_str)
}

type JsonReply = warp::reply::WithStatus<warp::reply::Json>;

fn ok_reply<T: serde::Serialize>(body: &T) -> JsonReply {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

fn error_reply(error: &ServiceError) -> JsonReply {
    warp::reply::with_status(
        warp::reply::json(&json!({ "error": error.to_string() })),
        StatusCode::BAD_REQUEST,
    )
}

/// Record one completed request against the route's aggregate.
async fn track(state: &AppState, route: &str, started: Instant, error_occurred: bool) {
    let elapsed = started.elapsed().as_secs_f64();
    match state.metrics.track(route, elapsed, error_occurred).await {
        Ok(()) => tracing::info!("Route {} processed in {:.2} seconds", route, elapsed),
        Err(e) => tracing::warn!("Failed to track metrics for route {}: {}", route, e),
    }
}

async fn monthly_profile(
    query: HashMap<String, String>,
    state: AppState,
) -> Result<JsonReply, Rejection> {
    let started = Instant::now();

    let result = state
        .weather
        .monthly_profile(param(&query, "city"), param(&query, "month"))
        .await;

    let error_occurred = result.is_err();
    let reply = match result {
        Ok(profile) => {
            tracing::info!(
                "Monthly profile for city: {}, month: {} computed successfully",
                profile.city,
                profile.month
            );
            ok_reply(&profile)
        }
        Err(e) => {
            tracing::error!("Error in monthly_profile: {}", e);
            error_reply(&e)
        }
    };

    track(&state, MONTHLY_PROFILE_ROUTE, started, error_occurred).await;
    Ok(reply)
}

async fn best_travel_month(
    query: HashMap<String, String>,
    state: AppState,
) -> Result<JsonReply, Rejection> {
    let started = Instant::now();

    let result = state
        .weather
        .best_travel_month(
            param(&query, "city"),
            param(&query, "min_temp"),
            param(&query, "max_temp"),
        )
        .await;

    let error_occurred = result.is_err();
    let reply = match result {
        Ok(best) => {
            tracing::info!(
                "Best travel month for city: {} is month: {}",
                best.city,
                best.best_month
            );
            ok_reply(&best)
        }
        Err(e) => {
            tracing::error!("Error in best_travel_month: {}", e);
            error_reply(&e)
        }
    };

    track(&state, BEST_MONTH_ROUTE, started, error_occurred).await;
    Ok(reply)
}

async fn compare_cities(
    query: HashMap<String, String>,
    state: AppState,
) -> Result<JsonReply, Rejection> {
    let started = Instant::now();

    let result = state
        .weather
        .compare_cities(param(&query, "cities"), param(&query, "month"))
        .await;

    let error_occurred = result.is_err();
    let reply = match result {
        Ok(comparison) => {
            tracing::info!(
                "City comparison for month: {} completed successfully",
                comparison.month
            );
            ok_reply(&comparison)
        }
        Err(e) => {
            tracing::error!("Error in compare_cities: {}", e);
            error_reply(&e)
        }
    };

    track(&state, COMPARE_CITIES_ROUTE, started, error_occurred).await;
    Ok(reply)
}

async fn metrics(state: AppState) -> Result<JsonReply, Rejection> {
    match state.metrics.snapshot().await {
        Ok(rows) => {
            tracing::info!("Metrics retrieved successfully");
            Ok(ok_reply(&metrics_report(rows)))
        }
        Err(e) => {
            tracing::error!("Error retrieving metrics: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "error": "Failed to retrieve metrics" })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
