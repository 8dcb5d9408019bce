//! Per-route usage metrics: the store contract and the derived report.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Raw aggregate for one route as persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMetrics {
    pub route: String,
    pub hits: u64,
    pub errors: u64,
    pub min_time: f64,
    pub max_time: f64,
    pub times: Vec<f64>,
}

/// Tracking/retrieval contract for the metrics aggregate.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Record one completed request: hits +1, errors +1 iff it failed,
    /// running min/max updated, the elapsed sample appended. Must be a
    /// single atomic update so concurrent requests never lose counts.
    async fn track(
        &self,
        route: &str,
        elapsed_secs: f64,
        error_occurred: bool,
    ) -> Result<(), StoreError>;

    /// All known route aggregates.
    async fn snapshot(&self) -> Result<Vec<RouteMetrics>, StoreError>;
}

/// Per-route entry of the metrics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    pub route_name: String,
    pub hits: u64,
    pub errors: u64,
    pub avg_time: f64,
    pub max_time: f64,
    pub min_time: f64,
}

/// The metrics report returned by the `/metrics` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub routes: BTreeMap<String, RouteReport>,
}

/// Derive the report from the raw aggregates.
///
/// avg/min/max are recomputed from the stored samples at read time (the
/// running min/max columns are kept as well but the samples are
/// authoritative here); every float is rounded to 4 decimals.
pub fn metrics_report(rows: Vec<RouteMetrics>) -> MetricsReport {
    let mut report = MetricsReport::default();

    for row in rows {
        let total_time: f64 = row.times.iter().sum();
        let min_time = row.times.iter().copied().fold(f64::INFINITY, f64::min);
        let max_time = row.times.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let avg_time = if row.hits > 0 {
            round4(total_time / row.hits as f64)
        } else {
            0.0
        };

        report.routes.insert(
            row.route.clone(),
            RouteReport {
                route_name: row.route,
                hits: row.hits,
                errors: row.errors,
                avg_time,
                max_time: if row.times.is_empty() {
                    0.0
                } else {
                    round4(max_time)
                },
                min_time: if row.times.is_empty() {
                    0.0
                } else {
                    round4(min_time)
                },
            },
        );
    }

    report
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
