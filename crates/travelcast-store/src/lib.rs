//! Persistent cache and metrics stores for Travelcast.
//!
//! Geocode lookups and derived monthly statistics are write-once records
//! with no expiry; metrics are one aggregate row per route, updated
//! atomically on every request. The store contracts are traits so the
//! weather service stays independent of the backend; the shipped backend
//! is SQLite.

pub mod cache;
pub mod metrics;
pub mod sqlite;

pub use cache::{CacheStore, GeocodeRecord, WeatherStatRecord};
pub use metrics::{metrics_report, MetricsReport, MetricsStore, RouteMetrics, RouteReport};
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Store-level failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
