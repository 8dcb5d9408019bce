//! SQLite backend for the cache and metrics stores.
//!
//! A single connection is shared behind a mutex and every call runs on the
//! blocking pool, so async request handlers never block the runtime on
//! database IO.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::cache::{CacheStore, GeocodeRecord, WeatherStatRecord};
use crate::metrics::{MetricsStore, RouteMetrics};
use crate::StoreError;

/// SQLite-backed cache + metrics store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for tests).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initialize the database schema.
    ///
    /// The cache tables deliberately carry no uniqueness constraint:
    /// concurrent writers racing on the same key may both insert, and
    /// lookups take the first row (see `CacheStore`).
    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS geocode_cache (
                city TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS weather_cache (
                city TEXT NOT NULL,
                month INTEGER NOT NULL,
                min_temp_avg REAL NOT NULL,
                max_temp_avg REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS route_metrics (
                route TEXT PRIMARY KEY,
                hits INTEGER NOT NULL DEFAULT 0,
                errors INTEGER NOT NULL DEFAULT 0,
                min_time REAL NOT NULL,
                max_time REAL NOT NULL,
                times TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_geocode_city ON geocode_cache(city);
            CREATE INDEX IF NOT EXISTS idx_weather_city_month ON weather_cache(city, month);
            "#,
        )?;
        Ok(())
    }

    async fn on_blocking_pool<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || op(&conn.lock())).await?
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn geocode(&self, city: &str) -> Result<Option<GeocodeRecord>, StoreError> {
        let city = city.to_string();
        self.on_blocking_pool(move |conn| {
            let record = conn
                .query_row(
                    "SELECT city, latitude, longitude FROM geocode_cache WHERE city = ?1 LIMIT 1",
                    params![city],
                    |row| {
                        Ok(GeocodeRecord {
                            city: row.get(0)?,
                            latitude: row.get(1)?,
                            longitude: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn insert_geocode(&self, record: &GeocodeRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.on_blocking_pool(move |conn| {
            conn.execute(
                "INSERT INTO geocode_cache (city, latitude, longitude) VALUES (?1, ?2, ?3)",
                params![record.city, record.latitude, record.longitude],
            )?;
            Ok(())
        })
        .await
    }

    async fn weather_stat(
        &self,
        city: &str,
        month: u32,
    ) -> Result<Option<WeatherStatRecord>, StoreError> {
        let city = city.to_string();
        self.on_blocking_pool(move |conn| {
            let record = conn
                .query_row(
                    "SELECT city, month, min_temp_avg, max_temp_avg FROM weather_cache
                     WHERE city = ?1 AND month = ?2 LIMIT 1",
                    params![city, month],
                    |row| {
                        Ok(WeatherStatRecord {
                            city: row.get(0)?,
                            month: row.get(1)?,
                            min_temp_avg: row.get(2)?,
                            max_temp_avg: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn insert_weather_stat(&self, record: &WeatherStatRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.on_blocking_pool(move |conn| {
            conn.execute(
                "INSERT INTO weather_cache (city, month, min_temp_avg, max_temp_avg)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.city,
                    record.month,
                    record.min_temp_avg,
                    record.max_temp_avg
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    async fn track(
        &self,
        route: &str,
        elapsed_secs: f64,
        error_occurred: bool,
    ) -> Result<(), StoreError> {
        let route = route.to_string();
        self.on_blocking_pool(move |conn| {
            // One statement keeps the whole aggregate update atomic, the
            // SQL analogue of a combined $inc/$min/$max/$push update.
            conn.execute(
                "INSERT INTO route_metrics (route, hits, errors, min_time, max_time, times)
                 VALUES (?1, 1, ?2, ?3, ?3, json_array(?3))
                 ON CONFLICT(route) DO UPDATE SET
                     hits = hits + 1,
                     errors = errors + ?2,
                     min_time = MIN(min_time, ?3),
                     max_time = MAX(max_time, ?3),
                     times = json_insert(times, '$[#]', ?3)",
                params![route, error_occurred as i64, elapsed_secs],
            )?;
            Ok(())
        })
        .await
    }

    async fn snapshot(&self) -> Result<Vec<RouteMetrics>, StoreError> {
        self.on_blocking_pool(|conn| {
            let mut stmt = conn.prepare(
                "SELECT route, hits, errors, min_time, max_time, times
                 FROM route_metrics ORDER BY route",
            )?;

            let mut rows = stmt.query([])?;
            let mut metrics = Vec::new();
            while let Some(row) = rows.next()? {
                let times_json: String = row.get(5)?;
                let times: Vec<f64> = serde_json::from_str(&times_json)
                    .map_err(|e| StoreError::Corrupt(format!("times for route: {}", e)))?;
                metrics.push(RouteMetrics {
                    route: row.get(0)?,
                    hits: row.get(1)?,
                    errors: row.get(2)?,
                    min_time: row.get(3)?,
                    max_time: row.get(4)?,
                    times,
                });
            }
            Ok(metrics)
        })
        .await
    }
}
