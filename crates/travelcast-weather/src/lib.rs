//! Weather orchestration for Travelcast.
//!
//! Resolves cities to coordinates and derives monthly temperature
//! statistics from the Open-Meteo historical archive, with a persistent
//! cache in front of both lookups.

pub mod client;
pub mod service;
pub mod types;

pub use client::OpenMeteoClient;
pub use service::WeatherService;
pub use types::{BestTravelMonth, CityComparison, CityStats, MonthlyProfile};
