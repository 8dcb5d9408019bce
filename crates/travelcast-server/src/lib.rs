//! REST surface for Travelcast.

pub mod routes;

pub use routes::{api, AppState};
