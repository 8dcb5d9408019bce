//! Centralized error types for the Travelcast service.
//!
//! The service distinguishes four failure kinds, each carrying the message
//! shown to the caller. The API boundary maps kinds to transport status
//! codes exactly once; nothing below the boundary knows about HTTP codes.

use thiserror::Error;

/// Failure of a weather-service operation or its stores.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or out-of-range request input (city, month, temperature,
    /// city count).
    #[error("{0}")]
    Validation(String),

    /// The city could not be resolved, or there is no data for the
    /// requested month.
    #[error("{0}")]
    NotFound(String),

    /// Non-success status or malformed payload from the geocoding or
    /// weather endpoints.
    #[error("{0}")]
    Upstream(String),

    /// The persistent store failed on a path where the failure cannot be
    /// swallowed (metrics retrieval).
    #[error("{0}")]
    Store(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ServiceError::Upstream(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        ServiceError::Store(message.into())
    }

    /// True for failures caused by the request itself rather than by a
    /// collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::NotFound(_)
        )
    }
}
