pub mod config;
pub mod error;

pub use config::{BotConfig, Config, ServerConfig, StoreConfig, UpstreamConfig};
pub use error::ServiceError;

use anyhow::Result;

/// Initialize logging for a Travelcast binary.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Travelcast core initialized");
    Ok(())
}
