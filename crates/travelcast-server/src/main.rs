use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use travelcast_core::Config;
use travelcast_server::{api, AppState};
use travelcast_store::SqliteStore;
use travelcast_weather::{OpenMeteoClient, WeatherService};

/// Travelcast REST API server
#[derive(Debug, Parser)]
#[command(name = "travelcast-server", version)]
struct Args {
    /// Path to the config file (defaults to the per-user config location)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    travelcast_core::init()?;

    let args = Args::parse();
    let config = Config::load_validated(args.config.as_deref())?;

    if let Some(parent) = config.store.path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create store directory")?;
    }
    let store = Arc::new(
        SqliteStore::open(&config.store.path).context("Failed to open the travelcast store")?,
    );

    let upstream = OpenMeteoClient::with_base_urls(
        &config.upstream.geocoding_url,
        &config.upstream.archive_url,
    )
    .context("Failed to build the upstream client")?;

    let state = AppState {
        weather: WeatherService::new(upstream, store.clone()),
        metrics: store,
    };

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .context("Invalid server.host address")?;
    let addr = SocketAddr::new(ip, config.server.port);

    tracing::info!("Travelcast API listening on http://{}", addr);
    warp::serve(api(state)).run(addr).await;

    Ok(())
}
