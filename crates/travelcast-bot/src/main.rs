//! Terminal dialog bot for the Travelcast REST API.

mod api;
mod dialog;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncBufReadExt;

use api::ApiClient;
use dialog::{ApiCall, Dialog, Step};
use travelcast_core::Config;

/// Travelcast conversational front-end
#[derive(Debug, Parser)]
#[command(name = "travelcast-bot", version)]
struct Args {
    /// Base URL of the Travelcast REST API (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Path to the config file (defaults to the per-user config location)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    travelcast_core::init()?;

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let base_url = args.api_url.unwrap_or(config.bot.api_url);

    let client = ApiClient::new(&base_url).context("Failed to build the API client")?;
    tracing::info!("Travelcast bot talking to {}", base_url);

    let mut dialog = Dialog::new();
    if let Step::Reply(text) = dialog.handle("/start") {
        println!("{}", text);
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match dialog.handle(&line) {
            Step::Reply(text) => println!("{}", text),
            Step::Call(call) => match run_call(&client, &call).await {
                Ok(text) => println!("{}", text),
                Err(e) => println!("An error occurred: {}", e),
            },
        }
        prompt()?;
    }

    Ok(())
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

async fn run_call(client: &ApiClient, call: &ApiCall) -> Result<String> {
    match call {
        ApiCall::MonthlyProfile { city, month } => {
            let data = client.monthly_profile(city, month).await?;
            Ok(format!(
                "Monthly Weather Profile for {} in month {}:\n{}",
                city,
                month,
                serde_json::to_string_pretty(&data)?
            ))
        }
        ApiCall::BestTravelMonth {
            city,
            min_temp,
            max_temp,
        } => {
            let data = client.best_travel_month(city, min_temp, max_temp).await?;
            Ok(format!(
                "Best travel month for {} between {}\u{b0}C and {}\u{b0}C:\n{}",
                city,
                min_temp,
                max_temp,
                serde_json::to_string_pretty(&data)?
            ))
        }
        ApiCall::CompareCities { cities, month } => {
            let data = client.compare_cities(cities, month).await?;
            Ok(format!(
                "Comparison of cities {} in month {}:\n{}",
                cities,
                month,
                serde_json::to_string_pretty(&data)?
            ))
        }
        ApiCall::Metrics => {
            let data = client.metrics().await?;
            Ok(format!("Metrics:\n{}", serde_json::to_string_pretty(&data)?))
        }
    }
}
