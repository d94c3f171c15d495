// Hyperliquid perps CSV fetcher
//
// Downloads the DeFiLlama perps volume and open-interest CSV exports through
// a headless browser. Configured entirely through environment variables;
// exits non-zero if any target could not be fetched.

use anyhow::{Context, Result};
use hl_perps_csv_fetch::{FetchConfig, fetch_all};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("chromiumoxide::handler=off".parse()?)
        .add_directive("chromiumoxide::conn=off".parse()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

async fn run() -> Result<()> {
    let config = FetchConfig::from_env().context("Invalid configuration")?;
    info!(
        targets = config.targets().len(),
        max_attempts = config.max_attempts(),
        headless = config.headless(),
        "Writing exports to {}",
        config.output_dir().display()
    );

    let saved = fetch_all(&config).await?;
    info!("Saved {} file(s)", saved.len());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
