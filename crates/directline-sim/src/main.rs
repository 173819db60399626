//! Direct-Line Simulation - replays measured PV surplus and consumption
//! through the allocator

mod config;
mod measurements;
mod simulation;

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::SimConfig;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Direct-Line Simulation v{}", directline_common::VERSION);

    let mut config = SimConfig::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.input = Some(path.into());
    }
    let input = config
        .input
        .clone()
        .context("no measurement file: pass a path or set DIRECTLINE_SIM_INPUT")?;

    let series = measurements::load(&input)?;
    tracing::info!(
        rows = series.len(),
        consumers = series.consumer_count(),
        "Loaded measurements from {}",
        input.display()
    );

    let reports = match &config.output {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let summary = simulation::run(&series, &config, reports)?;
    tracing::info!(
        ticks = summary.ticks,
        fallbacks = summary.fallback_ticks,
        allocated = summary.total_allocated,
        "Simulation finished"
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
