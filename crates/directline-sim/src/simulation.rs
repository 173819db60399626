//! Simulation driver loop

use std::io::Write;

use anyhow::{ensure, Result};
use chrono::Duration;
use directline_allocator::{AllocatorConfig, DirectLineAllocator, FairnessFeed};
use directline_common::TickContext;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::measurements::MeasurementSeries;

/// Per-consumer totals over a simulation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerSummary {
    pub label: String,
    pub consumed: f64,
    pub allocated: f64,
    /// allocated / consumed, absent for a consumer that never consumed
    pub share: Option<f64>,
    pub switches: u64,
}

/// Totals over a simulation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub fallback_ticks: u64,
    pub total_generation: f64,
    pub total_allocated: f64,
    pub consumers: Vec<ConsumerSummary>,
}

/// Run the allocator over a measurement series
///
/// When `reports` is given, every tick report is written to it as one JSON line.
pub fn run<W: Write>(
    series: &MeasurementSeries,
    config: &SimConfig,
    mut reports: Option<W>,
) -> Result<SimulationSummary> {
    let n = series.consumer_count();
    ensure!(n > 0, "measurement series has no consumers");

    let allocator_config = AllocatorConfig {
        consumer_count: n,
        ..config.allocator.clone()
    };
    let feed_meters = allocator_config.fairness_feed == FairnessFeed::External;
    let mut allocator = DirectLineAllocator::new(allocator_config)?;

    let mut allocated_totals = vec![0.0; n];
    let mut consumption_totals = vec![0.0; n];
    let mut switches = vec![0u64; n];
    let mut previous = vec![false; n];
    let mut fallback_ticks = 0u64;
    let mut total_generation = 0.0;

    if feed_meters {
        allocator.update_fairness_from_meters(&allocated_totals, &consumption_totals)?;
    }

    let ticks_per_day = config.ticks_per_day();
    let mut timestamp = config.start;
    for (row, (generation, consumption)) in series
        .generation
        .iter()
        .zip(series.consumption.iter())
        .enumerate()
    {
        let tick_number = row as u64 + 1;
        timestamp += Duration::seconds(config.tick_secs);

        let tick = TickContext::new(timestamp, *generation, consumption.clone());
        let report = allocator.run_tick(&tick)?;

        if report.status.is_fallback() {
            fallback_ticks += 1;
        }
        total_generation += generation;
        for i in 0..n {
            allocated_totals[i] += report.allocated()[i];
            consumption_totals[i] += consumption[i];
            if report.connect()[i] != previous[i] {
                switches[i] += 1;
            }
        }
        previous.copy_from_slice(report.connect());

        if feed_meters && tick_number % config.fairness_interval == 0 {
            allocator.update_fairness_from_meters(&allocated_totals, &consumption_totals)?;
        }

        if let Some(sink) = reports.as_mut() {
            serde_json::to_writer(&mut *sink, &report)?;
            writeln!(sink)?;
        }

        if tick_number % ticks_per_day == 0 {
            info!(day = tick_number / ticks_per_day, %timestamp, "Simulated day complete");
        } else {
            debug!(tick = tick_number, connected = report.result.connected_count(), "Tick done");
        }
    }

    if let Some(sink) = reports.as_mut() {
        sink.flush()?;
    }

    let consumers = series
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| ConsumerSummary {
            label: label.clone(),
            consumed: consumption_totals[i],
            allocated: allocated_totals[i],
            share: (consumption_totals[i] > 0.0)
                .then(|| allocated_totals[i] / consumption_totals[i]),
            switches: switches[i],
        })
        .collect();

    Ok(SimulationSummary {
        ticks: series.len() as u64,
        fallback_ticks,
        total_generation,
        total_allocated: allocated_totals.iter().sum(),
        consumers,
    })
}
