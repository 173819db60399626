//! Simulation configuration

use std::path::PathBuf;

use anyhow::{ensure, Result};
use chrono::{DateTime, TimeZone, Utc};
use directline_allocator::config::parse_var;
use directline_allocator::AllocatorConfig;
use serde::{Deserialize, Serialize};

/// Simulation harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Measurement file (`;`-separated, columns PV and V1..Vn)
    pub input: Option<PathBuf>,
    /// JSON lines file receiving one report per tick
    pub output: Option<PathBuf>,
    /// Seconds between measurement rows
    pub tick_secs: i64,
    /// Timestamp preceding the first row
    pub start: DateTime<Utc>,
    /// Ticks between meter readings fed to the fairness tracker
    pub fairness_interval: u64,
    /// Allocator settings, consumer count is taken from the input file
    pub allocator: AllocatorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            tick_secs: 15,
            start: Utc
                .with_ymd_and_hms(2021, 8, 31, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            fairness_interval: 1,
            allocator: AllocatorConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from environment and `.env`
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Overlay values from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.allocator.apply_env(&lookup)?;

        if let Some(v) = parse_var(&lookup, "DIRECTLINE_SIM_INPUT")? {
            self.input = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_SIM_OUTPUT")? {
            self.output = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_SIM_TICK_SECS")? {
            self.tick_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_SIM_START")? {
            self.start = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_SIM_FAIRNESS_INTERVAL")? {
            self.fairness_interval = v;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_secs > 0, "tick_secs must be positive, got {}", self.tick_secs);
        ensure!(self.fairness_interval > 0, "fairness_interval must be positive");
        Ok(())
    }

    /// Ticks in one simulated day
    pub fn ticks_per_day(&self) -> u64 {
        (86_400 / self.tick_secs).max(1) as u64
    }
}
