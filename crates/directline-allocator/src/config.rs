//! Allocator configuration

use std::str::FromStr;

use directline_common::{
    ConfigError, DEFAULT_COOLDOWN_LONG_SECS, DEFAULT_COOLDOWN_SHORT_SECS, DEFAULT_FAIRNESS_WEIGHT,
    DEFAULT_QUOTA_INCREMENT,
};
use serde::{Deserialize, Serialize};

use crate::fairness::UndefinedRatioPlacement;

/// Default number of consumers on one direct line
pub const DEFAULT_CONSUMER_COUNT: usize = 7;

/// Default node budget of the branch-and-bound solver
pub const DEFAULT_SOLVER_NODE_LIMIT: u64 = 1_000_000;

/// Who feeds energy counters into the fairness tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessFeed {
    /// The caller supplies meter readings or deltas
    #[default]
    External,
    /// The allocator feeds each tick's allocation and raw consumption itself
    FromAllocation,
}

impl FromStr for FairnessFeed {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "external" => Ok(Self::External),
            "allocation" | "from_allocation" => Ok(Self::FromAllocation),
            _ => Err(()),
        }
    }
}

/// Direct-line allocator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Number of consumers, fixed for the lifetime of the allocator
    pub consumer_count: usize,
    /// Seconds after a disconnect before reconnection is always allowed
    pub cooldown_short_secs: i64,
    /// Seconds after a disconnect before a quota of at least 1 allows reconnection
    pub cooldown_long_secs: i64,
    /// Quota gained by every consumer each tick
    pub quota_increment: f64,
    /// Objective multiplier of the fairness term
    pub fairness_weight: f64,
    /// Ranking of consumers without consumption history
    pub undefined_ratio_placement: UndefinedRatioPlacement,
    /// Source of fairness counter updates
    pub fairness_feed: FairnessFeed,
    /// Nodes the branch-and-bound solver may explore per tick
    pub solver_node_limit: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            consumer_count: DEFAULT_CONSUMER_COUNT,
            cooldown_short_secs: DEFAULT_COOLDOWN_SHORT_SECS,
            cooldown_long_secs: DEFAULT_COOLDOWN_LONG_SECS,
            quota_increment: DEFAULT_QUOTA_INCREMENT,
            fairness_weight: DEFAULT_FAIRNESS_WEIGHT,
            undefined_ratio_placement: UndefinedRatioPlacement::default(),
            fairness_feed: FairnessFeed::default(),
            solver_node_limit: DEFAULT_SOLVER_NODE_LIMIT,
        }
    }
}

impl AllocatorConfig {
    /// Default configuration for `consumer_count` consumers
    pub fn with_consumers(consumer_count: usize) -> Self {
        Self {
            consumer_count,
            ..Self::default()
        }
    }

    /// Reject configurations the allocator cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consumer_count == 0 {
            return Err(ConfigError::NoConsumers);
        }
        if self.cooldown_short_secs < 0 {
            return Err(ConfigError::NegativeCooldown {
                name: "cooldown_short",
                value: self.cooldown_short_secs,
            });
        }
        if self.cooldown_long_secs < 0 {
            return Err(ConfigError::NegativeCooldown {
                name: "cooldown_long",
                value: self.cooldown_long_secs,
            });
        }
        if !self.quota_increment.is_finite() || self.quota_increment < 0.0 {
            return Err(ConfigError::InvalidQuotaIncrement(self.quota_increment));
        }
        if !self.fairness_weight.is_finite() || self.fairness_weight < 0.0 {
            return Err(ConfigError::InvalidFairnessWeight(self.fairness_weight));
        }
        if self.solver_node_limit == 0 {
            return Err(ConfigError::InvalidNodeLimit);
        }
        Ok(())
    }

    /// Load configuration from defaults overlaid with `DIRECTLINE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay values from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_CONSUMERS")? {
            self.consumer_count = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_COOLDOWN_SHORT_SECS")? {
            self.cooldown_short_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_COOLDOWN_LONG_SECS")? {
            self.cooldown_long_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_QUOTA_INCREMENT")? {
            self.quota_increment = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_FAIRNESS_WEIGHT")? {
            self.fairness_weight = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_UNDEFINED_RATIO")? {
            self.undefined_ratio_placement = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_FAIRNESS_FEED")? {
            self.fairness_feed = v;
        }
        if let Some(v) = parse_var(&lookup, "DIRECTLINE_SOLVER_NODE_LIMIT")? {
            self.solver_node_limit = v;
        }
        Ok(())
    }
}

/// Parse an optional variable, turning unparseable values into a config error
pub fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: raw,
            }),
    }
}
