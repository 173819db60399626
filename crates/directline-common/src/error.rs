//! Error types for the direct-line allocator
//!
//! Provides a unified error type and domain-specific error variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using DirectLineError
pub type Result<T> = std::result::Result<T, DirectLineError>;

/// Unified error type for allocator operations
#[derive(Debug, Error)]
pub enum DirectLineError {
    // Construction-time errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Per-call input errors
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    // Solver errors
    #[error("Optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),
}

/// Allocator configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Consumer count must be at least 1")]
    NoConsumers,

    #[error("Cooldown {name} must not be negative, got {value}s")]
    NegativeCooldown { name: &'static str, value: i64 },

    #[error("Quota increment must be finite and non-negative, got {0}")]
    InvalidQuotaIncrement(f64),

    #[error("Fairness weight must be finite and non-negative, got {0}")]
    InvalidFairnessWeight(f64),

    #[error("Solver node limit must be positive")]
    InvalidNodeLimit,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Malformed tick or fairness-update input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("Expected {expected} consumer values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Consumption of consumer {index} is negative: {value}")]
    NegativeConsumption { index: usize, value: f64 },

    #[error("Consumption of consumer {index} is not a finite number")]
    NonFiniteConsumption { index: usize },

    #[error("Generation must not be negative: {0}")]
    NegativeGeneration(f64),

    #[error("Generation is not a finite number")]
    NonFiniteGeneration,

    #[error("Tick timestamp {current} is earlier than previous tick {previous}")]
    TimestampRegression {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Energy delta of consumer {index} is negative: {value}")]
    NegativeDelta { index: usize, value: f64 },

    #[error("Energy counter of consumer {index} is not a finite number")]
    NonFiniteCounter { index: usize },
}

/// Optimizer failures
///
/// These never abort a tick; the allocator falls back to the previous
/// connect state and reports the error in the tick status.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerError {
    #[error("Invalid problem: {reason}")]
    InvalidProblem { reason: String },

    #[error("Search aborted after exploring {limit} nodes")]
    NodeLimitExceeded { limit: u64 },

    #[error("Problem has {items} items, solver supports at most {max}")]
    TooManyItems { items: usize, max: usize },

    #[error("Selection covers {actual} items, problem has {expected}")]
    InvalidSelection { expected: usize, actual: usize },

    #[error("Selection draws {total} but only {capacity} is available")]
    CapacityExceeded { total: f64, capacity: f64 },
}
