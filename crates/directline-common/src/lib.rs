//! # Direct-Line Common
//!
//! Shared types, errors, and constants for the direct-line allocator.
//!
//! ## Core Types
//!
//! - [`TickContext`]: one sampling interval of generation and per-consumer consumption
//! - [`AllocationResult`]: binary connect decisions and the energy they draw
//! - [`TickReport`]: allocation plus eligibility, bonus factors, and solver status
//!
//! ## Errors
//!
//! - [`ConfigError`]: rejected at construction
//! - [`InputError`]: rejected before a tick touches any state
//! - [`OptimizerError`]: recovered inside the tick by holding the previous state

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, DirectLineError, InputError, OptimizerError, Result};
pub use types::{
    allocation::{AllocationResult, TickReport, TickStatus},
    tick::TickContext,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bonus factor of the best-served consumer
pub const FAIRNESS_BASE_FACTOR: f64 = 0.7;

/// Bonus factor increment per rank towards the least-served consumer
pub const FAIRNESS_FACTOR_STEP: f64 = 0.1;

/// Objective multiplier of the fairness term
pub const DEFAULT_FAIRNESS_WEIGHT: f64 = 100.0;

/// Quota gained per tick (sized for 15 s ticks over a 15-year relay lifetime)
pub const DEFAULT_QUOTA_INCREMENT: f64 = 0.032;

/// Seconds after a disconnect before reconnection is always allowed
pub const DEFAULT_COOLDOWN_SHORT_SECS: i64 = 300;

/// Seconds after a disconnect before a positive quota allows reconnection
pub const DEFAULT_COOLDOWN_LONG_SECS: i64 = 60;

/// Quota needed for the quota-gated release
pub const QUOTA_RELEASE_THRESHOLD: f64 = 1.0;

/// Quota spent per connect or disconnect
pub const SWITCH_COST: f64 = 1.0;

/// Slack allowed on the capacity constraint
pub const CAPACITY_TOLERANCE: f64 = 1e-9;

/// Bonus factor assigned to the consumer at `rank` (0 = best served)
#[inline]
pub fn bonus_factor_for_rank(rank: usize) -> f64 {
    FAIRNESS_BASE_FACTOR + FAIRNESS_FACTOR_STEP * rank as f64
}
