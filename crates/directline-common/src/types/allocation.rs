//! Allocation results and per-tick reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OptimizerError;

/// Binary connect decisions and the energy they draw from the direct line
///
/// `allocated[i]` is either the full consumption of consumer `i` (when
/// `connect[i]` is set) or exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Connect decision per consumer
    pub connect: Vec<bool>,

    /// Energy drawn from the direct line per consumer
    pub allocated: Vec<f64>,
}

impl AllocationResult {
    /// Create a result from its vectors
    pub fn new(connect: Vec<bool>, allocated: Vec<f64>) -> Self {
        Self { connect, allocated }
    }

    /// Hold the given connect state without claiming any delivered energy
    pub fn unverified(connect: Vec<bool>) -> Self {
        let allocated = vec![0.0; connect.len()];
        Self { connect, allocated }
    }

    /// Total energy drawn from the direct line
    pub fn total_allocated(&self) -> f64 {
        self.allocated.iter().sum()
    }

    /// Number of connected consumers
    pub fn connected_count(&self) -> usize {
        self.connect.iter().filter(|&&c| c).count()
    }

    /// Indices of connected consumers
    pub fn connected_indices(&self) -> Vec<usize> {
        self.connect
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| c.then_some(i))
            .collect()
    }
}

/// Outcome of the optimizer stage of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickStatus {
    /// The solver produced a verified decision
    Optimized,

    /// The solver failed; the previous connect state was held
    Fallback { reason: OptimizerError },
}

impl TickStatus {
    /// Whether the tick fell back to the previous connect state
    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, TickStatus::Fallback { .. })
    }
}

/// Everything a tick decided, for the caller and for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick timestamp
    pub timestamp: DateTime<Utc>,

    /// Connect decisions and allocated energy
    pub result: AllocationResult,

    /// Reconnection eligibility computed before optimization
    pub eligible: Vec<bool>,

    /// Fairness bonus factors used in the objective
    pub bonus_factors: Vec<f64>,

    /// Optimizer outcome
    pub status: TickStatus,
}

impl TickReport {
    /// Connect decision per consumer
    #[inline]
    pub fn connect(&self) -> &[bool] {
        &self.result.connect
    }

    /// Allocated energy per consumer
    #[inline]
    pub fn allocated(&self) -> &[f64] {
        &self.result.allocated
    }
}
