//! Knapsack problem types and the solver trait

use directline_common::{OptimizerError, CAPACITY_TOLERANCE};
use serde::{Deserialize, Serialize};

/// One selectable item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnapsackItem {
    /// Capacity drawn when selected
    pub weight: f64,
    /// Objective contribution when selected
    pub value: f64,
}

/// A 0/1 knapsack: pick items maximizing total value within capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnapsackProblem {
    pub items: Vec<KnapsackItem>,
    pub capacity: f64,
}

impl KnapsackProblem {
    pub fn new(items: Vec<KnapsackItem>, capacity: f64) -> Self {
        Self { items, capacity }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reject problems no solver can reason about
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(OptimizerError::InvalidProblem {
                reason: format!("capacity {} is not a finite non-negative number", self.capacity),
            });
        }
        for (i, item) in self.items.iter().enumerate() {
            if !item.weight.is_finite() || item.weight < 0.0 {
                return Err(OptimizerError::InvalidProblem {
                    reason: format!("item {} has weight {}", i, item.weight),
                });
            }
            if !item.value.is_finite() {
                return Err(OptimizerError::InvalidProblem {
                    reason: format!("item {} has value {}", i, item.value),
                });
            }
        }
        Ok(())
    }

    /// Capacity a solver may fill, including floating-point slack
    #[inline]
    pub fn effective_capacity(&self) -> f64 {
        self.capacity + CAPACITY_TOLERANCE
    }

    /// Total weight of a selection
    pub fn total_weight(&self, chosen: &[bool]) -> f64 {
        self.items
            .iter()
            .zip(chosen)
            .filter(|&(_, &c)| c)
            .map(|(item, _)| item.weight)
            .sum()
    }

    /// Total value of a selection
    pub fn objective(&self, chosen: &[bool]) -> f64 {
        self.items
            .iter()
            .zip(chosen)
            .filter(|&(_, &c)| c)
            .map(|(item, _)| item.value)
            .sum()
    }
}

/// Solver output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected flag per item
    pub chosen: Vec<bool>,
    /// Total value of the selected items
    pub objective: f64,
}

impl Selection {
    /// Select nothing
    pub fn empty(len: usize) -> Self {
        Self {
            chosen: vec![false; len],
            objective: 0.0,
        }
    }
}

/// Solver boundary of the allocator
///
/// Any strategy that returns an optimal feasible selection can be plugged in.
#[cfg_attr(test, mockall::automock)]
pub trait KnapsackSolver: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Solve the problem or report why no decision could be made
    fn solve(&self, problem: &KnapsackProblem) -> Result<Selection, OptimizerError>;
}
