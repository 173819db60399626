//! Allocation model: the tick as a 0/1 knapsack
//!
//! ```text
//! maximize   Σ a_i + w · Σ a_i · f_i
//! subject to a_i = x_i · c_i,  x_i ∈ {0, 1}
//!            Σ a_i ≤ G
//! ```
//!
//! Since `a_i` is fixed by `x_i`, consumer `i` becomes an item of weight
//! `c_i` and value `c_i · (1 + w · f_i)` in a knapsack of capacity `G`.

use directline_common::{AllocationResult, OptimizerError};

use super::problem::{KnapsackItem, KnapsackProblem, Selection};

/// Builds, checks, and decodes the per-tick knapsack
#[derive(Debug, Clone, Copy)]
pub struct AllocationModel {
    fairness_weight: f64,
}

impl AllocationModel {
    pub fn new(fairness_weight: f64) -> Self {
        Self { fairness_weight }
    }

    pub fn fairness_weight(&self) -> f64 {
        self.fairness_weight
    }

    /// Objective contribution of serving `consumption` with bonus `factor`
    #[inline]
    pub fn item_value(&self, consumption: f64, factor: f64) -> f64 {
        consumption + self.fairness_weight * consumption * factor
    }

    /// Formulate one tick
    pub fn build(&self, consumption: &[f64], factors: &[f64], generation: f64) -> KnapsackProblem {
        debug_assert_eq!(consumption.len(), factors.len());

        let items = consumption
            .iter()
            .zip(factors)
            .map(|(&c, &f)| KnapsackItem {
                weight: c,
                value: self.item_value(c, f),
            })
            .collect();
        KnapsackProblem::new(items, generation)
    }

    /// Refuse solver output that does not fit the problem
    pub fn verify(&self, problem: &KnapsackProblem, selection: &Selection) -> Result<(), OptimizerError> {
        if selection.chosen.len() != problem.len() {
            return Err(OptimizerError::InvalidSelection {
                expected: problem.len(),
                actual: selection.chosen.len(),
            });
        }
        let total = problem.total_weight(&selection.chosen);
        if total > problem.effective_capacity() {
            return Err(OptimizerError::CapacityExceeded {
                total,
                capacity: problem.capacity,
            });
        }
        Ok(())
    }

    /// Turn a selection into connect decisions and allocated energy
    ///
    /// A consumer drawing nothing this tick is reported disconnected even if
    /// the solver selected it.
    pub fn decode(&self, selection: &Selection, consumption: &[f64]) -> AllocationResult {
        let connect: Vec<bool> = selection
            .chosen
            .iter()
            .zip(consumption)
            .map(|(&chosen, &c)| chosen && c > 0.0)
            .collect();
        let allocated = connect
            .iter()
            .zip(consumption)
            .map(|(&on, &c)| if on { c } else { 0.0 })
            .collect();
        AllocationResult::new(connect, allocated)
    }
}
