//! Subset enumeration for small knapsacks

use directline_common::OptimizerError;

use super::problem::{KnapsackProblem, KnapsackSolver, Selection};

/// Largest item count the exhaustive solver accepts
pub const EXHAUSTIVE_MAX_ITEMS: usize = 20;

/// Tries every subset; ties keep the lowest subset mask
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveSolver;

impl KnapsackSolver for ExhaustiveSolver {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn solve(&self, problem: &KnapsackProblem) -> Result<Selection, OptimizerError> {
        problem.validate()?;

        let n = problem.len();
        if n > EXHAUSTIVE_MAX_ITEMS {
            return Err(OptimizerError::TooManyItems {
                items: n,
                max: EXHAUSTIVE_MAX_ITEMS,
            });
        }

        let capacity = problem.effective_capacity();
        let mut best_mask = 0u32;
        let mut best_value = 0.0;

        for mask in 1..(1u32 << n) {
            let mut weight = 0.0;
            let mut value = 0.0;
            for (i, item) in problem.items.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    weight += item.weight;
                    value += item.value;
                }
            }
            if weight <= capacity && value > best_value + 1e-9 {
                best_mask = mask;
                best_value = value;
            }
        }

        let chosen: Vec<bool> = (0..n).map(|i| best_mask & (1 << i) != 0).collect();
        Ok(Selection {
            chosen,
            objective: best_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::problem::KnapsackItem;

    #[test]
    fn test_finds_optimum() {
        let items = [(6.0, 7.0), (5.0, 5.0), (5.0, 5.0)]
            .iter()
            .map(|&(weight, value)| KnapsackItem { weight, value })
            .collect();
        let sel = ExhaustiveSolver.solve(&KnapsackProblem::new(items, 10.0)).unwrap();
        assert_eq!(sel.chosen, vec![false, true, true]);
    }

    #[test]
    fn test_empty_problem() {
        let sel = ExhaustiveSolver.solve(&KnapsackProblem::new(Vec::new(), 3.0)).unwrap();
        assert!(sel.chosen.is_empty());
        assert_eq!(sel.objective, 0.0);
    }

    #[test]
    fn test_too_many_items() {
        let items = vec![KnapsackItem { weight: 1.0, value: 1.0 }; EXHAUSTIVE_MAX_ITEMS + 1];
        assert_eq!(
            ExhaustiveSolver.solve(&KnapsackProblem::new(items, 5.0)),
            Err(OptimizerError::TooManyItems {
                items: EXHAUSTIVE_MAX_ITEMS + 1,
                max: EXHAUSTIVE_MAX_ITEMS
            })
        );
    }
}
