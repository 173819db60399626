//! Branch and bound for the 0/1 knapsack
//!
//! Items are visited in descending value density. At every node the
//! fractional relaxation of the remaining items bounds what the subtree can
//! still add; subtrees that cannot beat the incumbent are pruned.

use directline_common::OptimizerError;
use ordered_float::OrderedFloat;
use tracing::debug;

use super::problem::{KnapsackItem, KnapsackProblem, KnapsackSolver, Selection};
use crate::config::DEFAULT_SOLVER_NODE_LIMIT;

/// Minimum objective gain that counts as an improvement
const OBJECTIVE_EPSILON: f64 = 1e-9;

/// Depth-first branch and bound with a node budget
#[derive(Debug, Clone)]
pub struct BranchAndBoundSolver {
    node_limit: u64,
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_NODE_LIMIT)
    }
}

impl BranchAndBoundSolver {
    pub fn new(node_limit: u64) -> Self {
        Self { node_limit }
    }

    pub fn node_limit(&self) -> u64 {
        self.node_limit
    }
}

impl KnapsackSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve(&self, problem: &KnapsackProblem) -> Result<Selection, OptimizerError> {
        problem.validate()?;

        let mut chosen = vec![false; problem.len()];
        let mut free_value = 0.0;
        let mut order = Vec::with_capacity(problem.len());

        for (i, item) in problem.items.iter().enumerate() {
            if item.value <= 0.0 {
                continue;
            }
            if item.weight == 0.0 {
                chosen[i] = true;
                free_value += item.value;
            } else {
                order.push(i);
            }
        }

        order.sort_by(|&a, &b| {
            let da = density(&problem.items[a]);
            let db = density(&problem.items[b]);
            OrderedFloat(db).cmp(&OrderedFloat(da)).then(a.cmp(&b))
        });

        let mut search = Search {
            items: &problem.items,
            order: &order,
            capacity: problem.effective_capacity(),
            node_limit: self.node_limit,
            nodes: 0,
            best_value: 0.0,
            best: Vec::new(),
            current: Vec::with_capacity(order.len()),
        };
        search.explore(0, 0.0, 0.0)?;

        for &i in &search.best {
            chosen[i] = true;
        }
        debug!(
            nodes = search.nodes,
            candidates = order.len(),
            objective = free_value + search.best_value,
            "Branch and bound finished"
        );

        Ok(Selection {
            chosen,
            objective: free_value + search.best_value,
        })
    }
}

#[inline]
fn density(item: &KnapsackItem) -> f64 {
    item.value / item.weight
}

struct Search<'a> {
    items: &'a [KnapsackItem],
    order: &'a [usize],
    capacity: f64,
    node_limit: u64,
    nodes: u64,
    best_value: f64,
    best: Vec<usize>,
    current: Vec<usize>,
}

impl Search<'_> {
    fn explore(&mut self, depth: usize, weight: f64, value: f64) -> Result<(), OptimizerError> {
        self.nodes += 1;
        if self.nodes > self.node_limit {
            return Err(OptimizerError::NodeLimitExceeded {
                limit: self.node_limit,
            });
        }

        if value > self.best_value + OBJECTIVE_EPSILON {
            self.best_value = value;
            self.best.clone_from(&self.current);
        }

        if depth == self.order.len() {
            return Ok(());
        }
        if self.upper_bound(depth, weight, value) <= self.best_value + OBJECTIVE_EPSILON {
            return Ok(());
        }

        let index = self.order[depth];
        let item = self.items[index];

        if weight + item.weight <= self.capacity {
            self.current.push(index);
            self.explore(depth + 1, weight + item.weight, value + item.value)?;
            self.current.pop();
        }
        self.explore(depth + 1, weight, value)
    }

    /// Value of the fractional relaxation over items from `depth` on
    fn upper_bound(&self, depth: usize, weight: f64, value: f64) -> f64 {
        let mut room = self.capacity - weight;
        let mut bound = value;
        for &index in &self.order[depth..] {
            let item = &self.items[index];
            if item.weight <= room {
                room -= item.weight;
                bound += item.value;
            } else {
                bound += item.value * room / item.weight;
                break;
            }
        }
        bound
    }
}
