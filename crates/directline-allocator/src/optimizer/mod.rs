//! Exclusive allocation optimizer
//!
//! Provides the per-tick integer program and its solvers:
//! - AllocationModel: formulates the tick as a 0/1 knapsack and decodes the answer
//! - KnapsackSolver: the solver boundary
//! - BranchAndBoundSolver: default solver, LP-relaxation bounded depth-first search
//! - ExhaustiveSolver: subset enumeration for small consumer counts

pub mod branch_bound;
pub mod exhaustive;
pub mod model;
pub mod problem;

pub use branch_bound::BranchAndBoundSolver;
pub use exhaustive::{ExhaustiveSolver, EXHAUSTIVE_MAX_ITEMS};
pub use model::AllocationModel;
pub use problem::{KnapsackItem, KnapsackProblem, KnapsackSolver, Selection};
