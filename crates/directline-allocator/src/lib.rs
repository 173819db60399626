//! # Direct-Line Allocator
//!
//! Decides, once per tick, which consumers draw from a shared direct supply
//! line fed by local surplus generation and which stay on the public grid.
//!
//! ## Objective
//!
//! ```text
//! maximize Σ a_i + 100 × Σ a_i × f_i      subject to Σ a_i ≤ G, a_i ∈ {0, c_i}
//! ```
//!
//! Where:
//! - a_i: energy allocated to consumer i
//! - c_i: consumption of consumer i
//! - f_i: fairness bonus factor (0.7 for the best served, +0.1 per rank)
//! - G: available generation
//!
//! ## Switching Policy
//!
//! Reconnecting after a disconnect waits `cooldown_short` seconds, or
//! `cooldown_long` seconds while the switching quota is at least 1. Each
//! switch costs one quota unit; every tick earns a small increment.

pub mod allocator;
pub mod config;
pub mod debounce;
pub mod fairness;
pub mod optimizer;

pub use allocator::DirectLineAllocator;
pub use config::{AllocatorConfig, FairnessFeed};
pub use debounce::{DebounceController, Eligibility, SwitchTransition, SwitchingState};
pub use fairness::{FairnessTracker, MeterReading, UndefinedRatioPlacement};
pub use optimizer::{
    AllocationModel, BranchAndBoundSolver, ExhaustiveSolver, KnapsackItem, KnapsackProblem,
    KnapsackSolver, Selection,
};
