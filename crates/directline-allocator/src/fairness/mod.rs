//! Fairness priority module
//!
//! Turns cumulative per-consumer service history into per-tick bonus factors:
//! - FairnessTracker: accumulates allocated and consumed energy
//! - UndefinedRatioPlacement: ranking of consumers without consumption history

pub mod tracker;

pub use tracker::{FairnessTracker, MeterReading, UndefinedRatioPlacement};
