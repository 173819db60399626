//! Switching debounce module
//!
//! Protects the changeover relays from excessive actuation:
//! - SwitchingState: per-consumer quota, last disconnect, connect state
//! - DebounceController: eligibility filter and quota accounting

pub mod switching;

pub use switching::{DebounceController, Eligibility, SwitchTransition, SwitchingState};
