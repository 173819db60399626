//! TickContext - one sampling interval of measurements
//!
//! A tick carries everything the allocator needs to decide the connect state
//! of every consumer for one interval:
//! - the tick timestamp (second resolution, must not go backwards)
//! - the surplus generation available to the whole group
//! - the consumption of each consumer, in consumer index order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Input for a single allocation tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickContext {
    /// Tick timestamp
    pub timestamp: DateTime<Utc>,

    /// Surplus generation available to the direct line
    pub generation: f64,

    /// Consumption per consumer, indexed by consumer
    pub consumption: Vec<f64>,
}

impl TickContext {
    /// Create a new tick context
    pub fn new(timestamp: DateTime<Utc>, generation: f64, consumption: Vec<f64>) -> Self {
        Self {
            timestamp,
            generation,
            consumption,
        }
    }

    /// Number of consumer values carried by this tick
    #[inline]
    pub fn consumer_count(&self) -> usize {
        self.consumption.len()
    }

    /// Total consumption across all consumers
    pub fn total_consumption(&self) -> f64 {
        self.consumption.iter().sum()
    }

    /// Check the tick against an allocator serving `consumer_count` consumers
    ///
    /// Negative generation is rejected rather than clamped to zero.
    pub fn validate(&self, consumer_count: usize) -> Result<(), InputError> {
        if self.consumption.len() != consumer_count {
            return Err(InputError::LengthMismatch {
                expected: consumer_count,
                actual: self.consumption.len(),
            });
        }

        if !self.generation.is_finite() {
            return Err(InputError::NonFiniteGeneration);
        }
        if self.generation < 0.0 {
            return Err(InputError::NegativeGeneration(self.generation));
        }

        for (index, &value) in self.consumption.iter().enumerate() {
            if !value.is_finite() {
                return Err(InputError::NonFiniteConsumption { index });
            }
            if value < 0.0 {
                return Err(InputError::NegativeConsumption { index, value });
            }
        }

        Ok(())
    }
}
