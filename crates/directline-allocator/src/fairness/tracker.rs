//! Fairness tracker: ranking by allocation ratio = allocated / consumed
//!
//! The consumer with the highest historical ratio (best served) receives the
//! smallest bonus factor, 0.7; each following rank adds 0.1, so the least
//! served consumer carries the largest weight into the objective.

use std::cmp::Ordering;
use std::str::FromStr;

use directline_common::{bonus_factor_for_rank, InputError};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where consumers with zero cumulative consumption are ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedRatioPlacement {
    /// After every defined ratio: treated as least served, largest bonus
    #[default]
    Last,
    /// Before every defined ratio: treated as best served, smallest bonus
    First,
}

impl FromStr for UndefinedRatioPlacement {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" => Ok(Self::Last),
            "first" => Ok(Self::First),
            _ => Err(()),
        }
    }
}

/// Absolute energy counters read from the meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Direct-line energy delivered per consumer since commissioning
    pub allocated: Vec<f64>,
    /// Total energy consumed per consumer since commissioning
    pub consumption: Vec<f64>,
}

/// Cumulative service history per consumer
#[derive(Debug, Clone)]
pub struct FairnessTracker {
    cumulative_allocated: Vec<f64>,
    cumulative_consumption: Vec<f64>,
    /// Last absolute reading, deltas are taken against it
    baseline: Option<MeterReading>,
    placement: UndefinedRatioPlacement,
}

impl FairnessTracker {
    /// Create a tracker with empty history
    pub fn new(consumer_count: usize, placement: UndefinedRatioPlacement) -> Self {
        Self {
            cumulative_allocated: vec![0.0; consumer_count],
            cumulative_consumption: vec![0.0; consumer_count],
            baseline: None,
            placement,
        }
    }

    #[inline]
    pub fn consumer_count(&self) -> usize {
        self.cumulative_allocated.len()
    }

    pub fn placement(&self) -> UndefinedRatioPlacement {
        self.placement
    }

    pub fn cumulative_allocated(&self) -> &[f64] {
        &self.cumulative_allocated
    }

    pub fn cumulative_consumption(&self) -> &[f64] {
        &self.cumulative_consumption
    }

    /// Last meter reading accepted as baseline
    pub fn baseline(&self) -> Option<&MeterReading> {
        self.baseline.as_ref()
    }

    /// Add energy deltas to the history
    pub fn apply_deltas(
        &mut self,
        allocated_deltas: &[f64],
        consumption_deltas: &[f64],
    ) -> Result<(), InputError> {
        self.check_series(allocated_deltas)?;
        self.check_series(consumption_deltas)?;
        for series in [allocated_deltas, consumption_deltas] {
            if let Some((index, &value)) = series.iter().enumerate().find(|(_, v)| **v < 0.0) {
                return Err(InputError::NegativeDelta { index, value });
            }
        }

        self.accumulate(allocated_deltas, consumption_deltas);
        debug!(
            allocated = ?self.cumulative_allocated,
            consumption = ?self.cumulative_consumption,
            "Applied fairness deltas"
        );
        Ok(())
    }

    /// Apply absolute meter counters
    ///
    /// The first reading only sets the baseline. A reading where any counter
    /// went backwards replaces the baseline without touching the history.
    pub fn apply_meter_reading(
        &mut self,
        allocated_totals: &[f64],
        consumption_totals: &[f64],
    ) -> Result<(), InputError> {
        self.check_series(allocated_totals)?;
        self.check_series(consumption_totals)?;

        let reading = MeterReading {
            allocated: allocated_totals.to_vec(),
            consumption: consumption_totals.to_vec(),
        };

        let Some(baseline) = self.baseline.as_ref() else {
            debug!("Fairness meter baseline established");
            self.baseline = Some(reading);
            return Ok(());
        };

        let allocated_deltas: Vec<f64> = delta(&baseline.allocated, allocated_totals);
        let consumption_deltas: Vec<f64> = delta(&baseline.consumption, consumption_totals);

        let regressed = allocated_deltas
            .iter()
            .chain(consumption_deltas.iter())
            .any(|d| *d < 0.0);
        if regressed {
            warn!("Meter counter went backwards, re-establishing fairness baseline");
            self.baseline = Some(reading);
            return Ok(());
        }

        self.accumulate(&allocated_deltas, &consumption_deltas);
        self.baseline = Some(reading);
        debug!(
            allocated = ?self.cumulative_allocated,
            consumption = ?self.cumulative_consumption,
            "Applied fairness meter reading"
        );
        Ok(())
    }

    /// Historical allocation ratio, `None` without consumption history
    pub fn ratio(&self, index: usize) -> Option<f64> {
        let consumed = *self.cumulative_consumption.get(index)?;
        if consumed > 0.0 {
            Some(self.cumulative_allocated[index] / consumed)
        } else {
            None
        }
    }

    /// Consumer indices from best served to least served
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.consumer_count()).collect();
        order.sort_by(|&a, &b| self.compare(a, b));
        order
    }

    /// Bonus factor per consumer, a permutation of 0.7, 0.8, ... over all consumers
    pub fn bonus_factors(&self) -> Vec<f64> {
        let mut factors = vec![0.0; self.consumer_count()];
        for (rank, index) in self.ranking().into_iter().enumerate() {
            factors[index] = bonus_factor_for_rank(rank);
        }
        factors
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let by_ratio = match (self.ratio(a), self.ratio(b)) {
            (Some(ra), Some(rb)) => OrderedFloat(rb).cmp(&OrderedFloat(ra)),
            (Some(_), None) => self.undefined_after(),
            (None, Some(_)) => self.undefined_after().reverse(),
            (None, None) => Ordering::Equal,
        };
        by_ratio.then(a.cmp(&b))
    }

    /// Ordering of a defined ratio relative to an undefined one
    fn undefined_after(&self) -> Ordering {
        match self.placement {
            UndefinedRatioPlacement::Last => Ordering::Less,
            UndefinedRatioPlacement::First => Ordering::Greater,
        }
    }

    fn check_series(&self, series: &[f64]) -> Result<(), InputError> {
        if series.len() != self.consumer_count() {
            return Err(InputError::LengthMismatch {
                expected: self.consumer_count(),
                actual: series.len(),
            });
        }
        if let Some(index) = series.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonFiniteCounter { index });
        }
        Ok(())
    }

    fn accumulate(&mut self, allocated_deltas: &[f64], consumption_deltas: &[f64]) {
        for (total, d) in self.cumulative_allocated.iter_mut().zip(allocated_deltas) {
            *total += d;
        }
        for (total, d) in self.cumulative_consumption.iter_mut().zip(consumption_deltas) {
            *total += d;
        }
    }
}

fn delta(previous: &[f64], current: &[f64]) -> Vec<f64> {
    current.iter().zip(previous).map(|(c, p)| c - p).collect()
}
