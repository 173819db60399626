//! Tick orchestrator
//!
//! Runs one tick as a fixed sequence:
//! 1. validate the input
//! 2. earn quota and filter out consumers still in their dwell time
//! 3. formulate and solve the knapsack with the current bonus factors
//! 4. apply the decision and charge switches against the quota
//! 5. feed the fairness tracker (only with `FairnessFeed::FromAllocation`)

use chrono::{DateTime, Utc};
use directline_common::{
    AllocationResult, InputError, Result, TickContext, TickReport, TickStatus,
};
use tracing::{debug, info, instrument, warn};

use crate::config::{AllocatorConfig, FairnessFeed};
use crate::debounce::{DebounceController, SwitchingState};
use crate::fairness::FairnessTracker;
use crate::optimizer::{AllocationModel, BranchAndBoundSolver, KnapsackSolver};

/// Allocator for one direct-line installation
pub struct DirectLineAllocator {
    config: AllocatorConfig,
    debounce: DebounceController,
    fairness: FairnessTracker,
    model: AllocationModel,
    solver: Box<dyn KnapsackSolver>,
    last_timestamp: Option<DateTime<Utc>>,
    ticks: u64,
}

impl DirectLineAllocator {
    /// Create an allocator using the branch-and-bound solver
    pub fn new(config: AllocatorConfig) -> Result<Self> {
        let solver = Box::new(BranchAndBoundSolver::new(config.solver_node_limit));
        Self::with_solver(config, solver)
    }

    /// Create an allocator with a custom solver
    pub fn with_solver(config: AllocatorConfig, solver: Box<dyn KnapsackSolver>) -> Result<Self> {
        config.validate()?;

        info!(
            consumers = config.consumer_count,
            cooldown_short_secs = config.cooldown_short_secs,
            cooldown_long_secs = config.cooldown_long_secs,
            quota_increment = config.quota_increment,
            solver = solver.name(),
            "Direct-line allocator initialized"
        );

        Ok(Self {
            debounce: DebounceController::new(
                config.consumer_count,
                config.cooldown_short_secs,
                config.cooldown_long_secs,
                config.quota_increment,
            ),
            fairness: FairnessTracker::new(config.consumer_count, config.undefined_ratio_placement),
            model: AllocationModel::new(config.fairness_weight),
            solver,
            last_timestamp: None,
            ticks: 0,
            config,
        })
    }

    /// Decide the connect state of every consumer for one tick
    ///
    /// Malformed input is rejected without touching any state. A solver
    /// failure is not an error: the previous connect state is held, no quota
    /// is charged, and the report carries `TickStatus::Fallback` with zero
    /// allocated energy.
    #[instrument(skip(self, tick), fields(timestamp = %tick.timestamp, generation = tick.generation))]
    pub fn run_tick(&mut self, tick: &TickContext) -> Result<TickReport> {
        tick.validate(self.consumer_count())?;
        if let Some(previous) = self.last_timestamp {
            if tick.timestamp < previous {
                return Err(InputError::TimestampRegression {
                    previous,
                    current: tick.timestamp,
                }
                .into());
            }
        }

        self.debounce.begin_tick();
        let (filtered, eligible) = self
            .debounce
            .filter_consumption(tick.timestamp, &tick.consumption);
        let bonus_factors = self.fairness.bonus_factors();
        debug!(?eligible, ?bonus_factors, "Eligibility filter applied");

        let model = self.model;
        let problem = model.build(&filtered, &bonus_factors, tick.generation);
        let outcome = self.solver.solve(&problem).and_then(|selection| {
            model.verify(&problem, &selection)?;
            Ok(selection)
        });

        let (result, status) = match outcome {
            Ok(selection) => {
                let result = model.decode(&selection, &filtered);
                let transitions = self.debounce.apply_decision(&result.connect, tick.timestamp);
                debug!(
                    connected = result.connected_count(),
                    allocated = result.total_allocated(),
                    switches = transitions.iter().filter(|t| t.is_switch()).count(),
                    "Tick optimized"
                );
                (result, TickStatus::Optimized)
            }
            Err(reason) => {
                warn!(
                    solver = self.solver.name(),
                    error = %reason,
                    "Optimizer failed, holding previous connect state"
                );
                let result = AllocationResult::unverified(self.debounce.connect_state());
                (result, TickStatus::Fallback { reason })
            }
        };

        if self.config.fairness_feed == FairnessFeed::FromAllocation {
            self.fairness.apply_deltas(&result.allocated, &tick.consumption)?;
        }

        self.last_timestamp = Some(tick.timestamp);
        self.ticks += 1;

        Ok(TickReport {
            timestamp: tick.timestamp,
            result,
            eligible,
            bonus_factors,
            status,
        })
    }

    /// Add energy deltas to the fairness history
    pub fn update_fairness_deltas(
        &mut self,
        allocated_deltas: &[f64],
        consumption_deltas: &[f64],
    ) -> Result<()> {
        self.fairness.apply_deltas(allocated_deltas, consumption_deltas)?;
        Ok(())
    }

    /// Feed absolute meter counters into the fairness history
    pub fn update_fairness_from_meters(
        &mut self,
        allocated_totals: &[f64],
        consumption_totals: &[f64],
    ) -> Result<()> {
        self.fairness
            .apply_meter_reading(allocated_totals, consumption_totals)?;
        Ok(())
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    #[inline]
    pub fn consumer_count(&self) -> usize {
        self.config.consumer_count
    }

    /// Connect state decided by the last tick
    pub fn connect_state(&self) -> Vec<bool> {
        self.debounce.connect_state()
    }

    pub fn switching_states(&self) -> &[SwitchingState] {
        self.debounce.states()
    }

    /// Bonus factors the next tick will use
    pub fn bonus_factors(&self) -> Vec<f64> {
        self.fairness.bonus_factors()
    }

    pub fn fairness(&self) -> &FairnessTracker {
        &self.fairness
    }

    /// Number of completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }
}

impl std::fmt::Debug for DirectLineAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectLineAllocator")
            .field("config", &self.config)
            .field("solver", &self.solver.name())
            .field("ticks", &self.ticks)
            .field("last_timestamp", &self.last_timestamp)
            .finish()
    }
}
