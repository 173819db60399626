//! Property tests for allocator invariants

use chrono::{DateTime, Duration, TimeZone, Utc};
use directline_allocator::{
    AllocatorConfig, BranchAndBoundSolver, DirectLineAllocator, ExhaustiveSolver, FairnessTracker,
    KnapsackItem, KnapsackProblem, KnapsackSolver, SwitchTransition, UndefinedRatioPlacement,
};
use directline_common::{bonus_factor_for_rank, TickContext, CAPACITY_TOLERANCE};
use proptest::prelude::*;

const MAX_CONSUMERS: usize = 6;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 8, 31, 0, 0, 0).unwrap()
}

/// (generation, consumption, seconds since previous tick)
fn tick_stream() -> impl Strategy<Value = Vec<(f64, Vec<f64>, i64)>> {
    prop::collection::vec(
        (
            0.0f64..20.0,
            prop::collection::vec(prop_oneof![Just(0.0), 0.0f64..10.0], MAX_CONSUMERS),
            1i64..400,
        ),
        1..40,
    )
}

proptest! {
    #[test]
    fn prop_tick_invariants(
        n in 1usize..=MAX_CONSUMERS,
        short in 0i64..400,
        long in 0i64..400,
        increment in 0.0f64..0.6,
        stream in tick_stream(),
    ) {
        let config = AllocatorConfig {
            cooldown_short_secs: short,
            cooldown_long_secs: long,
            quota_increment: increment,
            ..AllocatorConfig::with_consumers(n)
        };
        let mut alloc = DirectLineAllocator::new(config).unwrap();

        let mut expected_quota = vec![0.0f64; n];
        let mut previous = vec![false; n];
        let mut now = start();

        for (generation, consumption, step) in stream {
            now += Duration::seconds(step);
            let consumption: Vec<f64> = consumption.into_iter().take(n).collect();
            let tick = TickContext::new(now, generation, consumption.clone());
            let report = alloc.run_tick(&tick).unwrap();
            prop_assert!(!report.status.is_fallback());

            // Capacity
            prop_assert!(report.result.total_allocated() <= generation + CAPACITY_TOLERANCE);

            for i in 0..n {
                let connected = report.connect()[i];
                let allocated = report.allocated()[i];

                // All or nothing
                if connected {
                    prop_assert_eq!(allocated, consumption[i]);
                } else {
                    prop_assert_eq!(allocated, 0.0);
                }

                // Locked consumers cannot be connected
                if !report.eligible[i] {
                    prop_assert!(!connected);
                    prop_assert!(!previous[i]);
                }

                // Quota bookkeeping
                expected_quota[i] += increment;
                let state = &alloc.switching_states()[i];
                match (previous[i], connected) {
                    (false, true) => expected_quota[i] -= 1.0,
                    (true, false) => {
                        expected_quota[i] -= 1.0;
                        prop_assert_eq!(state.last_disconnect, Some(now));
                    }
                    _ => {}
                }
                prop_assert!((state.quota - expected_quota[i]).abs() < 1e-9);
                previous[i] = connected;
            }
        }
    }

    #[test]
    fn prop_branch_and_bound_matches_exhaustive(
        items in prop::collection::vec((0.0f64..10.0, 0.0f64..500.0), 0..12),
        capacity in 0.0f64..30.0,
    ) {
        let problem = KnapsackProblem::new(
            items.into_iter().map(|(weight, value)| KnapsackItem { weight, value }).collect(),
            capacity,
        );
        let bnb = BranchAndBoundSolver::default().solve(&problem).unwrap();
        let oracle = ExhaustiveSolver.solve(&problem).unwrap();

        prop_assert!(problem.total_weight(&bnb.chosen) <= problem.effective_capacity());
        prop_assert!((bnb.objective - oracle.objective).abs() < 1e-6);
        prop_assert!((problem.objective(&bnb.chosen) - bnb.objective).abs() < 1e-6);
    }

    #[test]
    fn prop_bonus_factors_are_a_ranked_permutation(
        history in prop::collection::vec((0.0f64..10.0, prop_oneof![Just(0.0), 0.0f64..10.0]), 1..10),
    ) {
        let n = history.len();
        let allocated: Vec<f64> = history.iter().map(|(a, c)| a.min(*c)).collect();
        let consumed: Vec<f64> = history.iter().map(|(_, c)| *c).collect();

        let mut tracker = FairnessTracker::new(n, UndefinedRatioPlacement::Last);
        tracker.apply_deltas(&allocated, &consumed).unwrap();
        let factors = tracker.bonus_factors();

        let mut sorted = factors.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (rank, f) in sorted.iter().enumerate() {
            prop_assert!((f - bonus_factor_for_rank(rank)).abs() < 1e-9);
        }

        // The smallest factor goes to the largest defined ratio
        let best = (0..n)
            .filter_map(|i| tracker.ratio(i).map(|r| (i, r)))
            .fold(None::<(usize, f64)>, |acc, (i, r)| match acc {
                Some((_, br)) if br >= r => acc,
                _ => Some((i, r)),
            });
        if let Some((index, _)) = best {
            prop_assert!((factors[index] - bonus_factor_for_rank(0)).abs() < 1e-9);
        }

        // Zero deltas change nothing
        tracker.apply_deltas(&vec![0.0; n], &vec![0.0; n]).unwrap();
        tracker.apply_deltas(&vec![0.0; n], &vec![0.0; n]).unwrap();
        prop_assert_eq!(tracker.bonus_factors(), factors);
    }
}

#[test]
fn test_transition_classification() {
    assert!(SwitchTransition::Connected.is_switch());
    assert!(SwitchTransition::Disconnected.is_switch());
    assert!(!SwitchTransition::Unchanged.is_switch());
}
