//! End-to-end allocation scenarios
//!
//! Drives the allocator through short tick sequences and checks the
//! decisions, the switching quota, and the dwell-time lockout.

use chrono::{DateTime, Duration, TimeZone, Utc};
use directline_allocator::{
    AllocationModel, AllocatorConfig, BranchAndBoundSolver, DirectLineAllocator, KnapsackSolver,
};
use directline_common::{TickContext, TickStatus};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 8, 31, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

fn allocator(config: AllocatorConfig) -> DirectLineAllocator {
    DirectLineAllocator::new(config).expect("valid config")
}

#[test]
fn test_scenario_a_everyone_fits() {
    // Equal factors straight into the model
    let model = AllocationModel::new(100.0);
    let problem = model.build(&[4.0, 4.0], &[1.0, 1.0], 10.0);
    let selection = BranchAndBoundSolver::default().solve(&problem).unwrap();
    let result = model.decode(&selection, &[4.0, 4.0]);
    assert_eq!(result.connect, vec![true, true]);
    assert_eq!(result.allocated, vec![4.0, 4.0]);

    // And through the allocator
    let mut alloc = allocator(AllocatorConfig::with_consumers(2));
    let report = alloc
        .run_tick(&TickContext::new(at(0), 10.0, vec![4.0, 4.0]))
        .unwrap();
    assert_eq!(report.status, TickStatus::Optimized);
    assert_eq!(report.connect(), &[true, true]);
    assert_eq!(report.allocated(), &[4.0, 4.0]);
}

#[test]
fn test_scenario_b_under_served_consumer_wins() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(2));
    // Consumer 0 got everything so far, consumer 1 nothing
    alloc.update_fairness_deltas(&[4.0, 0.0], &[4.0, 4.0]).unwrap();

    let report = alloc
        .run_tick(&TickContext::new(at(0), 5.0, vec![4.0, 4.0]))
        .unwrap();
    assert!(report.bonus_factors[1] > report.bonus_factors[0]);
    assert_eq!(report.connect(), &[false, true]);
    assert_eq!(report.allocated(), &[0.0, 4.0]);
}

#[test]
fn test_scenario_c_consumer_larger_than_generation() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(1));
    let report = alloc
        .run_tick(&TickContext::new(at(0), 5.0, vec![6.0]))
        .unwrap();
    assert_eq!(report.connect(), &[false]);
    assert_eq!(report.allocated(), &[0.0]);

    // Even as the least served consumer it cannot be split
    let mut alloc = allocator(AllocatorConfig::with_consumers(2));
    alloc.update_fairness_deltas(&[5.0, 0.0], &[5.0, 5.0]).unwrap();
    let report = alloc
        .run_tick(&TickContext::new(at(0), 5.0, vec![1.0, 6.0]))
        .unwrap();
    assert_eq!(report.connect(), &[true, false]);
    assert_eq!(report.allocated(), &[1.0, 0.0]);
}

#[test]
fn test_scenario_d_cooldown_after_disconnect() {
    let mut alloc = allocator(AllocatorConfig {
        cooldown_short_secs: 300,
        cooldown_long_secs: 300,
        quota_increment: 1.0,
        ..AllocatorConfig::with_consumers(1)
    });

    let report = alloc.run_tick(&TickContext::new(at(0), 10.0, vec![4.0])).unwrap();
    assert_eq!(report.connect(), &[true]);

    // Generation drops away at t = 10
    let report = alloc.run_tick(&TickContext::new(at(10), 0.0, vec![4.0])).unwrap();
    assert_eq!(report.connect(), &[false]);
    assert_eq!(alloc.switching_states()[0].last_disconnect, Some(at(10)));

    let report = alloc.run_tick(&TickContext::new(at(210), 10.0, vec![4.0])).unwrap();
    assert!(alloc.switching_states()[0].quota >= 1.0);
    assert_eq!(report.eligible, vec![false]);
    assert_eq!(report.connect(), &[false]);

    let report = alloc.run_tick(&TickContext::new(at(311), 10.0, vec![4.0])).unwrap();
    assert_eq!(report.eligible, vec![true]);
    assert_eq!(report.connect(), &[true]);
}

#[test]
fn test_disconnect_records_time_and_charges_quota() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(1));
    alloc.run_tick(&TickContext::new(at(0), 10.0, vec![4.0])).unwrap();
    let quota_before = alloc.switching_states()[0].quota;

    alloc.run_tick(&TickContext::new(at(15), 1.0, vec![4.0])).unwrap();
    let state = &alloc.switching_states()[0];
    assert!(!state.connected);
    assert_eq!(state.last_disconnect, Some(at(15)));
    assert!((state.quota - (quota_before + 0.032 - 1.0)).abs() < 1e-12);
}

#[test]
fn test_staying_connected_only_earns_quota() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(2));
    alloc
        .run_tick(&TickContext::new(at(0), 10.0, vec![4.0, 4.0]))
        .unwrap();

    for step in 1..=10 {
        let before: Vec<f64> = alloc.switching_states().iter().map(|s| s.quota).collect();
        let report = alloc
            .run_tick(&TickContext::new(at(step * 15), 10.0, vec![4.0, 4.0]))
            .unwrap();
        assert_eq!(report.connect(), &[true, true]);
        for (state, q) in alloc.switching_states().iter().zip(before) {
            assert!((state.quota - (q + 0.032)).abs() < 1e-12);
        }
    }
}

#[test]
fn test_locked_without_quota_despite_abundant_generation() {
    // Release after 300 s, or after 60 s with quota
    let mut alloc = allocator(AllocatorConfig::with_consumers(1));
    alloc.run_tick(&TickContext::new(at(0), 10.0, vec![4.0])).unwrap();
    alloc.run_tick(&TickContext::new(at(15), 0.0, vec![4.0])).unwrap();

    let report = alloc
        .run_tick(&TickContext::new(at(135), 100.0, vec![4.0]))
        .unwrap();
    assert!(alloc.switching_states()[0].quota < 1.0);
    assert_eq!(report.eligible, vec![false]);
    assert_eq!(report.connect(), &[false]);
    assert_eq!(report.allocated(), &[0.0]);

    let report = alloc
        .run_tick(&TickContext::new(at(315), 100.0, vec![4.0]))
        .unwrap();
    assert_eq!(report.connect(), &[true]);
}

#[test]
fn test_quota_allows_early_reconnect() {
    let mut alloc = allocator(AllocatorConfig {
        quota_increment: 1.5,
        ..AllocatorConfig::with_consumers(1)
    });
    alloc.run_tick(&TickContext::new(at(0), 10.0, vec![4.0])).unwrap();
    alloc.run_tick(&TickContext::new(at(15), 0.0, vec![4.0])).unwrap();

    // Inside the 60 s window even with quota
    let report = alloc.run_tick(&TickContext::new(at(45), 10.0, vec![4.0])).unwrap();
    assert_eq!(report.connect(), &[false]);

    // Past 60 s with quota >= 1, well before 300 s
    let report = alloc.run_tick(&TickContext::new(at(105), 10.0, vec![4.0])).unwrap();
    assert_eq!(report.eligible, vec![true]);
    assert_eq!(report.connect(), &[true]);
}

#[test]
fn test_meter_readings_steer_allocation() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(3));
    alloc.update_fairness_from_meters(&[0.0; 3], &[0.0; 3]).unwrap();
    alloc
        .update_fairness_from_meters(&[9.0, 1.0, 5.0], &[10.0, 10.0, 10.0])
        .unwrap();

    // Room for one consumer: the least served (index 1) goes first
    let report = alloc
        .run_tick(&TickContext::new(at(0), 4.0, vec![3.0, 3.0, 3.0]))
        .unwrap();
    assert_eq!(report.connect(), &[false, true, false]);
}

#[test]
fn test_utilization_beats_fairness_when_it_fits_more() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(3));
    alloc
        .update_fairness_deltas(&[10.0, 10.0, 0.0], &[10.0, 10.0, 10.0])
        .unwrap();

    // Consumers 0 and 1 together use all 6; consumer 2 alone uses 5
    let report = alloc
        .run_tick(&TickContext::new(at(0), 6.0, vec![3.0, 3.0, 5.0]))
        .unwrap();
    assert_eq!(report.connect(), &[true, true, false]);
    assert!((report.result.total_allocated() - 6.0).abs() < 1e-12);
}

#[test]
fn test_zero_consumption_counts_as_disconnect() {
    let mut alloc = allocator(AllocatorConfig::with_consumers(1));
    alloc.run_tick(&TickContext::new(at(0), 10.0, vec![4.0])).unwrap();
    let report = alloc.run_tick(&TickContext::new(at(15), 10.0, vec![0.0])).unwrap();
    assert_eq!(report.connect(), &[false]);
    assert_eq!(alloc.switching_states()[0].last_disconnect, Some(at(15)));
}
