// tests/utilization.rs

//! Utilization gates over periods whose common denominator does not fit in
//! a machine word.

mod common;

use common::{init_tracing, task_set};
use mtsched::flat::{ExactScheduler, TaskSet};

const COPRIME_PERIODS: [i64; 12] = [
    10007, 10009, 10037, 10039, 10061, 10067, 10069, 10079, 10091, 10093, 10099, 10103,
];

fn coprime_set(guest: i64, hyper: i64) -> TaskSet {
    let names: Vec<String> = (0..COPRIME_PERIODS.len()).map(|i| format!("t{i}")).collect();
    let tasks: Vec<(&str, i64, i64, i64, i64)> = names
        .iter()
        .zip(COPRIME_PERIODS)
        .map(|(name, period)| (name.as_str(), period, period, guest, hyper))
        .collect();
    task_set(&tasks)
}

#[test]
fn light_load_over_many_coprime_periods_is_below_one() {
    init_tracing();
    let set = coprime_set(10, 0);
    assert!(!set.utilization_at_least_one());

    let mut sched = ExactScheduler::from_task_set(set);
    assert!(sched.is_exact_schedulable().unwrap());
}

#[test]
fn heavy_load_over_many_coprime_periods_reaches_one() {
    init_tracing();
    let set = coprime_set(900, 0);
    assert!(set.utilization_at_least_one());

    let mut sched = ExactScheduler::from_task_set(set);
    assert!(!sched.is_exact_schedulable().unwrap());
}

#[test]
fn load_just_below_one_is_not_rounded_up() {
    // sum(835 / T) is about 0.9958 over these periods.
    let set = coprime_set(835, 0);
    assert!(!set.utilization_at_least_one());
}

#[test]
fn hyper_gate_over_many_coprime_periods() {
    init_tracing();
    let set = coprime_set(10, 5);
    let lowest = set
        .tasks()
        .iter()
        .position(|t| t.name == "t11")
        .unwrap();
    assert!(!set.hyper_utilization_at_least_one(lowest));

    let mut sched = ExactScheduler::from_task_set(set);
    assert_eq!(sched.base().hyper_response_time(lowest, false), 60);
    assert!(sched.is_exact_schedulable().unwrap());
}

#[test]
fn utilization_of_exactly_one_counts_as_saturated() {
    let set = task_set(&[("a", 3, 3, 1, 0), ("b", 6, 6, 4, 0)]);
    assert!(set.utilization_at_least_one());
}
