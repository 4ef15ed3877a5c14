// tests/flat_scenarios.rs

mod common;

use common::{TaskBuilder, init_tracing, task_set};
use mtsched::flat::{
    Alignment, BaseScheduler, ExactScheduler, MixedTrustTask, SchedulabilityTest,
};

fn task(name: &str, period: i64, priority: i64, guest: i64, hyper: i64) -> MixedTrustTask {
    TaskBuilder::new(name, period)
        .priority(priority)
        .guest(guest)
        .guest_criticality(0)
        .hyper(hyper)
        .hyper_criticality(1)
        .build()
}

fn exact(tasks: Vec<MixedTrustTask>) -> ExactScheduler {
    let mut scheduler = ExactScheduler::new();
    for t in tasks {
        scheduler.add(t).unwrap();
    }
    scheduler
}

fn scenario_1() -> Vec<MixedTrustTask> {
    vec![task("a", 8, 1, 4, 0), task("b", 14, 0, 3, 2)]
}

fn scenario_2() -> Vec<MixedTrustTask> {
    vec![
        task("a", 8, 2, 4, 0),
        task("b", 14, 1, 2, 2),
        task("c", 20, 0, 4, 1),
    ]
}

fn scenario_3() -> Vec<MixedTrustTask> {
    vec![
        task("a", 8, 2, 2, 0),
        task("b", 14, 1, 2, 2),
        task("c", 20, 0, 4, 1),
    ]
}

#[test]
fn scenario_1_two_tasks_are_schedulable() {
    init_tracing();
    let mut scheduler = exact(scenario_1());

    assert!(scheduler.is_schedulable().unwrap());

    let set = scheduler.tasks();
    let a = set.find("a").unwrap();
    let b = set.find("b").unwrap();
    assert_eq!(a.hyper.response_time, 0);
    assert_eq!(b.hyper.response_time, 2);
    assert_eq!(b.enforcement_timeout(), 12);
    assert_eq!(a.guest.normal_response_time, 6);
    assert_eq!(b.guest.normal_response_time, 11);
}

#[test]
fn scenario_2_three_tasks_are_not_schedulable() {
    init_tracing();
    let mut scheduler = exact(scenario_2());
    assert!(!scheduler.is_schedulable().unwrap());
}

#[test]
fn scenario_3_three_tasks_are_schedulable() {
    init_tracing();
    let mut scheduler = exact(scenario_3());

    assert!(scheduler.is_schedulable().unwrap());

    let set = scheduler.tasks();
    let hyper: Vec<i64> = ["a", "b", "c"]
        .iter()
        .map(|n| set.find(n).unwrap().hyper.response_time)
        .collect();
    let guest: Vec<i64> = ["a", "b", "c"]
        .iter()
        .map(|n| set.find(n).unwrap().guest.normal_response_time)
        .collect();
    assert_eq!(hyper, vec![0, 3, 3]);
    assert_eq!(guest, vec![5, 5, 12]);
}

#[test]
fn scenario_4_single_task_is_schedulable() {
    init_tracing();
    let mut scheduler = exact(vec![task("a", 10, 0, 4, 0)]);

    assert!(scheduler.is_schedulable().unwrap());
    assert_eq!(scheduler.tasks().get(0).guest.normal_response_time, 4);
}

#[test]
fn scenario_5_full_utilization_is_rejected_by_the_gate() {
    init_tracing();
    let mut scheduler = exact(vec![task("a", 10, 1, 3, 3), task("b", 10, 0, 2, 2)]);

    assert!(scheduler.tasks().utilization_at_least_one());
    assert!(!scheduler.is_schedulable().unwrap());

    // The gate runs before any recurrence, so nothing was written back.
    for t in scheduler.tasks().tasks() {
        assert_eq!(t.hyper.response_time, 0);
        assert_eq!(t.guest.normal_response_time, 0);
    }
}

#[test]
fn exact_guest_response_diverges_at_full_utilization() {
    let scheduler = exact(vec![task("a", 10, 1, 3, 3), task("b", 10, 0, 2, 2)]);
    assert_eq!(
        scheduler.exact_guest_response_time(0, Alignment::Guest, false),
        mtsched::flat::base::DIVERGED
    );
}

#[test]
fn hyper_alignment_is_skipped_without_hyper_work() {
    let scheduler = exact(scenario_1());
    let a = 0;
    assert_eq!(scheduler.exact_guest_response_time(a, Alignment::Hyper, false), 0);
    assert!(scheduler.exact_guest_response_time(a, Alignment::Guest, false) > 0);
}

#[test]
fn base_scheduler_matches_exact_on_scenario_3() {
    init_tracing();
    let mut base = BaseScheduler::new();
    for t in scenario_3() {
        base.add(t).unwrap();
    }

    assert!(base.is_schedulable().unwrap());
    let set = base.tasks();
    assert_eq!(set.find("b").unwrap().hyper.response_time, 3);
    assert_eq!(set.find("c").unwrap().hyper.response_time, 3);
    assert_eq!(set.find("c").unwrap().guest.normal_response_time, 12);
}

#[test]
fn base_scheduler_rejects_scenario_2_on_the_lowest_guest() {
    init_tracing();
    let mut base = BaseScheduler::new();
    for t in scenario_2() {
        base.add(t).unwrap();
    }

    assert!(!base.is_schedulable().unwrap());
    let c = base.tasks().find("c").unwrap();
    assert_eq!(c.hyper.response_time, 3);
    assert_eq!(c.enforcement_timeout(), 17);
    assert_eq!(c.guest.normal_response_time, 20);
}

#[test]
fn base_scheduler_accepts_scenario_1() {
    let mut base = BaseScheduler::new();
    for t in scenario_1() {
        base.add(t).unwrap();
    }
    assert!(base.is_schedulable().unwrap());
}

#[test]
fn zero_hyper_execution_has_zero_hyper_response() {
    let base = BaseScheduler::from_task_set(task_set(&[("a", 10, 10, 4, 0), ("b", 20, 20, 3, 5)]));
    let a = base.tasks().tasks().iter().position(|t| t.name == "a").unwrap();
    assert_eq!(base.hyper_response_time(a, false), 0);
}

#[test]
fn analyse_reports_tasks_in_priority_order() {
    let mut scheduler = exact(scenario_3());
    let report = scheduler.analyse().unwrap();

    assert!(report.schedulable);
    let names: Vec<&str> = report.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let c = report.task("c").unwrap();
    assert_eq!(c.hyper_response_time, 3);
    assert_eq!(c.enforcement_timeout, 17);
    assert_eq!(c.guest_response_time, 12);

    let text = report.to_string();
    assert!(text.starts_with("verdict: SCHEDULABLE"));
    assert!(text.contains("c (priority 0)"));
}
