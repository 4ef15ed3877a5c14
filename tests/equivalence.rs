// tests/equivalence.rs

//! Single mode, no transitions: the digraph engine is never more optimistic
//! than the flat base scheduler on the converted task set. The converse does
//! not hold, since the digraph bound charges every higher-priority release in
//! the window to each node.

mod common;

use common::{init_tracing, single_mode_system};
use mtsched::digraph::{
    assign_deadline_monotonic_priorities, flat_tasks_from_mode, is_modal_system_schedulable,
};
use mtsched::errors::SchedError;
use mtsched::flat::{BaseScheduler, SchedulabilityTest};
use proptest::prelude::*;

type Workload<'a> = &'a [(&'a str, i64, i64, i64, i64)];

/// `(digraph, base)` verdicts for one single-mode workload.
fn verdicts(tasks: Workload) -> (bool, bool) {
    init_tracing();
    let (mut system, mode) = single_mode_system(tasks);

    let set = flat_tasks_from_mode(&system, mode).unwrap();
    let flat = BaseScheduler::from_task_set(set).is_schedulable().unwrap();

    assign_deadline_monotonic_priorities(&mut system).unwrap();
    let digraph = is_modal_system_schedulable(&mut system).unwrap();
    (digraph, flat)
}

/// `(period, deadline, guest, hyper)` with a constrained deadline and the
/// hyper part well inside it.
fn task_params() -> impl Strategy<Value = (i64, i64, i64, i64)> {
    (4i64..=40)
        .prop_flat_map(|period| (Just(period), (period / 2)..=period))
        .prop_flat_map(|(period, deadline)| {
            (Just(period), Just(deadline), 0..=deadline / 2, 0..=deadline / 3)
        })
}

proptest! {
    #[test]
    fn digraph_schedulable_implies_base_schedulable(
        params in proptest::collection::vec(task_params(), 1..5)
    ) {
        let names: Vec<String> = (0..params.len()).map(|i| format!("t{i}")).collect();
        let tasks: Vec<(&str, i64, i64, i64, i64)> = names
            .iter()
            .zip(&params)
            .map(|(name, &(t, d, g, h))| (name.as_str(), t, d, g, h))
            .collect();

        let (digraph, base) = verdicts(&tasks);
        prop_assert!(!digraph || base, "digraph accepted {:?} but base rejected it", tasks);
    }
}

#[test]
fn engines_agree_on_a_schedulable_pair() {
    assert_eq!(verdicts(&[("a", 8, 8, 4, 0), ("b", 14, 14, 3, 2)]), (true, true));
}

#[test]
fn engines_agree_on_an_overloaded_pair() {
    assert_eq!(
        verdicts(&[("a", 10, 10, 5, 2), ("b", 10, 10, 4, 2)]),
        (false, false)
    );
}

#[test]
fn digraph_rejects_a_triple_the_base_scheduler_accepts() {
    // The digraph bound for c.guest counts hyper demand that the base
    // analysis leaves to the enforcement timeout.
    let tasks = [("a", 8, 8, 2, 0), ("b", 14, 14, 2, 2), ("c", 20, 20, 4, 1)];
    assert_eq!(verdicts(&tasks), (false, true));
}

#[test]
fn digraph_rejects_light_hyper_load_the_base_scheduler_accepts() {
    let tasks = [("a", 8, 8, 1, 0), ("b", 14, 14, 1, 2), ("c", 20, 20, 1, 2)];
    assert_eq!(verdicts(&tasks), (false, true));
}

#[test]
fn converter_collapses_each_graph_into_one_task() {
    let (system, mode) = single_mode_system(&[("a", 8, 7, 4, 0), ("b", 14, 12, 3, 2)]);
    let set = flat_tasks_from_mode(&system, mode).unwrap();

    assert_eq!(set.len(), 2);
    let a = set.find("a").unwrap();
    assert_eq!((a.period, a.deadline), (8, 7));
    assert_eq!(a.guest.execution_time(), 4);
    assert_eq!(a.hyper.execution_time, 0);
    assert_eq!(a.guest.criticality, 0);
    assert_eq!(a.hyper.criticality, 1);

    let b = set.find("b").unwrap();
    assert_eq!((b.period, b.deadline), (14, 12));
    assert_eq!(b.guest.execution_time(), 3);
    assert_eq!(b.hyper.execution_time, 2);

    // Deadline-monotonic: a has the shorter deadline.
    assert!(a.priority > b.priority);
}

#[test]
fn converter_needs_a_self_loop() {
    let mut system = mtsched::digraph::ModalSystem::new();
    let g = system.add_graph("chain");
    let first = system
        .add_node(g, mtsched::digraph::NodeSpec::guest("first", 1, 10))
        .unwrap();
    let second = system
        .add_node(g, mtsched::digraph::NodeSpec::guest("second", 1, 10))
        .unwrap();
    system.add_edge(g, first, second, 5).unwrap();
    system.add_edge(g, second, first, 5).unwrap();
    let mode = system.add_mode("m", &[g]).unwrap();

    let err = flat_tasks_from_mode(&system, mode).unwrap_err();
    assert!(matches!(err, SchedError::ConfigError(_)));
}
