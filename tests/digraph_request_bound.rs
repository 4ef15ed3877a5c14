// tests/digraph_request_bound.rs

mod common;

use std::collections::HashSet;

use common::{init_tracing, single_mode_system};
use mtsched::digraph::{
    Activation, Boundary, ModalSystem, ModeId, NodeId, analyse_node,
    assign_deadline_monotonic_priorities, blocking_of, is_modal_system_schedulable, jitter_of,
    request_bound,
};

struct Fixture {
    system: ModalSystem,
    mode: ModeId,
    xg: NodeId,
    xh: NodeId,
    yg: NodeId,
    yh: NodeId,
}

/// x: T=D=10, guest 2, hyper 1. y: T=D=20, guest 3, hyper 2.
fn fixture() -> Fixture {
    init_tracing();
    let (mut system, mode) = single_mode_system(&[("x", 10, 10, 2, 1), ("y", 20, 20, 3, 2)]);
    assign_deadline_monotonic_priorities(&mut system).unwrap();
    system.activate(Activation::Mode(mode));

    let node = |name: &str| system.find_node(name).unwrap();
    let (xg, xh, yg, yh) = (
        node("x.guest"),
        node("x.hyper"),
        node("y.guest"),
        node("y.hyper"),
    );
    Fixture {
        system,
        mode,
        xg,
        xh,
        yg,
        yh,
    }
}

#[test]
fn priorities_rank_hyper_nodes_first() {
    let f = fixture();
    let prio = |n| f.system.node_priority(n).unwrap();
    assert_eq!(prio(f.xh), 0);
    assert_eq!(prio(f.yh), 1);
    assert_eq!(prio(f.xg), 2);
    assert_eq!(prio(f.yg), 3);

    let x = f.system.node(f.xg).graphs()[0];
    assert_eq!(f.system.graph(x).priority, 0);
}

#[test]
fn strict_boundary_excludes_releases_at_the_interval_end() {
    let f = fixture();
    let x = f.system.node(f.xg).graphs()[0];
    let none = HashSet::new();

    let bound = |t| request_bound(&f.system, x, f.yg, t, Boundary::Strict, &none).unwrap();
    assert_eq!(bound(0), 0);
    assert_eq!(bound(5), 3);
    assert_eq!(bound(10), 3);
}

#[test]
fn inclusive_boundary_counts_releases_at_the_interval_end() {
    let f = fixture();
    let x = f.system.node(f.xg).graphs()[0];
    let none = HashSet::new();

    let bound = |t| request_bound(&f.system, x, f.yg, t, Boundary::Inclusive, &none).unwrap();
    assert_eq!(bound(0), 2);
    assert_eq!(bound(10), 5);
}

#[test]
fn lower_priority_nodes_do_not_contribute() {
    let f = fixture();
    let x = f.system.node(f.xg).graphs()[0];
    let none = HashSet::new();

    // Only x.hyper outranks y.hyper.
    let bound = request_bound(&f.system, x, f.yh, 10, Boundary::Inclusive, &none).unwrap();
    assert_eq!(bound, 2);
}

#[test]
fn accounted_nodes_are_skipped() {
    let f = fixture();
    let x = f.system.node(f.xg).graphs()[0];
    let accounted: HashSet<NodeId> = [f.xg].into_iter().collect();

    let bound = request_bound(&f.system, x, f.yg, 5, Boundary::Strict, &accounted).unwrap();
    assert_eq!(bound, 1);
}

#[test]
fn inactive_graphs_request_nothing() {
    let mut f = fixture();
    f.system.deactivate_all();
    let x = f.system.node(f.xg).graphs()[0];
    let none = HashSet::new();

    let bound = request_bound(&f.system, x, f.yg, 10, Boundary::Inclusive, &none).unwrap();
    assert_eq!(bound, 0);
    assert!(!f.system.node_is_active(f.xg).unwrap());
    assert!(!f.system.mode(f.mode).active);
}

#[test]
fn own_graph_never_interferes() {
    let f = fixture();
    let y = f.system.node(f.yg).graphs()[0];
    let none = HashSet::new();

    let bound = request_bound(&f.system, y, f.yg, 40, Boundary::Inclusive, &none).unwrap();
    assert_eq!(bound, 0);
}

#[test]
fn blocking_is_the_longest_lower_priority_hyper_node() {
    let f = fixture();
    let working = f.system.working_set();

    assert_eq!(blocking_of(&f.system, &working, f.xh).unwrap(), 2);
    assert_eq!(blocking_of(&f.system, &working, f.yh).unwrap(), 0);
}

#[test]
fn jitter_uses_interfering_nodes_only() {
    let f = fixture();
    let x = f.system.node(f.xg).graphs()[0];

    // x.guest: 10 - 2 = 8, x.hyper: 10 - 1 = 9.
    assert_eq!(jitter_of(&f.system, x, f.yg).unwrap(), 9);
    assert_eq!(jitter_of(&f.system, x, f.yh).unwrap(), 9);
}

#[test]
fn per_node_response_times() {
    let f = fixture();
    let working = f.system.working_set();
    let response = |n| analyse_node(&f.system, &working, n).unwrap();

    let yh = response(f.yh);
    assert!(yh.schedulable);
    assert_eq!(yh.response_time, 4);

    // Blocked by y.hyper, then its own WCET.
    assert_eq!(response(f.xh).response_time, 3);
    assert_eq!(response(f.xg).response_time, 6);
    assert_eq!(response(f.yg).response_time, 9);
}

#[test]
fn unknown_handles_are_rejected() {
    let f = fixture();
    let mut system = f.system.clone();
    let graph = system.add_graph("lonely");
    let err = system.add_edge(graph, NodeId(999), NodeId(999), 5).unwrap_err();
    assert!(matches!(err, mtsched::errors::SchedError::ConfigError(_)));
}

/// fast: T=D=10, guest 1. slow: T=D=2_000_000, guest 800_000. A request
/// bound of fast over slow's window chains about 10^5 self-loop hops.
fn long_chain() -> (ModalSystem, ModeId) {
    init_tracing();
    single_mode_system(&[("fast", 10, 10, 1, 0), ("slow", 2_000_000, 2_000_000, 800_000, 0)])
}

#[test]
fn long_release_chains_are_bounded_without_deep_recursion() {
    let (mut system, mode) = long_chain();
    assign_deadline_monotonic_priorities(&mut system).unwrap();
    system.activate(Activation::Mode(mode));

    let fast = system.working_set()[0];
    assert_eq!(system.graph(fast).name, "fast");
    let slow = system.find_node("slow.guest").unwrap();
    let none = HashSet::new();

    assert_eq!(
        request_bound(&system, fast, slow, 1_000_000, Boundary::Strict, &none).unwrap(),
        100_000
    );
    assert_eq!(
        request_bound(&system, fast, slow, 1_000_000, Boundary::Inclusive, &none).unwrap(),
        100_001
    );
}

#[test]
fn long_release_chains_keep_the_system_schedulable() {
    let (mut system, _) = long_chain();
    assign_deadline_monotonic_priorities(&mut system).unwrap();

    assert!(is_modal_system_schedulable(&mut system).unwrap());
    let slow = system.find_node("slow.guest").unwrap();
    assert_eq!(system.node(slow).response_time, 888_890);
}
